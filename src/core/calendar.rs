//! Calendar arithmetic for stepping a schedule forward.

use super::frequency::Frequency;
use chrono::{Days, Months, NaiveDate};

/// Returns the date one `frequency × interval` step after `current`.
///
/// Month-based steps clamp the day to the last valid day of the target month, so
/// Jan 31 + 1 month is Feb 28 (or Feb 29 in a leap year) and Feb 29 + 1 year is Feb 28.
/// Steps that would run past the representable range saturate at [`NaiveDate::MAX`].
#[must_use]
pub fn compute_next_due_date(current: NaiveDate, frequency: Frequency, interval: u32) -> NaiveDate {
    let next = match frequency {
        Frequency::Daily => current.checked_add_days(Days::new(u64::from(interval))),
        Frequency::Weekly => current.checked_add_days(Days::new(u64::from(interval) * 7)),
        Frequency::Monthly => current.checked_add_months(Months::new(interval)),
        Frequency::Quarterly => {
            current.checked_add_months(Months::new(interval.saturating_mul(3)))
        }
        Frequency::Yearly => current.checked_add_months(Months::new(interval.saturating_mul(12))),
    };

    next.unwrap_or(NaiveDate::MAX)
}
