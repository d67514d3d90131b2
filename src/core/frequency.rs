//! Repetition units shared by every recurring transaction, invoice and bill.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unit of repetition for a recurring schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    /// Every `interval` days
    Daily,
    /// Every `interval` weeks
    Weekly,
    /// Every `interval` calendar months
    Monthly,
    /// Every `interval` quarters (three calendar months each)
    Quarterly,
    /// Every `interval` calendar years
    Yearly,
}

impl Frequency {
    /// All frequencies, shortest first.
    pub const ALL: [Self; 5] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Yearly,
    ];

    /// Canonical upper-case name used in storage and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        }
    }

    const fn plural_unit(self) -> &'static str {
        match self {
            Self::Daily => "days",
            Self::Weekly => "weeks",
            Self::Monthly => "months",
            Self::Quarterly => "quarters",
            Self::Yearly => "years",
        }
    }

    /// Human-readable label such as `"Monthly"` or `"Every 2 weeks"`.
    #[must_use]
    pub fn label(self, interval: u32) -> String {
        if interval == 1 {
            return match self {
                Self::Daily => "Daily",
                Self::Weekly => "Weekly",
                Self::Monthly => "Monthly",
                Self::Quarterly => "Quarterly",
                Self::Yearly => "Yearly",
            }
            .to_string();
        }

        format!("Every {interval} {}", self.plural_unit())
    }

    /// Converts one occurrence's amount, scaled by `interval`, into an average monthly value.
    ///
    /// Weekly and daily use the calendar-average month (365.25 / 12 days), so a weekly
    /// amount is multiplied by ~4.348 and a daily one by ~30.44. The result is an estimate
    /// for dashboards, not a ledger figure.
    #[must_use]
    pub fn monthly_value(self, amount: Decimal, interval: u32) -> Decimal {
        let scaled = amount * Decimal::from(interval);
        match self {
            Self::Daily => scaled * dec!(365.25) / dec!(12),
            Self::Weekly => scaled * dec!(365.25) / dec!(84),
            Self::Monthly => scaled,
            Self::Quarterly => scaled / dec!(3),
            Self::Yearly => scaled / dec!(12),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|freq| freq.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::validation(format!("Unknown frequency: {s:?}")))
    }
}
