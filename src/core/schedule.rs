//! Recurring schedule engine.
//!
//! A [`RecurringSchedule`] is an immutable value: every operation returns a new schedule
//! instead of mutating in place, so the engine holds no shared state and can be called from
//! any number of tasks at once. Persisting the result, and making sure two callers do not
//! both advance the same stored row, is the store's job (see [`crate::core::recurring`]).
//! Calling [`RecurringSchedule::advance`] twice on the same input advances twice.

use super::{calendar::compute_next_due_date, frequency::Frequency};
use crate::errors::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;

const SECONDS_PER_DAY: i64 = 86_400;

/// Raw field values for a schedule read back from storage or built from an update.
///
/// Pass these through [`RecurringSchedule::from_parts`] to get a validated schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleParts {
    /// Unit of repetition
    pub frequency: Frequency,
    /// Number of units between occurrences
    pub interval: u32,
    /// First possible occurrence
    pub start_date: NaiveDate,
    /// Inclusive last date an occurrence may fall on
    pub end_date: Option<NaiveDate>,
    /// Date an occurrence was last materialized
    pub last_processed: Option<NaiveDate>,
    /// Date the next occurrence should fire
    pub next_due_date: NaiveDate,
    /// Whether the schedule currently generates occurrences
    pub is_active: bool,
    /// Monetary value of one occurrence
    pub amount: Decimal,
}

/// Display status of a schedule. Paused and exhausted share `is_active == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleStatus {
    /// Generating occurrences
    Active,
    /// Switched off by the user
    Paused,
    /// Ran past its end date
    Exhausted,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Exhausted => "exhausted",
        })
    }
}

/// Validated scheduling state shared by recurring transactions, invoices and bills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringSchedule {
    frequency: Frequency,
    interval: u32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    last_processed: Option<NaiveDate>,
    next_due_date: NaiveDate,
    is_active: bool,
    amount: Decimal,
}

impl RecurringSchedule {
    /// Creates an active schedule whose first occurrence is due on `start_date`.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if `interval` is zero or `end_date` precedes `start_date`.
    pub fn new(
        frequency: Frequency,
        interval: u32,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        amount: Decimal,
    ) -> Result<Self> {
        Self::from_parts(ScheduleParts {
            frequency,
            interval,
            start_date,
            end_date,
            last_processed: None,
            next_due_date: start_date,
            is_active: true,
            amount,
        })
    }

    /// Rebuilds a schedule from stored or edited values, checking every invariant.
    ///
    /// `last_processed` may equal `next_due_date`: that is how an exhausted schedule looks,
    /// since the final advance records the occurrence but keeps the date.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] when any invariant does not hold.
    pub fn from_parts(parts: ScheduleParts) -> Result<Self> {
        if parts.interval < 1 {
            return Err(Error::validation("Interval must be at least 1"));
        }

        if let Some(end) = parts.end_date {
            if end < parts.start_date {
                return Err(Error::validation(format!(
                    "End date {end} is before start date {}",
                    parts.start_date
                )));
            }
            if parts.next_due_date > end {
                return Err(Error::validation(format!(
                    "Next due date {} is after end date {end}",
                    parts.next_due_date
                )));
            }
        }

        if parts.next_due_date < parts.start_date {
            return Err(Error::validation(format!(
                "Next due date {} is before start date {}",
                parts.next_due_date, parts.start_date
            )));
        }

        if let Some(last) = parts
            .last_processed
            .filter(|last| *last > parts.next_due_date)
        {
            return Err(Error::validation(format!(
                "Last processed date {last} is after next due date {}",
                parts.next_due_date
            )));
        }

        // Only a finished schedule may sit on an occurrence it already generated
        if parts.is_active && parts.last_processed == Some(parts.next_due_date) {
            return Err(Error::validation(format!(
                "Active schedule already processed its due date {}",
                parts.next_due_date
            )));
        }

        Ok(Self {
            frequency: parts.frequency,
            interval: parts.interval,
            start_date: parts.start_date,
            end_date: parts.end_date,
            last_processed: parts.last_processed,
            next_due_date: parts.next_due_date,
            is_active: parts.is_active,
            amount: parts.amount,
        })
    }

    /// Unit of repetition
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Number of frequency units between occurrences
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// First possible occurrence
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Inclusive last date an occurrence may fall on
    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Date of the most recently processed occurrence
    #[must_use]
    pub const fn last_processed(&self) -> Option<NaiveDate> {
        self.last_processed
    }

    /// Date the next occurrence fires
    #[must_use]
    pub const fn next_due_date(&self) -> NaiveDate {
        self.next_due_date
    }

    /// Whether the schedule is generating occurrences
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Value of a single occurrence
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the schedule as plain parts, e.g. for writing back to storage.
    #[must_use]
    pub const fn to_parts(&self) -> ScheduleParts {
        ScheduleParts {
            frequency: self.frequency,
            interval: self.interval,
            start_date: self.start_date,
            end_date: self.end_date,
            last_processed: self.last_processed,
            next_due_date: self.next_due_date,
            is_active: self.is_active,
            amount: self.amount,
        }
    }

    /// Marks the current occurrence processed and moves to the next one.
    ///
    /// If the next step would land after `end_date` the schedule deactivates and keeps its
    /// current `next_due_date`. The caller materializes the occurrence at
    /// [`Self::next_due_date`] before calling this.
    ///
    /// # Errors
    /// Returns [`Error::PreconditionViolation`] if the schedule is not active.
    pub fn advance(&self) -> Result<Self> {
        if !self.is_active {
            return Err(Error::PreconditionViolation {
                message: "Cannot advance an inactive schedule".to_string(),
            });
        }

        let candidate = compute_next_due_date(self.next_due_date, self.frequency, self.interval);
        let mut next = self.clone();
        next.last_processed = Some(self.next_due_date);

        // A saturated step cannot move forward either
        if candidate <= self.next_due_date || self.end_date.is_some_and(|end| candidate > end) {
            next.is_active = false;
        } else {
            next.next_due_date = candidate;
        }

        Ok(next)
    }

    /// Whole days from `as_of` until the next occurrence; negative when overdue.
    #[must_use]
    pub fn days_until_due(&self, as_of: NaiveDate) -> i64 {
        (self.next_due_date - as_of).num_days()
    }

    /// Days until the next occurrence from a point in time, rounding partial days up.
    ///
    /// The occurrence is taken to fire at midnight on its due date.
    #[must_use]
    pub fn days_until_due_at(&self, now: NaiveDateTime) -> i64 {
        let seconds = (self.next_due_date.and_time(NaiveTime::MIN) - now).num_seconds();
        let whole = seconds.div_euclid(SECONDS_PER_DAY);
        if seconds.rem_euclid(SECONDS_PER_DAY) > 0 {
            whole + 1
        } else {
            whole
        }
    }

    /// Active and due within `window_days` of `as_of`, counting today but not overdue dates.
    #[must_use]
    pub fn is_due_soon(&self, as_of: NaiveDate, window_days: i64) -> bool {
        self.is_active && (0..=window_days).contains(&self.days_until_due(as_of))
    }

    /// Active with an occurrence on or before `as_of` still waiting to be processed.
    #[must_use]
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.is_active && self.next_due_date <= as_of
    }

    /// Active and past its due date.
    #[must_use]
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.is_active && self.next_due_date < as_of
    }

    /// Average monthly value of this schedule, zero while inactive.
    ///
    /// See [`Frequency::monthly_value`] for the conversion factors. This is an estimate for
    /// aggregate dashboards and is not suitable for ledger postings.
    #[must_use]
    pub fn monthly_equivalent(&self) -> Decimal {
        if !self.is_active {
            return Decimal::ZERO;
        }
        self.frequency.monthly_value(self.amount, self.interval)
    }

    /// Flips `is_active`. Pausing changes nothing else and resuming does not catch up a stale
    /// due date.
    ///
    /// A schedule whose current occurrence was already generated (it ran past its end date, or
    /// had its end date extended afterwards) resumes at the following step instead, so that
    /// occurrence is never generated twice.
    ///
    /// # Errors
    /// Returns [`Error::PreconditionViolation`] when resuming a schedule that has no step left
    /// before its end date.
    pub fn toggle_active(&self) -> Result<Self> {
        let mut next = self.clone();
        next.is_active = !self.is_active;

        if next.is_active && self.last_processed == Some(self.next_due_date) {
            let candidate =
                compute_next_due_date(self.next_due_date, self.frequency, self.interval);
            if candidate <= self.next_due_date || self.end_date.is_some_and(|end| candidate > end)
            {
                return Err(Error::PreconditionViolation {
                    message: format!(
                        "Cannot resume a schedule that ended on {}",
                        self.next_due_date
                    ),
                });
            }
            next.next_due_date = candidate;
        }

        Ok(next)
    }

    /// Paused versus exhausted, for labelling.
    ///
    /// An inactive schedule whose next step would fall after its end date and whose current
    /// occurrence has been processed is reported as exhausted.
    #[must_use]
    pub fn status(&self) -> ScheduleStatus {
        if self.is_active {
            return ScheduleStatus::Active;
        }

        let processed_current = self.last_processed == Some(self.next_due_date);
        let no_further_step = self.end_date.is_some_and(|end| {
            compute_next_due_date(self.next_due_date, self.frequency, self.interval) > end
        });

        if processed_current && no_further_step {
            ScheduleStatus::Exhausted
        } else {
            ScheduleStatus::Paused
        }
    }

    /// Human-readable frequency label, e.g. `"Every 2 weeks"`.
    #[must_use]
    pub fn frequency_label(&self) -> String {
        self.frequency.label(self.interval)
    }
}
