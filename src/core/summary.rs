//! Dashboard summary of all recurring schedules.
//!
//! Produces the figures the dashboards show: how many schedules are active, paused or
//! finished, the monthly recurring value, and which occurrences fall due soon. Monthly values
//! are estimates (see [`RecurringSchedule::monthly_equivalent`]) and are kept per currency.

use super::{RecurringSchedule, ScheduleKind, ScheduleStatus, recurring};
use crate::{entities::recurring_schedule, errors::Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use std::collections::BTreeMap;

/// A schedule whose next occurrence falls inside the due-soon window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSoonItem {
    /// ID of the schedule
    pub schedule_id: i64,
    /// Name of the schedule
    pub name: String,
    /// What the schedule generates
    pub kind: ScheduleKind,
    /// Date the occurrence fires
    pub next_due_date: NaiveDate,
    /// Days from the summary date (0 = today)
    pub days_until_due: i64,
    /// Amount of the occurrence
    pub amount: Decimal,
    /// Currency of `amount`
    pub currency: String,
    /// Label such as "Every 2 weeks"
    pub frequency_label: String,
}

/// Portfolio-level view of recurring schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringSummary {
    /// Date the summary was computed for
    pub as_of: NaiveDate,
    /// Window used for `due_soon`
    pub window_days: i64,
    /// Schedules generating occurrences
    pub active_count: usize,
    /// Schedules switched off by the user
    pub paused_count: usize,
    /// Schedules that ran past their end date
    pub exhausted_count: usize,
    /// Active schedules whose due date has passed
    pub overdue_count: usize,
    /// Monthly recurring value of active schedules, per currency
    pub monthly_recurring_value: BTreeMap<String, Decimal>,
    /// Monthly recurring value split by kind and currency
    pub monthly_value_by_kind: BTreeMap<(ScheduleKind, String), Decimal>,
    /// Occurrences due within the window, soonest first
    pub due_soon: Vec<DueSoonItem>,
}

/// Sum of monthly equivalents. Inactive schedules contribute nothing.
#[must_use]
pub fn monthly_recurring_value<'a, I>(schedules: I) -> Decimal
where
    I: IntoIterator<Item = &'a RecurringSchedule>,
{
    schedules
        .into_iter()
        .map(RecurringSchedule::monthly_equivalent)
        .sum()
}

/// Builds the summary from stored rows.
///
/// # Errors
/// Returns a validation error if any row holds an unknown kind or frequency.
pub fn summarize(
    rows: &[recurring_schedule::Model],
    as_of: NaiveDate,
    window_days: i64,
) -> Result<RecurringSummary> {
    let mut summary = RecurringSummary {
        as_of,
        window_days,
        active_count: 0,
        paused_count: 0,
        exhausted_count: 0,
        overdue_count: 0,
        monthly_recurring_value: BTreeMap::new(),
        monthly_value_by_kind: BTreeMap::new(),
        due_soon: Vec::new(),
    };

    for row in rows {
        let schedule = recurring::to_engine_schedule(row)?;
        let kind: ScheduleKind = row.kind.parse()?;

        match schedule.status() {
            ScheduleStatus::Active => summary.active_count += 1,
            ScheduleStatus::Paused => summary.paused_count += 1,
            ScheduleStatus::Exhausted => summary.exhausted_count += 1,
        }

        if schedule.is_overdue(as_of) {
            summary.overdue_count += 1;
        }

        let monthly = schedule.monthly_equivalent();
        if schedule.is_active() {
            *summary
                .monthly_recurring_value
                .entry(row.currency.clone())
                .or_default() += monthly;
            *summary
                .monthly_value_by_kind
                .entry((kind, row.currency.clone()))
                .or_default() += monthly;
        }

        if schedule.is_due_soon(as_of, window_days) {
            summary.due_soon.push(DueSoonItem {
                schedule_id: row.id,
                name: row.name.clone(),
                kind,
                next_due_date: schedule.next_due_date(),
                days_until_due: schedule.days_until_due(as_of),
                amount: schedule.amount(),
                currency: row.currency.clone(),
                frequency_label: schedule.frequency_label(),
            });
        }
    }

    summary
        .due_soon
        .sort_by(|a, b| (a.next_due_date, &a.name).cmp(&(b.next_due_date, &b.name)));

    Ok(summary)
}

/// Loads every non-deleted schedule and summarizes it.
pub async fn generate_summary<C>(
    db: &C,
    as_of: NaiveDate,
    window_days: i64,
) -> Result<RecurringSummary>
where
    C: ConnectionTrait,
{
    let rows = recurring::get_all_schedules(db).await?;
    summarize(&rows, as_of, window_days)
}

/// Formats a summary for terminal output.
#[must_use]
pub fn format_summary(summary: &RecurringSummary) -> String {
    use std::fmt::Write;

    let mut out = format!(
        "Recurring schedules as of {} - {} active, {} paused, {} ended, {} overdue\n",
        summary.as_of.format("%Y-%m-%d"),
        summary.active_count,
        summary.paused_count,
        summary.exhausted_count,
        summary.overdue_count
    );

    // Writing to a String cannot fail
    if summary.monthly_recurring_value.is_empty() {
        let _ = writeln!(out, "  Monthly recurring value: none");
    }
    for (currency, value) in &summary.monthly_recurring_value {
        let _ = writeln!(out, "  Monthly recurring value (est.): {value:.2} {currency}");
    }
    for ((kind, currency), value) in &summary.monthly_value_by_kind {
        let _ = writeln!(out, "    {kind}: {value:.2} {currency}");
    }

    let _ = writeln!(
        out,
        "  Due in the next {} days: {}",
        summary.window_days,
        summary.due_soon.len()
    );
    for item in &summary.due_soon {
        let when = match item.days_until_due {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {n} days"),
        };
        let _ = writeln!(
            out,
            "    {} - {} ({}) {:.2} {} - {}",
            item.next_due_date.format("%Y-%m-%d"),
            item.name,
            item.frequency_label,
            item.amount,
            item.currency,
            when
        );
    }

    out
}
