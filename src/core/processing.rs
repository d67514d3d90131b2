//! Processing pass for due recurring schedules.
//!
//! For every active schedule with an occurrence due on or before the run date, the pass
//! materializes the occurrence and then advances the schedule, repeating until the schedule is
//! no longer due or the per-run catch-up limit is reached. Everything happens inside one
//! database transaction, and the run date is recorded in the `system_state` table.

use super::{ScheduleStatus, occurrence, recurring};
use crate::{
    entities::{SystemState, recurring_schedule, system_state},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

const LAST_PROCESSING_RUN_KEY: &str = "last_processing_run";

/// Outcome of processing a single schedule.
#[derive(Debug, Clone)]
pub struct ScheduleRunResult {
    /// ID of the schedule
    pub schedule_id: i64,
    /// Name of the schedule
    pub name: String,
    /// Kind of record generated
    pub kind: String,
    /// Due dates of the occurrences generated in this run
    pub occurrence_dates: Vec<NaiveDate>,
    /// Sum of the generated occurrences
    pub total_amount: Decimal,
    /// Currency of `total_amount`
    pub currency: String,
    /// Next due date after the run
    pub next_due_date: NaiveDate,
    /// Whether the schedule ran past its end date during this run
    pub exhausted: bool,
    /// Whether occurrences are still due after hitting the catch-up limit
    pub still_due: bool,
}

/// Outcome of processing every due schedule.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// One entry per schedule that had something due
    pub schedules: Vec<ScheduleRunResult>,
    /// Total occurrences created
    pub occurrences_created: usize,
    /// Schedules that deactivated because they reached their end date
    pub exhausted_count: usize,
    /// Date the pass ran for
    pub run_date: NaiveDate,
}

/// Retrieves the date of the last processing run from the `system_state` table.
pub async fn get_last_processing_date<C>(db: &C) -> Result<Option<NaiveDate>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_PROCESSING_RUN_KEY))
        .one(db)
        .await?;

    state
        .map(|s| {
            NaiveDate::parse_from_str(&s.value, "%Y-%m-%d").map_err(|e| Error::Config {
                message: format!("Failed to parse last processing date: {e}"),
            })
        })
        .transpose()
}

/// Returns true if no run has been recorded for `today` yet.
pub async fn is_processing_needed<C>(db: &C, today: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(get_last_processing_date(db)
        .await?
        .is_none_or(|last| last < today))
}

async fn set_last_processing_date<C>(db: &C, date: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    let date_str = date.format("%Y-%m-%d").to_string();
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_PROCESSING_RUN_KEY))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(date_str);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(LAST_PROCESSING_RUN_KEY.to_string()),
            value: Set(date_str),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Generates the occurrences one schedule owes as of `as_of`, at most `max_steps` of them.
///
/// Each occurrence is written before the schedule advances past it.
pub async fn process_schedule<C>(
    db: &C,
    mut model: recurring_schedule::Model,
    as_of: NaiveDate,
    max_steps: u32,
) -> Result<ScheduleRunResult>
where
    C: ConnectionTrait,
{
    let mut engine = recurring::to_engine_schedule(&model)?;
    let mut occurrence_dates = Vec::new();
    let mut total_amount = Decimal::ZERO;
    let mut steps = 0;

    while steps < max_steps && engine.is_due(as_of) {
        let created = occurrence::materialize_occurrence(db, &model).await?;
        engine = engine.advance()?;
        model = recurring::save_schedule_state(db, &model, &engine).await?;

        occurrence_dates.push(created.due_date);
        total_amount += created.amount;
        steps += 1;
    }

    let still_due = engine.is_due(as_of);
    if still_due {
        warn!(
            schedule_id = model.id,
            next_due = %engine.next_due_date(),
            "Catch-up limit of {max_steps} reached, occurrences remain due"
        );
    }

    Ok(ScheduleRunResult {
        schedule_id: model.id,
        name: model.name,
        kind: model.kind,
        occurrence_dates,
        total_amount,
        currency: model.currency,
        next_due_date: engine.next_due_date(),
        exhausted: engine.status() == ScheduleStatus::Exhausted,
        still_due,
    })
}

/// Processes every due schedule as of `as_of`. This function:
///
/// 1. Loads all active, non-deleted schedules due on or before `as_of`
/// 2. For each one, materializes and advances up to `max_steps` occurrences
/// 3. Records the run date in `system_state`
///
/// All writes succeed or fail together.
///
/// # Errors
/// Returns [`Error::Validation`] if `max_steps` is zero, or any store error; on error nothing
/// is committed.
#[instrument(skip(db))]
pub async fn process_due_schedules(
    db: &DatabaseConnection,
    as_of: NaiveDate,
    max_steps: u32,
) -> Result<ProcessingResult> {
    if max_steps == 0 {
        return Err(Error::validation("max_steps must be at least 1"));
    }

    let txn = db.begin().await?;

    let due = recurring::get_due_schedules(&txn, as_of).await?;
    let mut schedules = Vec::with_capacity(due.len());
    for model in due {
        schedules.push(process_schedule(&txn, model, as_of, max_steps).await?);
    }

    set_last_processing_date(&txn, as_of).await?;
    txn.commit().await?;

    let occurrences_created: usize = schedules.iter().map(|s| s.occurrence_dates.len()).sum();
    let exhausted_count = schedules.iter().filter(|s| s.exhausted).count();
    info!(
        schedules = schedules.len(),
        occurrences_created, exhausted_count, "Processed recurring schedules for {as_of}"
    );

    Ok(ProcessingResult {
        schedules,
        occurrences_created,
        exhausted_count,
        run_date: as_of,
    })
}

/// Formats a processing result into a human-readable summary string.
#[must_use]
pub fn format_processing_summary(result: &ProcessingResult) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Recurring processing - {} - {} occurrences from {} schedules\n",
        result.run_date.format("%Y-%m-%d"),
        result.occurrences_created,
        result.schedules.len()
    );

    for run in &result.schedules {
        let dates = run
            .occurrence_dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let outcome = if run.exhausted {
            "ended".to_string()
        } else {
            format!("next {}", run.next_due_date.format("%Y-%m-%d"))
        };

        // Writing to a String cannot fail
        let _ = writeln!(
            summary,
            "  {} ({}) | {} | {:.2} {} | {}{}",
            run.name,
            run.kind,
            dates,
            run.total_amount,
            run.currency,
            outcome,
            if run.still_due { " (still due)" } else { "" }
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{Frequency, ScheduleKind, occurrence::get_occurrences_for_schedule};
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_get_last_processing_date_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_last_processing_date(&db).await?.is_none());
        assert!(is_processing_needed(&db, date(2024, 1, 1)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_last_processing_date_updates_existing() -> Result<()> {
        let db = setup_test_db().await?;

        set_last_processing_date(&db, date(2024, 1, 1)).await?;
        set_last_processing_date(&db, date(2024, 2, 1)).await?;

        assert_eq!(get_last_processing_date(&db).await?, Some(date(2024, 2, 1)));
        assert!(!is_processing_needed(&db, date(2024, 2, 1)).await?);
        assert!(is_processing_needed(&db, date(2024, 2, 2)).await?);

        let count = SystemState::find()
            .filter(system_state::Column::Key.eq(LAST_PROCESSING_RUN_KEY))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_process_single_due_occurrence() -> Result<()> {
        let db = setup_test_db().await?;
        let schedule = create_custom_schedule(
            &db,
            "Payroll",
            ScheduleKind::Transaction,
            Frequency::Weekly,
            2,
            date(2024, 1, 1),
            None,
            dec!(50),
        )
        .await?;

        let result = process_due_schedules(&db, date(2024, 1, 1), 12).await?;
        assert_eq!(result.occurrences_created, 1);
        assert_eq!(result.schedules.len(), 1);

        let run = &result.schedules[0];
        assert_eq!(run.occurrence_dates, vec![date(2024, 1, 1)]);
        assert_eq!(run.next_due_date, date(2024, 1, 15));
        assert_eq!(run.total_amount, dec!(50));
        assert!(!run.exhausted);
        assert!(!run.still_due);

        let stored = crate::core::recurring::require_schedule(&db, schedule.id).await?;
        assert_eq!(stored.next_due_date, date(2024, 1, 15));
        assert_eq!(stored.last_processed, Some(date(2024, 1, 1)));

        let occurrences = get_occurrences_for_schedule(&db, schedule.id).await?;
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].due_date, date(2024, 1, 1));

        assert_eq!(get_last_processing_date(&db).await?, Some(date(2024, 1, 1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_schedules_not_yet_due_are_untouched() -> Result<()> {
        let (db, schedule) = setup_with_schedule().await?;

        let result = process_due_schedules(&db, date(2024, 1, 14), 12).await?;
        assert_eq!(result.occurrences_created, 0);
        assert!(result.schedules.is_empty());

        let stored = crate::core::recurring::require_schedule(&db, schedule.id).await?;
        assert_eq!(stored, schedule);
        Ok(())
    }

    #[tokio::test]
    async fn test_paused_schedules_are_skipped() -> Result<()> {
        let (db, schedule) = setup_with_schedule().await?;
        crate::core::recurring::toggle_schedule(&db, schedule.id).await?;

        let result = process_due_schedules(&db, date(2024, 6, 1), 12).await?;
        assert_eq!(result.occurrences_created, 0);
        assert!(get_occurrences_for_schedule(&db, schedule.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_catch_up_generates_every_missed_occurrence() -> Result<()> {
        let (db, schedule) = setup_with_schedule().await?;

        let result = process_due_schedules(&db, date(2024, 4, 20), 12).await?;
        let run = &result.schedules[0];
        assert_eq!(
            run.occurrence_dates,
            vec![
                date(2024, 1, 15),
                date(2024, 2, 15),
                date(2024, 3, 15),
                date(2024, 4, 15)
            ]
        );
        assert_eq!(run.total_amount, dec!(400));
        assert_eq!(run.next_due_date, date(2024, 5, 15));

        let stored = crate::core::recurring::require_schedule(&db, schedule.id).await?;
        assert_eq!(stored.version, schedule.version + 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_catch_up_limit_leaves_schedule_due() -> Result<()> {
        let (db, schedule) = setup_with_schedule().await?;

        let first = process_due_schedules(&db, date(2024, 4, 20), 2).await?;
        assert_eq!(first.occurrences_created, 2);
        assert!(first.schedules[0].still_due);
        assert_eq!(first.schedules[0].next_due_date, date(2024, 3, 15));

        let second = process_due_schedules(&db, date(2024, 4, 20), 2).await?;
        assert_eq!(
            second.schedules[0].occurrence_dates,
            vec![date(2024, 3, 15), date(2024, 4, 15)]
        );
        assert!(!second.schedules[0].still_due);

        assert_eq!(get_occurrences_for_schedule(&db, schedule.id).await?.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_exhausts_at_end_date() -> Result<()> {
        let db = setup_test_db().await?;
        let schedule = create_custom_schedule(
            &db,
            "Short lease",
            ScheduleKind::Bill,
            Frequency::Monthly,
            1,
            date(2024, 1, 31),
            Some(date(2024, 3, 15)),
            dec!(75),
        )
        .await?;

        let result = process_due_schedules(&db, date(2024, 12, 31), 12).await?;
        assert_eq!(result.exhausted_count, 1);
        let run = &result.schedules[0];
        assert_eq!(run.occurrence_dates, vec![date(2024, 1, 31), date(2024, 2, 29)]);
        assert!(run.exhausted);

        let stored = crate::core::recurring::require_schedule(&db, schedule.id).await?;
        assert!(!stored.is_active);
        assert_eq!(stored.next_due_date, date(2024, 2, 29));

        // Exhausted schedules are never picked up again
        let again = process_due_schedules(&db, date(2025, 1, 31), 12).await?;
        assert!(again.schedules.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_schedule_is_not_billed_twice_after_toggle() -> Result<()> {
        let db = setup_test_db().await?;
        let schedule = create_custom_schedule(
            &db,
            "Short lease",
            ScheduleKind::Bill,
            Frequency::Monthly,
            1,
            date(2024, 1, 31),
            Some(date(2024, 3, 15)),
            dec!(75),
        )
        .await?;

        process_due_schedules(&db, date(2024, 12, 31), 12).await?;
        let toggle = crate::core::recurring::toggle_schedule(&db, schedule.id).await;
        assert!(matches!(
            toggle.unwrap_err(),
            Error::PreconditionViolation { .. }
        ));

        let again = process_due_schedules(&db, date(2024, 12, 31), 12).await?;
        assert_eq!(again.occurrences_created, 0);

        let dates: Vec<NaiveDate> = get_occurrences_for_schedule(&db, schedule.id)
            .await?
            .iter()
            .map(|o| o.due_date)
            .collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_resumed_schedule_continues_after_last_occurrence() -> Result<()> {
        let db = setup_test_db().await?;
        let schedule = create_custom_schedule(
            &db,
            "Short lease",
            ScheduleKind::Bill,
            Frequency::Monthly,
            1,
            date(2024, 1, 31),
            Some(date(2024, 3, 15)),
            dec!(75),
        )
        .await?;
        process_due_schedules(&db, date(2024, 12, 31), 12).await?;

        crate::core::recurring::update_schedule(
            &db,
            schedule.id,
            crate::core::recurring::ScheduleUpdate {
                end_date: Some(Some(date(2024, 4, 15))),
                ..Default::default()
            },
        )
        .await?;
        crate::core::recurring::toggle_schedule(&db, schedule.id).await?;

        let again = process_due_schedules(&db, date(2024, 12, 31), 12).await?;
        assert_eq!(again.schedules[0].occurrence_dates, vec![date(2024, 3, 29)]);
        assert!(again.schedules[0].exhausted);

        assert_eq!(get_occurrences_for_schedule(&db, schedule.id).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_steps_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = process_due_schedules(&db, date(2024, 1, 1), 0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[test]
    fn test_format_processing_summary() {
        let result = ProcessingResult {
            schedules: vec![
                ScheduleRunResult {
                    schedule_id: 1,
                    name: "Office rent".to_string(),
                    kind: "bill".to_string(),
                    occurrence_dates: vec![date(2024, 3, 1)],
                    total_amount: dec!(2500),
                    currency: "USD".to_string(),
                    next_due_date: date(2024, 4, 1),
                    exhausted: false,
                    still_due: false,
                },
                ScheduleRunResult {
                    schedule_id: 2,
                    name: "Short lease".to_string(),
                    kind: "bill".to_string(),
                    occurrence_dates: vec![date(2024, 2, 29)],
                    total_amount: dec!(75),
                    currency: "EUR".to_string(),
                    next_due_date: date(2024, 2, 29),
                    exhausted: true,
                    still_due: false,
                },
            ],
            occurrences_created: 2,
            exhausted_count: 1,
            run_date: date(2024, 3, 1),
        };

        let summary = format_processing_summary(&result);
        assert!(summary.contains("2024-03-01 - 2 occurrences from 2 schedules"));
        assert!(summary.contains("Office rent (bill) | 2024-03-01 | 2500.00 USD | next 2024-04-01"));
        assert!(summary.contains("Short lease (bill) | 2024-02-29 | 75.00 EUR | ended"));
    }
}
