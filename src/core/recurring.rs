//! Recurring schedule store - create, read, update, toggle and delete stored schedules.
//!
//! Every function is generic over `ConnectionTrait`, so callers can pass a plain connection or
//! an open transaction. Writes go through a row-version compare-and-set: a write built from a
//! stale read fails with [`Error::ConcurrentModification`] instead of silently applying twice.

use super::{Frequency, RecurringSchedule, ScheduleKind, ScheduleParts};
use crate::{
    config::schedules::Config,
    entities::{Schedule, recurring_schedule},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, SimpleExpr},
};
use tracing::{debug, info, instrument};

/// Input for creating a schedule.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    /// What the schedule generates
    pub kind: ScheduleKind,
    /// Display name
    pub name: String,
    /// Unit of repetition
    pub frequency: Frequency,
    /// Units between occurrences
    pub interval: u32,
    /// First occurrence
    pub start_date: NaiveDate,
    /// Optional inclusive last date
    pub end_date: Option<NaiveDate>,
    /// Value of one occurrence
    pub amount: Decimal,
    /// ISO currency code
    pub currency: String,
}

/// Edits to an existing schedule. `None` leaves a field unchanged.
///
/// Changing the frequency or interval keeps the current `next_due_date`; the new cadence
/// applies from the next advance.
#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdate {
    /// New display name
    pub name: Option<String>,
    /// New unit of repetition
    pub frequency: Option<Frequency>,
    /// New interval
    pub interval: Option<u32>,
    /// New end date; `Some(None)` removes it
    pub end_date: Option<Option<NaiveDate>>,
    /// New per-occurrence amount
    pub amount: Option<Decimal>,
    /// New currency code
    pub currency: Option<String>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Schedule name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() {
        return Err(Error::validation(format!(
            "Amount cannot be negative: {amount}"
        )));
    }
    Ok(amount)
}

fn validate_currency(currency: &str) -> Result<String> {
    let code = currency.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::validation(format!(
            "Currency must be a three-letter code: {currency:?}"
        )));
    }
    Ok(code.to_ascii_uppercase())
}

fn interval_to_column(interval: u32) -> Result<i32> {
    i32::try_from(interval)
        .map_err(|_| Error::validation(format!("Interval is too large: {interval}")))
}

/// Converts a stored row into a validated engine schedule.
///
/// # Errors
/// Returns [`Error::Validation`] if the row holds an unknown frequency or breaks an invariant.
pub fn to_engine_schedule(model: &recurring_schedule::Model) -> Result<RecurringSchedule> {
    let interval = u32::try_from(model.interval).map_err(|_| {
        Error::validation(format!(
            "Schedule {} has invalid interval {}",
            model.id, model.interval
        ))
    })?;

    RecurringSchedule::from_parts(ScheduleParts {
        frequency: model.frequency.parse()?,
        interval,
        start_date: model.start_date,
        end_date: model.end_date,
        last_processed: model.last_processed,
        next_due_date: model.next_due_date,
        is_active: model.is_active,
        amount: model.amount,
    })
}

/// Creates a schedule whose first occurrence is due on its start date.
#[instrument(skip(db))]
pub async fn create_schedule<C>(db: &C, new: NewSchedule) -> Result<recurring_schedule::Model>
where
    C: ConnectionTrait,
{
    let name = validate_name(&new.name)?;
    let amount = validate_amount(new.amount)?;
    let currency = validate_currency(&new.currency)?;
    let engine = RecurringSchedule::new(
        new.frequency,
        new.interval,
        new.start_date,
        new.end_date,
        amount,
    )?;

    let now = Utc::now();
    let schedule = recurring_schedule::ActiveModel {
        kind: Set(new.kind.to_string()),
        name: Set(name),
        frequency: Set(engine.frequency().to_string()),
        interval: Set(interval_to_column(engine.interval())?),
        start_date: Set(engine.start_date()),
        end_date: Set(engine.end_date()),
        last_processed: Set(engine.last_processed()),
        next_due_date: Set(engine.next_due_date()),
        is_active: Set(engine.is_active()),
        amount: Set(engine.amount()),
        currency: Set(currency),
        version: Set(0),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = schedule.insert(db).await?;
    info!(schedule_id = created.id, "Created recurring {}", created.kind);
    Ok(created)
}

/// Finds a non-deleted schedule by id.
pub async fn get_schedule_by_id<C>(db: &C, id: i64) -> Result<Option<recurring_schedule::Model>>
where
    C: ConnectionTrait,
{
    Schedule::find_by_id(id)
        .filter(recurring_schedule::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_schedule_by_id`] but a missing schedule is an error.
pub async fn require_schedule<C>(db: &C, id: i64) -> Result<recurring_schedule::Model>
where
    C: ConnectionTrait,
{
    get_schedule_by_id(db, id)
        .await?
        .ok_or(Error::ScheduleNotFound { id })
}

/// Finds a non-deleted schedule by its exact name.
pub async fn get_schedule_by_name<C>(
    db: &C,
    name: &str,
) -> Result<Option<recurring_schedule::Model>>
where
    C: ConnectionTrait,
{
    Schedule::find()
        .filter(recurring_schedule::Column::Name.eq(name.trim()))
        .filter(recurring_schedule::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All non-deleted schedules, soonest due first.
pub async fn get_all_schedules<C>(db: &C) -> Result<Vec<recurring_schedule::Model>>
where
    C: ConnectionTrait,
{
    Schedule::find()
        .filter(recurring_schedule::Column::IsDeleted.eq(false))
        .order_by_asc(recurring_schedule::Column::NextDueDate)
        .order_by_asc(recurring_schedule::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active, non-deleted schedules, soonest due first.
pub async fn get_active_schedules<C>(db: &C) -> Result<Vec<recurring_schedule::Model>>
where
    C: ConnectionTrait,
{
    Schedule::find()
        .filter(recurring_schedule::Column::IsDeleted.eq(false))
        .filter(recurring_schedule::Column::IsActive.eq(true))
        .order_by_asc(recurring_schedule::Column::NextDueDate)
        .order_by_asc(recurring_schedule::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Non-deleted schedules of one kind, soonest due first.
pub async fn get_schedules_by_kind<C>(
    db: &C,
    kind: ScheduleKind,
) -> Result<Vec<recurring_schedule::Model>>
where
    C: ConnectionTrait,
{
    Schedule::find()
        .filter(recurring_schedule::Column::IsDeleted.eq(false))
        .filter(recurring_schedule::Column::Kind.eq(kind.as_str()))
        .order_by_asc(recurring_schedule::Column::NextDueDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active, non-deleted schedules with an occurrence due on or before `as_of`.
pub async fn get_due_schedules<C>(
    db: &C,
    as_of: NaiveDate,
) -> Result<Vec<recurring_schedule::Model>>
where
    C: ConnectionTrait,
{
    Schedule::find()
        .filter(recurring_schedule::Column::IsDeleted.eq(false))
        .filter(recurring_schedule::Column::IsActive.eq(true))
        .filter(recurring_schedule::Column::NextDueDate.lte(as_of))
        .order_by_asc(recurring_schedule::Column::NextDueDate)
        .order_by_asc(recurring_schedule::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `changes` to the row only if its version still matches `model.version`.
async fn write_versioned<C>(
    db: &C,
    model: &recurring_schedule::Model,
    changes: Vec<(recurring_schedule::Column, SimpleExpr)>,
) -> Result<recurring_schedule::Model>
where
    C: ConnectionTrait,
{
    let mut update = Schedule::update_many()
        .col_expr(
            recurring_schedule::Column::Version,
            Expr::col(recurring_schedule::Column::Version).add(1),
        )
        .col_expr(recurring_schedule::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(recurring_schedule::Column::Id.eq(model.id))
        .filter(recurring_schedule::Column::Version.eq(model.version));

    for (column, value) in changes {
        update = update.col_expr(column, value);
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        debug!(
            schedule_id = model.id,
            version = model.version,
            "Versioned write lost the race"
        );
        return Err(Error::ConcurrentModification { id: model.id });
    }

    Schedule::find_by_id(model.id)
        .one(db)
        .await?
        .ok_or(Error::ScheduleNotFound { id: model.id })
}

/// Writes the engine-owned state (`next_due_date`, `last_processed`, `is_active`) back to
/// the row `model` was read from.
///
/// # Errors
/// Returns [`Error::ConcurrentModification`] if the row changed since `model` was read.
pub async fn save_schedule_state<C>(
    db: &C,
    model: &recurring_schedule::Model,
    schedule: &RecurringSchedule,
) -> Result<recurring_schedule::Model>
where
    C: ConnectionTrait,
{
    write_versioned(
        db,
        model,
        vec![
            (
                recurring_schedule::Column::NextDueDate,
                Expr::value(schedule.next_due_date()),
            ),
            (
                recurring_schedule::Column::LastProcessed,
                Expr::value(schedule.last_processed()),
            ),
            (
                recurring_schedule::Column::IsActive,
                Expr::value(schedule.is_active()),
            ),
        ],
    )
    .await
}

/// Pauses an active schedule or resumes a paused one.
///
/// # Errors
/// Returns [`Error::PreconditionViolation`] when resuming a schedule that ran past its end
/// date.
#[instrument(skip(db))]
pub async fn toggle_schedule<C>(db: &C, id: i64) -> Result<recurring_schedule::Model>
where
    C: ConnectionTrait,
{
    let model = require_schedule(db, id).await?;
    let toggled = to_engine_schedule(&model)?.toggle_active()?;
    let saved = save_schedule_state(db, &model, &toggled).await?;
    info!(
        schedule_id = id,
        is_active = saved.is_active,
        "Toggled recurring schedule"
    );
    Ok(saved)
}

/// Edits a schedule's terms, re-validating the result before anything is written.
#[instrument(skip(db))]
pub async fn update_schedule<C>(
    db: &C,
    id: i64,
    update: ScheduleUpdate,
) -> Result<recurring_schedule::Model>
where
    C: ConnectionTrait,
{
    let model = require_schedule(db, id).await?;
    let current = to_engine_schedule(&model)?;

    let name = update
        .name
        .as_deref()
        .map(validate_name)
        .transpose()?
        .unwrap_or_else(|| model.name.clone());
    let currency = update
        .currency
        .as_deref()
        .map(validate_currency)
        .transpose()?
        .unwrap_or_else(|| model.currency.clone());
    let amount = validate_amount(update.amount.unwrap_or(current.amount()))?;

    let edited = RecurringSchedule::from_parts(ScheduleParts {
        frequency: update.frequency.unwrap_or(current.frequency()),
        interval: update.interval.unwrap_or(current.interval()),
        end_date: update.end_date.unwrap_or(current.end_date()),
        amount,
        ..current.to_parts()
    })?;

    write_versioned(
        db,
        &model,
        vec![
            (recurring_schedule::Column::Name, Expr::value(name)),
            (
                recurring_schedule::Column::Frequency,
                Expr::value(edited.frequency().to_string()),
            ),
            (
                recurring_schedule::Column::Interval,
                Expr::value(interval_to_column(edited.interval())?),
            ),
            (
                recurring_schedule::Column::EndDate,
                Expr::value(edited.end_date()),
            ),
            (recurring_schedule::Column::Amount, Expr::value(edited.amount())),
            (recurring_schedule::Column::Currency, Expr::value(currency)),
        ],
    )
    .await
}

/// Soft-deletes a schedule. Its occurrences are kept.
#[instrument(skip(db))]
pub async fn delete_schedule<C>(db: &C, id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let model = require_schedule(db, id).await?;
    write_versioned(
        db,
        &model,
        vec![(recurring_schedule::Column::IsDeleted, Expr::value(true))],
    )
    .await?;
    info!(schedule_id = id, "Deleted recurring schedule");
    Ok(())
}

/// Creates any `[[schedules]]` from the configuration that do not exist yet (matched by name).
///
/// Returns how many schedules were created.
pub async fn seed_schedules<C>(db: &C, config: &Config) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut created = 0;
    for seed in &config.schedules {
        if get_schedule_by_name(db, &seed.name).await?.is_some() {
            debug!("Schedule {:?} already exists, skipping seed", seed.name);
            continue;
        }

        create_schedule(
            db,
            NewSchedule {
                kind: seed.kind,
                name: seed.name.clone(),
                frequency: seed.frequency,
                interval: seed.interval,
                start_date: seed.start_date,
                end_date: seed.end_date,
                amount: seed.amount,
                currency: seed.currency.clone(),
            },
        )
        .await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {created} recurring schedules from configuration");
    }
    Ok(created)
}
