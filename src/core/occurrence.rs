//! Occurrence materialization.
//!
//! When a schedule fires, the processing pass writes the concrete transaction, invoice or bill
//! here before advancing the schedule.

use crate::{
    entities::{Occurrence, recurring_occurrence, recurring_schedule},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Records the occurrence `schedule` owes on its current `next_due_date`.
pub async fn materialize_occurrence<C>(
    db: &C,
    schedule: &recurring_schedule::Model,
) -> Result<recurring_occurrence::Model>
where
    C: ConnectionTrait,
{
    debug!(
        schedule_id = schedule.id,
        due_date = %schedule.next_due_date,
        "Materializing {} occurrence",
        schedule.kind
    );

    let occurrence = recurring_occurrence::ActiveModel {
        schedule_id: Set(schedule.id),
        kind: Set(schedule.kind.clone()),
        description: Set(schedule.name.clone()),
        due_date: Set(schedule.next_due_date),
        amount: Set(schedule.amount),
        currency: Set(schedule.currency.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    occurrence.insert(db).await.map_err(Into::into)
}

/// All occurrences generated by a schedule, oldest first.
pub async fn get_occurrences_for_schedule<C>(
    db: &C,
    schedule_id: i64,
) -> Result<Vec<recurring_occurrence::Model>>
where
    C: ConnectionTrait,
{
    Occurrence::find()
        .filter(recurring_occurrence::Column::ScheduleId.eq(schedule_id))
        .order_by_asc(recurring_occurrence::Column::DueDate)
        .all(db)
        .await
        .map_err(Into::into)
}
