//! Recurring schedule entity - One row per recurring transaction, invoice or bill.
//!
//! `frequency` and `kind` are stored as their canonical strings and parsed back into
//! [`crate::core::Frequency`] / [`crate::core::ScheduleKind`] by the store. `version` is bumped
//! on every write so concurrent updates can be detected.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring schedule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_schedules")]
pub struct Model {
    /// Unique identifier for the schedule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What the schedule generates: `"transaction"`, `"invoice"` or `"bill"`
    pub kind: String,
    /// Human-readable name (e.g., "Office rent")
    pub name: String,
    /// `"DAILY"`, `"WEEKLY"`, `"MONTHLY"`, `"QUARTERLY"` or `"YEARLY"`
    pub frequency: String,
    /// Number of frequency units between occurrences
    #[sea_orm(column_name = "repeat_interval")]
    pub interval: i32,
    /// First possible occurrence
    pub start_date: Date,
    /// Inclusive last date, None for open-ended schedules
    pub end_date: Option<Date>,
    /// Date of the last materialized occurrence
    pub last_processed: Option<Date>,
    /// Date the next occurrence fires
    pub next_due_date: Date,
    /// Whether the schedule currently generates occurrences
    pub is_active: bool,
    /// Value of one occurrence
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// ISO currency code of `amount`
    pub currency: String,
    /// Row version for optimistic concurrency
    pub version: i32,
    /// Soft delete flag - if true, schedule is hidden but occurrences are preserved
    pub is_deleted: bool,
    /// When the schedule was created
    pub created_at: DateTimeUtc,
    /// When the schedule was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `RecurringSchedule` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One schedule has many materialized occurrences
    #[sea_orm(has_many = "super::recurring_occurrence::Entity")]
    Occurrences,
}

impl Related<super::recurring_occurrence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Occurrences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
