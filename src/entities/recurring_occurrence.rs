//! Recurring occurrence entity - A transaction, invoice or bill generated by a schedule.
//!
//! Each row copies the schedule's `kind`, amount and currency at the time it fired so later
//! edits to the schedule do not rewrite history.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Materialized occurrence database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_occurrences")]
pub struct Model {
    /// Unique identifier for the occurrence
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the schedule that generated this occurrence
    pub schedule_id: i64,
    /// `"transaction"`, `"invoice"` or `"bill"`
    pub kind: String,
    /// Description copied from the schedule name
    pub description: String,
    /// Due date the occurrence was generated for
    pub due_date: Date,
    /// Amount of the occurrence
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// ISO currency code
    pub currency: String,
    /// When the occurrence was materialized
    pub created_at: DateTimeUtc,
}

/// Defines relationships between occurrences and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each occurrence belongs to one schedule
    #[sea_orm(
        belongs_to = "super::recurring_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::recurring_schedule::Column::Id"
    )]
    Schedule,
}

impl Related<super::recurring_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
