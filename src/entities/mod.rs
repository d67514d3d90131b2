//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod recurring_occurrence;
pub mod recurring_schedule;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use recurring_occurrence::{
    Column as OccurrenceColumn, Entity as Occurrence, Model as OccurrenceModel,
};
pub use recurring_schedule::{
    Column as ScheduleColumn, Entity as Schedule, Model as ScheduleModel,
};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
