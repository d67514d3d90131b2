//! Core business logic.
//!
//! The pure scheduling engine lives in [`calendar`], [`frequency`] and [`schedule`]; the
//! remaining modules store schedules, materialize their occurrences and report on them.

/// Calendar stepping with month-end clamping
pub mod calendar;
/// Repetition units and monthly conversion factors
pub mod frequency;
/// Transaction / invoice / bill payload types
pub mod kind;
/// Materializing fired occurrences
pub mod occurrence;
/// Processing pass over due schedules
pub mod processing;
/// Stored schedule operations
pub mod recurring;
/// The schedule value type and its lifecycle operations
pub mod schedule;
/// Dashboard figures
pub mod summary;

pub use calendar::compute_next_due_date;
pub use frequency::Frequency;
pub use kind::ScheduleKind;
pub use schedule::{RecurringSchedule, ScheduleParts, ScheduleStatus};
