//! Shared test utilities.
//!
//! Helpers for setting up in-memory test databases and creating schedules
//! with sensible defaults.

use crate::{
    core::{Frequency, ScheduleKind, recurring},
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Shorthand for a calendar date in tests.
///
/// # Panics
/// Panics on an invalid date.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test schedule with sensible defaults.
///
/// # Defaults
/// * `kind`: transaction
/// * `frequency`: monthly, interval 1
/// * `start_date`: 2024-01-15, no end date
/// * `amount`: 100 USD
pub async fn create_test_schedule(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::recurring_schedule::Model> {
    create_custom_schedule(
        db,
        name,
        ScheduleKind::Transaction,
        Frequency::Monthly,
        1,
        date(2024, 1, 15),
        None,
        dec!(100),
    )
    .await
}

/// Creates a test schedule with custom parameters.
#[allow(clippy::too_many_arguments)]
pub async fn create_custom_schedule(
    db: &DatabaseConnection,
    name: &str,
    kind: ScheduleKind,
    frequency: Frequency,
    interval: u32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    amount: Decimal,
) -> Result<entities::recurring_schedule::Model> {
    recurring::create_schedule(
        db,
        recurring::NewSchedule {
            kind,
            name: name.to_string(),
            frequency,
            interval,
            start_date,
            end_date,
            amount,
            currency: "USD".to_string(),
        },
    )
    .await
}

/// Sets up a database holding one default schedule.
/// Returns (db, schedule) for common test scenarios.
pub async fn setup_with_schedule() -> Result<(DatabaseConnection, entities::recurring_schedule::Model)>
{
    let db = setup_test_db().await?;
    let schedule = create_test_schedule(&db, "Test Schedule").await?;
    Ok((db, schedule))
}
