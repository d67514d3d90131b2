//! Database configuration module.
//!
//! Handles `SQLite` connection setup and table creation using `SeaORM`. Tables are generated
//! from the entity definitions with `Schema::create_table_from_entity`, so the database schema
//! always matches the Rust models without hand-written SQL.

use crate::entities::{Occurrence, Schedule, SystemState};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/recurring.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or the default
/// local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory a file-backed `SQLite` URL points into, if any.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For file-backed `SQLite` URLs the parent directory is created first, since `SQLite`
/// only creates the file itself.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }

    tracing::debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table_for<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates every table the service needs if it does not exist yet.
///
/// Schedules are created before occurrences because occurrences reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, Schedule).await?;
    create_table_for(db, &schema, Occurrence).await?;
    create_table_for(db, &schema, SystemState).await?;

    Ok(())
}
