/// Database configuration and connection management
pub mod database;

/// Engine settings and schedule seeds loaded from config.toml
pub mod schedules;
