//! Recurring schedule engine for the Avanee business management suite.
//!
//! Recurring transactions, invoices and bills all share one scheduling model: a frequency and
//! interval, a start date, an optional end date, and the date the next occurrence is due. This
//! crate computes due dates, advances and pauses schedules, normalizes them into monthly
//! values for dashboards, and stores them in `SQLite` through `SeaORM`.

#![deny(
    unsafe_code,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::match_same_arms,
    clippy::too_many_lines,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

/// Configuration management for database and engine settings
pub mod config;
/// Scheduling engine, store, processing pass and dashboard summary
pub mod core;
/// `SeaORM` entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;

#[cfg(test)]
pub mod test_utils;
