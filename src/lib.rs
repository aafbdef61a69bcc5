//! Accomplishment journal with month/year timeframes and cached AI insights.
//!
//! Entries are short accomplishments with a 1–10 impact rating. They are
//! grouped into month or year buckets, navigated newest-first, and summarized
//! by a text-generation backend whose output is cached per timeframe and
//! flagged stale once the bucket's entries change.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`error`]: The [`error::JournalError`] taxonomy
//! - [`generation`]: Text-generation backends and the insight prompt
//! - [`journal`]: Bucketing, navigation, insight cache, orchestration, and storage

pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod journal;
