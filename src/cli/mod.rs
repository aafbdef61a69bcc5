pub mod add;
pub mod doctor;
pub mod export;
pub mod insight;
pub mod show;
pub mod timeframes;

use std::sync::Arc;

use accomplish::config::AccomplishConfig;
use accomplish::generation::{create_generator, TextGenerator};
use accomplish::journal::session::JournalSession;
use accomplish::journal::store::SqliteStore;
use accomplish::journal::timekey::parse_bucket_key;
use accomplish::journal::types::{Granularity, Insight};
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local};

/// Open the database and load the configured owner's journal.
pub async fn open_session(
    config: &AccomplishConfig,
    granularity: Granularity,
) -> Result<JournalSession> {
    let store = open_store(config)?;
    let generator: Arc<dyn TextGenerator> = Arc::from(create_generator(&config.generation)?);
    let session = JournalSession::load(
        Arc::new(store),
        generator,
        config.storage.owner.clone(),
        granularity,
        config.generation.max_entries,
    )
    .await?;
    Ok(session)
}

pub fn open_store(config: &AccomplishConfig) -> Result<SqliteStore> {
    let conn = accomplish::db::open_database(config.resolved_db_path())?;
    Ok(SqliteStore::new(conn))
}

/// Open a session positioned on `key`, or on the newest bucket.
pub async fn open_at(
    config: &AccomplishConfig,
    granularity: Granularity,
    key: Option<&str>,
) -> Result<JournalSession> {
    let mut session = open_session(config, granularity).await?;
    if let Some(raw) = key {
        let key = parse_bucket_key(raw, granularity)?;
        session.select(&key).await?;
    }
    Ok(session)
}

/// "Generated 3 hr ago · Based on 4 entries"
pub fn insight_footer(insight: &Insight) -> String {
    format!(
        "Generated {} · Based on {} {}",
        format_relative_time(insight.generated_at, Local::now().fixed_offset()),
        insight.accomplishment_count,
        plural(insight.accomplishment_count, "entry", "entries"),
    )
}

pub fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

pub fn format_relative_time(then: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> String {
    let diff = now.signed_duration_since(then);
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "just now".into()
    } else if mins < 60 {
        format!("{mins} min ago")
    } else if hours < 24 {
        format!("{hours} hr ago")
    } else if days < 7 {
        format!("{days} {} ago", if days > 1 { "days" } else { "day" })
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}
