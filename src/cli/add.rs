//! CLI `add` command: log one accomplishment.

use accomplish::config::AccomplishConfig;
use accomplish::error::JournalError;
use accomplish::journal::timekey::{bucket_key, bucket_label};
use accomplish::journal::types::{Granularity, NewEntry};
use anyhow::Result;
use chrono::DateTime;

pub async fn add(config: &AccomplishConfig, text: &str, rating: i64, at: Option<&str>) -> Result<()> {
    let timestamp = at
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| JournalError::Validation(format!("invalid timestamp {raw:?}: {e}")))
        })
        .transpose()?;
    let entry = NewEntry::new(text, rating, timestamp)?;

    let mut session = super::open_session(config, Granularity::Month).await?;
    let saved = session.add_entry(entry).await?;

    let month = bucket_key(&saved.timestamp, Granularity::Month);
    session.select(&month).await?;
    println!("Logged [{}/10] {}", saved.rating, saved.text);
    println!("  id:    {}", saved.id);
    println!("  month: {}", bucket_label(&month, Granularity::Month));
    if session.insight().is_some() && session.is_stale() {
        println!("  The insight for this month is out of date. Run `accomplish insight --regenerate`.");
    }
    Ok(())
}
