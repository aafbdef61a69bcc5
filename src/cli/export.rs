use accomplish::config::AccomplishConfig;
use accomplish::journal::store::JournalStore;
use accomplish::journal::types::{Entry, Insight};
use anyhow::Result;
use serde::Serialize;

/// Export format: the owner's entries and cached insights.
#[derive(Debug, Serialize)]
struct ExportData {
    owner: String,
    accomplishments: Vec<Entry>,
    insights: Vec<Insight>,
}

/// Export the configured owner's journal as JSON to stdout.
pub async fn export(config: &AccomplishConfig) -> Result<()> {
    let store = super::open_store(config)?;
    let owner = config.storage.owner.clone();

    let data = ExportData {
        accomplishments: store.list_entries(&owner).await?,
        insights: store.list_insights(&owner).await?,
        owner,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!(
        "Exported {} accomplishments and {} insights.",
        data.accomplishments.len(),
        data.insights.len()
    );

    Ok(())
}
