use accomplish::config::AccomplishConfig;
use accomplish::journal::types::Granularity;
use anyhow::Result;

/// List every timeframe at `granularity`, newest first.
pub async fn timeframes(config: &AccomplishConfig, granularity: Granularity) -> Result<()> {
    let session = super::open_session(config, granularity).await?;
    let summaries = session.timeframes();

    if summaries.is_empty() {
        println!("No accomplishments logged yet.");
        return Ok(());
    }

    let width = summaries
        .iter()
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(0);
    for summary in &summaries {
        println!(
            "{:<8} {:<width$}  {:>4} {}  avg {:.1}",
            summary.key.as_str(),
            summary.label,
            summary.stats.count,
            super::plural(summary.stats.count, "entry  ", "entries"),
            summary.stats.average_rating,
        );
    }
    Ok(())
}
