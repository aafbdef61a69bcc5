//! CLI `show` command: one timeframe with its stats, entries and insight.

use accomplish::config::AccomplishConfig;
use accomplish::journal::orchestrator::InsightState;
use accomplish::journal::types::Granularity;
use anyhow::Result;

use super::{insight_footer, open_at, plural};

pub async fn show(config: &AccomplishConfig, granularity: Granularity, key: Option<&str>) -> Result<()> {
    let session = open_at(config, granularity, key).await?;

    let Some(bucket) = session.current_bucket() else {
        println!("No accomplishments logged yet.");
        return Ok(());
    };

    println!("{}", bucket.label);
    println!("{}", "=".repeat(bucket.label.chars().count()));
    println!(
        "{} {} · average impact {:.1}/10",
        bucket.stats.count,
        plural(bucket.stats.count, "accomplishment", "accomplishments"),
        bucket.stats.average_rating
    );
    println!();
    for entry in &bucket.entries {
        println!(
            "  [{:>2}/10] {}  ({})",
            entry.rating,
            entry.text,
            entry.timestamp.format("%Y-%m-%d")
        );
    }
    println!();

    match session.insight_state() {
        InsightState::Ready(Some(insight)) => {
            println!("Insight");
            println!("-------");
            println!("{}", insight.content);
            println!();
            print!("{}", insight_footer(insight));
            if session.is_stale() {
                print!(" (new accomplishments added)");
            }
            println!();
        }
        InsightState::Failed(err) => println!("Insight unavailable: {err}"),
        _ if session.can_generate() => {
            println!("No insight yet. Run `accomplish insight` to generate one.");
        }
        _ => println!("No insight yet."),
    }
    Ok(())
}
