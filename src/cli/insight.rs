//! CLI `insight` command: print the cached insight, generating it when
//! missing or when `--regenerate` is passed.

use accomplish::config::AccomplishConfig;
use accomplish::journal::types::Granularity;
use anyhow::{bail, Result};

use super::{insight_footer, open_at};

pub async fn insight(
    config: &AccomplishConfig,
    granularity: Granularity,
    key: Option<&str>,
    regenerate: bool,
) -> Result<()> {
    let mut session = open_at(config, granularity, key).await?;

    let Some(bucket) = session.current_bucket() else {
        println!("No accomplishments logged yet.");
        return Ok(());
    };

    let insight = match session.insight().cloned() {
        Some(existing) if !regenerate => existing,
        _ => {
            if !session.can_generate() {
                bail!("insight generation is not configured; set GOOGLE_AI_API_KEY");
            }
            eprintln!("Generating insight for {}...", bucket.label);
            session.generate_insight().await?
        }
    };

    println!("{}", bucket.label);
    println!();
    println!("{}", insight.content);
    println!();
    print!("{}", insight_footer(&insight));
    if session.is_stale() {
        print!(" (new accomplishments added)");
    }
    println!();
    Ok(())
}
