mod cli;
mod server;

use accomplish::config;
use accomplish::journal::types::Granularity;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "accomplish", version, about = "Accomplishment journal with AI insights")]
struct Cli {
    /// Journal owner (overrides config and ACCOMPLISH_OWNER)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    Serve,
    /// Log an accomplishment
    Add {
        /// What you accomplished
        text: String,
        /// Impact rating, 1-10
        #[arg(short, long)]
        rating: i64,
        /// When it happened (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Show one timeframe: stats, entries, and cached insight
    Show {
        #[arg(short, long, default_value = "month")]
        granularity: Granularity,
        /// Timeframe key (YYYY-MM or YYYY). Defaults to the newest.
        key: Option<String>,
    },
    /// List timeframes with entry counts and average impact
    Timeframes {
        #[arg(short, long, default_value = "month")]
        granularity: Granularity,
    },
    /// Show or generate the AI insight for a timeframe
    Insight {
        #[arg(short, long, default_value = "month")]
        granularity: Granularity,
        /// Timeframe key (YYYY-MM or YYYY). Defaults to the newest.
        key: Option<String>,
        /// Generate even if a cached insight exists
        #[arg(long)]
        regenerate: bool,
    },
    /// Export all entries and insights as JSON to stdout
    Export,
    /// Run database diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::AccomplishConfig::load()?;
    if let Some(owner) = cli.owner {
        config.storage.owner = owner;
    }

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Add { text, rating, at } => {
            cli::add::add(&config, &text, rating, at.as_deref()).await?;
        }
        Command::Show { granularity, key } => {
            cli::show::show(&config, granularity, key.as_deref()).await?;
        }
        Command::Timeframes { granularity } => {
            cli::timeframes::timeframes(&config, granularity).await?;
        }
        Command::Insight {
            granularity,
            key,
            regenerate,
        } => {
            cli::insight::insight(&config, granularity, key.as_deref(), regenerate).await?;
        }
        Command::Export => cli::export::export(&config).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
