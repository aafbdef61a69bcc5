//! CLI `doctor` command: run database diagnostics and print a health report.

use accomplish::config::AccomplishConfig;
use accomplish::db;
use accomplish::generation::create_generator;
use anyhow::{Context, Result};

pub fn doctor(config: &AccomplishConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `accomplish add` or `accomplish serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Accomplish Health Report");
    println!("========================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Generation:");
    println!("  Provider:        {}", config.generation.provider);
    println!("  Model:           {}", config.generation.model);
    match create_generator(&config.generation) {
        Ok(generator) if generator.is_configured() => println!("  Status:          OK"),
        Ok(_) => println!("  Status:          not configured (set GOOGLE_AI_API_KEY)"),
        Err(e) => println!("  Status:          error ({e})"),
    }
    println!();
    println!("Row counts:");
    println!("  Accomplishments: {}", report.entry_count);
    println!("  Insights:        {}", report.insight_count);
    println!("  Owners:          {}", report.owner_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.accomplish/journal.db");
        println!("  2. Or export what is readable: accomplish export > backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
