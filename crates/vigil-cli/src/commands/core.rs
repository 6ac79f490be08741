//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_detect` - Run anomaly detection

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use vigil_core::db::Database;
use vigil_core::detect::DetectionEngine;
use vigil_core::models::DetectionOverrides;

use super::anomalies::print_anomaly;

/// Resolve the database path from the --db flag or the platform default
pub fn resolve_db_path(db: Option<&Path>) -> PathBuf {
    match db {
        Some(path) => path.to_path_buf(),
        None => vigil_core::db::default_db_path(),
    }
}

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db: Option<&Path>, no_encrypt: bool) -> Result<Database> {
    let path = resolve_db_path(db);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let path_str = path.to_str().context("Database path is not valid UTF-8")?;
    debug!("Opening database at {}", path_str);

    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db: Option<&Path>, no_encrypt: bool) -> Result<()> {
    let path = resolve_db_path(db);
    println!("🔧 Initializing database at {}...", path.display());

    let _db = open_db(db, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an account: vigil accounts add \"Everyday Checking\" -t checking");
    println!("  2. Record transactions: vigil transactions add --account 1 --name \"Coffee\" --amount -4.50");
    println!("  3. Run detection: vigil detect");

    Ok(())
}

pub fn cmd_detect(
    db: &Database,
    user_id: i64,
    overrides: &DetectionOverrides,
    include_hidden: bool,
    json: bool,
) -> Result<()> {
    if !json {
        println!("🔍 Running anomaly detection...");
    }

    let engine = DetectionEngine::new();
    let report = engine.run(db, user_id, overrides, include_hidden)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("📊 Detection Results");
    println!("   ─────────────────────────────");
    println!("   Window: last {} days", report.settings.time_window_days);
    println!("   New anomalies this run: {}", report.new_count);
    println!("   Active anomalies: {}", report.anomalies.len());

    if report.anomalies.is_empty() {
        println!();
        println!("✅ No anomalies detected. Your spending looks normal!");
        return Ok(());
    }

    println!();
    for anomaly in &report.anomalies {
        print_anomaly(anomaly);
    }

    println!();
    println!("💡 Hide a finding with 'vigil anomalies hide <id>', or add a");
    println!("   dismissal rule with 'vigil rules add' to suppress it for good.");

    Ok(())
}
