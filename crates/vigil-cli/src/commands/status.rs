//! Status command: database location, encryption state, row counts

use std::path::Path;

use anyhow::Result;

use super::{open_db, resolve_db_path};

pub fn cmd_status(db: Option<&Path>, user_id: i64, no_encrypt: bool) -> Result<()> {
    use std::fs;
    use vigil_core::db::DB_KEY_ENV;

    println!();
    println!("📊 Vigil Status");
    println!("   ─────────────────────────────────────────────────────────────");

    let path = resolve_db_path(db);
    println!("   Database: {}", path.display());

    if path.exists() {
        if let Ok(metadata) = fs::metadata(&path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    // Check encryption status
    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    // Try to open the database and show stats
    if path.exists() {
        match open_db(db, no_encrypt) {
            Ok(db) => {
                if let Ok(stats) = db.get_stats(user_id) {
                    println!();
                    println!("   Accounts: {}", stats.total_accounts);
                    println!("   Transactions: {}", stats.total_transactions);
                    println!("   Active anomalies: {}", stats.active_anomalies);
                    println!("   Dismissal rules: {}", stats.dismissal_rules);
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}
