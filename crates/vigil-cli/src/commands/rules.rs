//! Dismissal rule command implementations (list, add, delete)

use anyhow::{bail, Result};
use vigil_core::db::Database;

pub fn cmd_rules_list(db: &Database, user_id: i64) -> Result<()> {
    let rules = db.list_dismissal_rules(user_id)?;

    if rules.is_empty() {
        println!("No dismissal rules. Add one with:");
        println!("  vigil rules add merchant_name \"coffee\"");
        return Ok(());
    }

    println!();
    println!("📋 Dismissal Rules");
    println!("   ─────────────────────────────");

    for rule in rules {
        println!("   [{}] {}: '{}'", rule.id, rule.pattern_type, rule.pattern);
    }

    Ok(())
}

pub fn cmd_rules_add(db: &Database, user_id: i64, pattern_type: &str, pattern: &str) -> Result<()> {
    let id = db.add_dismissal_rule(user_id, pattern_type, pattern)?;

    println!("✅ Added rule [{}] {}: '{}'", id, pattern_type, pattern);
    println!("   Matching anomalies are suppressed from now on, including ones");
    println!("   already on record.");

    Ok(())
}

pub fn cmd_rules_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    if !db.delete_dismissal_rule(user_id, id)? {
        bail!("Rule {} not found", id);
    }
    println!("✅ Deleted rule {}.", id);
    Ok(())
}
