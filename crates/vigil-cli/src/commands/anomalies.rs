//! Anomaly review command implementations (list, hide, resolve)

use anyhow::{bail, Result};
use vigil_core::db::Database;
use vigil_core::detect::sort_anomalies;
use vigil_core::models::{Anomaly, AnomalyType, Severity};

/// Print one anomaly in the three-line report format
pub fn print_anomaly(anomaly: &Anomaly) {
    let type_icon = match anomaly.anomaly_type {
        AnomalyType::SuspiciousPattern => "🚩",
        AnomalyType::DuplicateCharge => "👯",
        AnomalyType::UnusualAmount => "📊",
        AnomalyType::NewHighValueMerchant => "🆕",
        AnomalyType::GeographicAnomaly => "🌍",
    };

    let severity_str = match anomaly.severity {
        Severity::High => "\x1b[31mHIGH\x1b[0m",
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m",
        Severity::Low => "\x1b[32mLOW\x1b[0m",
    };

    let hidden_mark = if anomaly.is_hidden { " (hidden)" } else { "" };

    println!(
        "   {} [{}] {} {}{}",
        type_icon,
        anomaly.id,
        severity_str,
        anomaly.anomaly_type.label(),
        hidden_mark
    );
    println!("      {}", anomaly.reason);
    println!(
        "      {} │ ${:.2} │ {}",
        anomaly.transaction.date.format("%Y-%m-%d"),
        anomaly.transaction.amount.abs(),
        super::truncate(anomaly.transaction.merchant_display(), 40)
    );
    println!();
}

pub fn cmd_anomalies_list(db: &Database, user_id: i64, include_hidden: bool) -> Result<()> {
    let (settings, _) = db.get_or_create_settings(user_id)?;
    let mut anomalies = db.list_anomalies(settings.id, include_hidden)?;
    sort_anomalies(&mut anomalies);

    if anomalies.is_empty() {
        println!("✅ No anomalies on record. Your spending looks normal!");
        return Ok(());
    }

    println!();
    println!("⚠️  Anomalies");
    println!("   ─────────────────────────────────────────────────────────────");

    for anomaly in &anomalies {
        print_anomaly(anomaly);
    }

    Ok(())
}

pub fn cmd_anomalies_hide(db: &Database, id: i64) -> Result<()> {
    if !db.hide_anomaly(id)? {
        bail!("Anomaly {} not found", id);
    }
    println!("✅ Hidden anomaly {}. It stays in the database but is excluded", id);
    println!("   from default listings. Use 'vigil anomalies list --include-hidden' to see it.");
    Ok(())
}

pub fn cmd_anomalies_resolve(db: &Database, id: i64) -> Result<()> {
    if !db.resolve_anomaly(id)? {
        bail!("Anomaly {} not found", id);
    }
    println!("✅ Resolved anomaly {}.", id);
    Ok(())
}
