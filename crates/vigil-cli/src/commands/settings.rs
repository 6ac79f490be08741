//! Detection settings command implementations (show, set)

use anyhow::Result;
use vigil_core::db::Database;
use vigil_core::models::{DetectionOverrides, DetectionSettings};

fn print_settings(settings: &DetectionSettings) {
    println!("   Enabled: {}", if settings.enabled { "yes" } else { "no" });
    println!("   Window: last {} days", settings.time_window_days);
    println!(
        "   Amount range: ${:.2} to ${:.2}",
        settings.min_amount, settings.max_amount
    );
    println!("   Z-score threshold: {}", settings.z_score_threshold);
    println!(
        "   New-merchant threshold: ${:.2}",
        settings.new_merchant_threshold
    );
    println!(
        "   Geographic threshold: ${:.2}",
        settings.geographic_threshold
    );
    println!("   Duplicate window: {} hours", settings.hours_window);
    println!(
        "   Notifications: in-app {}, email {}",
        if settings.notify_in_app { "on" } else { "off" },
        if settings.notify_email { "on" } else { "off" }
    );
}

pub fn cmd_settings_show(db: &Database, user_id: i64) -> Result<()> {
    let (settings, created) = db.get_or_create_settings(user_id)?;

    println!();
    println!("⚙️  Detection Settings");
    println!("   ─────────────────────────────");
    print_settings(&settings);

    if created {
        println!();
        println!("   (defaults; change them with 'vigil settings set')");
    }

    Ok(())
}

pub fn cmd_settings_set(db: &Database, user_id: i64, overrides: &DetectionOverrides) -> Result<()> {
    if overrides.is_empty() {
        println!("Nothing to update. Pass at least one flag, e.g. --days 60.");
        return Ok(());
    }

    let settings = db.update_settings(user_id, overrides)?;

    println!("✅ Settings updated");
    println!("   ─────────────────────────────");
    print_settings(&settings);

    Ok(())
}
