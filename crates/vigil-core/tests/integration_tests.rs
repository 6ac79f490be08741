//! Integration tests for vigil-core
//!
//! These tests drive the full seed → detect → persist → report pipeline
//! against a real temporary database file.

use chrono::{Datelike, Duration, NaiveDateTime, Utc};
use vigil_core::{
    db::Database,
    detect::DetectionEngine,
    models::{AnomalyType, DetectionOverrides, NewTransaction, Severity},
};

const USER: i64 = 1;

fn setup() -> (Database, i64) {
    let db = Database::in_memory().expect("Failed to create test database");
    let account_id = db
        .create_account(USER, "Everyday Checking", None, Some("First Example Bank"))
        .expect("Failed to create account");
    (db, account_id)
}

fn days_ago(days: i64) -> NaiveDateTime {
    (Utc::now() - Duration::days(days)).naive_utc()
}

/// A date roughly `days` back that avoids the 1st through 5th of the month.
/// Duplicate detection treats a pair landing on those days as billing-cycle
/// posting, so fixtures that want duplicates to fire steer clear of them.
fn days_ago_mid_month(days: i64) -> NaiveDateTime {
    let mut d = days_ago(days);
    if d.day() <= 5 {
        d -= Duration::days(7);
    }
    d
}

fn seed_tx(
    db: &Database,
    account_id: i64,
    date: NaiveDateTime,
    merchant: &str,
    amount: f64,
    category: Option<&str>,
) -> i64 {
    db.insert_transaction(
        account_id,
        &NewTransaction {
            date,
            name: merchant.to_string(),
            merchant: Some(merchant.to_string()),
            merchant_id: None,
            amount,
            category: category.map(|c| c.to_string()),
            ai_category: None,
            location: None,
            pending: false,
        },
    )
    .expect("Failed to insert transaction")
}

fn anomaly_rows(db: &Database) -> i64 {
    let conn = db.conn().expect("Failed to get connection");
    conn.query_row("SELECT COUNT(*) FROM anomalies", [], |row| row.get(0))
        .expect("Failed to count anomaly rows")
}

// =============================================================================
// End-to-End Detection
// =============================================================================

#[test]
fn test_end_to_end_detection_scenario() {
    let (db, account_id) = setup();

    // Three small coffee charges: below the $50 minimum, never considered
    for days in [12, 9, 6] {
        let date = days_ago(days).date().and_hms_opt(8, 15, 0).unwrap();
        seed_tx(&db, account_id, date, "Coffee Shop", -45.0, Some("Food and Drink"));
    }

    // A large first-ever charge at a merchant never seen before
    seed_tx(
        &db,
        account_id,
        days_ago(3),
        "Unknown Gift Card Store",
        -3000.0,
        None,
    );

    // Two identical charges two hours apart
    let base = days_ago_mid_month(10).date().and_hms_opt(9, 30, 0).unwrap();
    seed_tx(&db, account_id, base, "Acme Corp", -200.0, Some("Shopping"));
    seed_tx(
        &db,
        account_id,
        base + Duration::hours(2),
        "Acme Corp",
        -200.0,
        Some("Shopping"),
    );

    let engine = DetectionEngine::new();
    let report = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");

    assert_eq!(report.new_count, 3);
    assert_eq!(report.anomalies.len(), 3);
    assert!(report.anomalies.iter().all(|a| a.severity == Severity::High));

    // Highest severity first, then most recent; the gift card charge is newest
    let first = &report.anomalies[0];
    assert_eq!(first.anomaly_type, AnomalyType::NewHighValueMerchant);
    assert_eq!(first.transaction.merchant_display(), "Unknown Gift Card Store");
    assert!(first.reason.contains("new merchant"));

    let duplicates: Vec<_> = report
        .anomalies
        .iter()
        .filter(|a| a.anomaly_type == AnomalyType::DuplicateCharge)
        .collect();
    assert_eq!(duplicates.len(), 2, "one duplicate anomaly per charge");
    assert!(duplicates
        .iter()
        .all(|a| a.transaction.merchant_display() == "Acme Corp"));
    assert!(report.anomalies[1].transaction.date >= report.anomalies[2].transaction.date);

    // The store name contains "gift card" but nobody bought a gift card
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.anomaly_type != AnomalyType::SuspiciousPattern));
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.transaction.merchant_display() != "Coffee Shop"));
}

#[test]
fn test_detection_runs_are_idempotent() {
    let (db, account_id) = setup();

    let base = days_ago_mid_month(8).date().and_hms_opt(14, 0, 0).unwrap();
    seed_tx(&db, account_id, base, "Java Junction", -80.0, None);
    seed_tx(
        &db,
        account_id,
        base + Duration::hours(3),
        "Java Junction",
        -80.0,
        None,
    );

    let engine = DetectionEngine::new();
    let first = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("First run failed");
    assert_eq!(first.new_count, 2);
    assert_eq!(first.anomalies.len(), 2);
    assert_eq!(anomaly_rows(&db), 2);

    let second = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Second run failed");
    assert_eq!(second.new_count, 0, "re-running must not re-insert");
    assert_eq!(second.anomalies.len(), 2);
    assert_eq!(anomaly_rows(&db), 2);

    let first_ids: Vec<i64> = first.anomalies.iter().map(|a| a.id).collect();
    let second_ids: Vec<i64> = second.anomalies.iter().map(|a| a.id).collect();
    assert_eq!(first_ids, second_ids);
}

// =============================================================================
// Dismissal Rules
// =============================================================================

#[test]
fn test_rules_suppress_previously_stored_anomalies() {
    let (db, account_id) = setup();

    let base = days_ago_mid_month(7).date().and_hms_opt(10, 0, 0).unwrap();
    seed_tx(&db, account_id, base, "Corner Deli", -50.0, None);
    seed_tx(
        &db,
        account_id,
        base + Duration::hours(1),
        "Corner Deli",
        -50.0,
        None,
    );

    let engine = DetectionEngine::new();
    let before = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");
    assert_eq!(before.anomalies.len(), 2);

    db.add_dismissal_rule(USER, "amount_range", "40-60")
        .expect("Failed to add rule");

    let after = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");
    assert!(after.anomalies.is_empty(), "dismissed anomalies must not be reported");
    assert_eq!(after.new_count, 0);

    // The stored rows survive the dismissal untouched
    assert_eq!(anomaly_rows(&db), 2);
    let conn = db.conn().expect("Failed to get connection");
    let hidden: i64 = conn
        .query_row("SELECT COUNT(*) FROM anomalies WHERE is_hidden = 1", [], |row| {
            row.get(0)
        })
        .expect("Failed to count hidden rows");
    assert_eq!(hidden, 0);
}

#[test]
fn test_malformed_rule_rows_do_not_break_detection() {
    let (db, account_id) = setup();

    let base = days_ago_mid_month(9).date().and_hms_opt(16, 0, 0).unwrap();
    seed_tx(&db, account_id, base, "Gadget World", -75.0, None);
    seed_tx(
        &db,
        account_id,
        base + Duration::hours(2),
        "Gadget World",
        -75.0,
        None,
    );
    let java = days_ago_mid_month(8).date().and_hms_opt(11, 0, 0).unwrap();
    seed_tx(&db, account_id, java, "Java Junction", -90.0, None);
    seed_tx(
        &db,
        account_id,
        java + Duration::hours(2),
        "Java Junction",
        -90.0,
        None,
    );

    // A malformed legacy row; add_dismissal_rule would reject this today
    let conn = db.conn().expect("Failed to get connection");
    conn.execute(
        "INSERT INTO dismissal_rules (user_id, pattern_type, pattern) VALUES (?, 'amount_range', 'abc-def')",
        [USER],
    )
    .expect("Failed to insert legacy rule");
    drop(conn);

    db.add_dismissal_rule(USER, "merchant_name", "gadget")
        .expect("Failed to add rule");

    let engine = DetectionEngine::new();
    let report = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Run must survive malformed rules");

    // The valid rule still applies; the broken one is skipped
    assert_eq!(report.anomalies.len(), 2);
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.transaction.merchant_display() == "Java Junction"));
}

// =============================================================================
// Detector Behavior Through the Engine
// =============================================================================

#[test]
fn test_allow_list_wins_over_suspicious_patterns() {
    let (db, account_id) = setup();

    seed_tx(&db, account_id, days_ago(4), "Zelle Payment From Friend", -60.0, None);
    seed_tx(&db, account_id, days_ago(2), "Venmo Payment Request", -60.0, None);

    let engine = DetectionEngine::new();
    let report = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");

    assert_eq!(report.anomalies.len(), 1);
    let anomaly = &report.anomalies[0];
    assert_eq!(anomaly.anomaly_type, AnomalyType::SuspiciousPattern);
    assert_eq!(anomaly.severity, Severity::High);
    assert_eq!(anomaly.transaction.merchant_display(), "Venmo Payment Request");
    assert_eq!(anomaly.reason, "Peer-to-peer payment request");
}

#[test]
fn test_repeat_merchant_is_not_flagged_as_new() {
    let (db, account_id) = setup();

    // Two large charges at the same merchant: a relationship, not a probe
    seed_tx(&db, account_id, days_ago(6), "Luxe Atelier", -700.0, None);
    seed_tx(&db, account_id, days_ago(2), "Luxe Atelier", -800.0, None);

    // One large charge at a merchant seen exactly once
    seed_tx(&db, account_id, days_ago(3), "Glasshouse Gallery", -650.0, None);

    let engine = DetectionEngine::new();
    let report = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");

    assert_eq!(report.anomalies.len(), 1);
    let anomaly = &report.anomalies[0];
    assert_eq!(anomaly.anomaly_type, AnomalyType::NewHighValueMerchant);
    assert_eq!(anomaly.severity, Severity::High);
    assert_eq!(anomaly.transaction.merchant_display(), "Glasshouse Gallery");
}

#[test]
fn test_billing_cycle_pairs_are_not_duplicates() {
    let (db, account_id) = setup();

    // Same amount on the 2nd and the 3rd of consecutive months
    let cycle_first = days_ago(50).with_day(2).unwrap();
    let cycle_second = (cycle_first + Duration::days(40)).with_day(3).unwrap();
    seed_tx(&db, account_id, cycle_first, "Streamline Storage", -120.0, None);
    seed_tx(&db, account_id, cycle_second, "Streamline Storage", -120.0, None);

    // An ordinary mid-month pair inside the same widened window
    let gym = days_ago_mid_month(20);
    seed_tx(&db, account_id, gym, "Box Gym", -120.0, None);
    seed_tx(&db, account_id, gym + Duration::hours(24), "Box Gym", -120.0, None);

    let overrides = DetectionOverrides {
        time_window_days: Some(90),
        hours_window: Some(800),
        ..Default::default()
    };

    let engine = DetectionEngine::new();
    let report = engine
        .run(&db, USER, &overrides, false)
        .expect("Detection run failed");

    assert_eq!(report.anomalies.len(), 2);
    assert!(report.anomalies.iter().all(|a| {
        a.anomaly_type == AnomalyType::DuplicateCharge
            && a.transaction.merchant_display() == "Box Gym"
    }));
}

// =============================================================================
// Anomaly Lifecycle
// =============================================================================

#[test]
fn test_hidden_anomalies_stay_listed_on_request() {
    let (db, account_id) = setup();

    let base = days_ago_mid_month(5).date().and_hms_opt(12, 0, 0).unwrap();
    seed_tx(&db, account_id, base, "Pixel Arcade", -95.0, None);
    seed_tx(
        &db,
        account_id,
        base + Duration::hours(4),
        "Pixel Arcade",
        -95.0,
        None,
    );

    let engine = DetectionEngine::new();
    let report = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");
    assert_eq!(report.anomalies.len(), 2);

    let hidden_id = report.anomalies[0].id;
    let kept_id = report.anomalies[1].id;
    assert!(db.hide_anomaly(hidden_id).expect("Failed to hide anomaly"));

    let default_view = engine
        .run(&db, USER, &DetectionOverrides::default(), false)
        .expect("Detection run failed");
    assert_eq!(default_view.new_count, 0);
    assert_eq!(default_view.anomalies.len(), 1);
    assert_eq!(default_view.anomalies[0].id, kept_id);

    let full_view = engine
        .run(&db, USER, &DetectionOverrides::default(), true)
        .expect("Detection run failed");
    assert_eq!(full_view.anomalies.len(), 2);
    assert!(full_view
        .anomalies
        .iter()
        .any(|a| a.id == hidden_id && a.is_hidden));
}
