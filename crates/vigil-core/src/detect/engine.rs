//! Detection engine - orchestrates detectors, persistence and reporting

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Anomaly, AnomalyType, DetectionOverrides, DetectionSettings};
use crate::rules::RuleFilter;

use super::types::{AnomalyCandidate, DetectionContext};
use super::{
    DuplicateChargeDetector, GeographicAnomalyDetector, NewMerchantDetector,
    SuspiciousPatternDetector, UnusualAmountDetector,
};

/// Trait for anomaly detectors
pub trait Detector: Send + Sync {
    /// The anomaly type this detector produces
    fn id(&self) -> AnomalyType;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Scan the window and produce candidates
    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>>;
}

/// Outcome of one detection run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    /// Active anomalies after rule filtering, sorted by severity then
    /// transaction date descending
    pub anomalies: Vec<Anomaly>,
    /// How many anomalies this run persisted for the first time
    pub new_count: usize,
    /// The effective settings the run used (stored row plus overrides)
    pub settings: DetectionSettings,
}

/// The main detection engine
pub struct DetectionEngine {
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionEngine {
    /// Create an engine with the built-in detectors
    pub fn new() -> Self {
        let mut engine = Self { detectors: vec![] };

        engine.register(Box::new(SuspiciousPatternDetector::new()));
        engine.register(Box::new(DuplicateChargeDetector::new()));
        engine.register(Box::new(UnusualAmountDetector::new()));
        engine.register(Box::new(NewMerchantDetector::new()));
        engine.register(Box::new(GeographicAnomalyDetector::new()));

        engine
    }

    /// Register a detector
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    /// Get list of registered detector types
    pub fn detector_types(&self) -> Vec<AnomalyType> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    /// Run every detector over the window and concatenate candidates
    ///
    /// A failing detector is logged and skipped; the others still run.
    pub fn detect_all(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>> {
        let mut candidates = vec![];

        for detector in &self.detectors {
            match detector.detect(ctx) {
                Ok(found) => {
                    tracing::debug!(
                        detector = detector.id().as_str(),
                        count = found.len(),
                        "Detector complete"
                    );
                    candidates.extend(found);
                }
                Err(e) => {
                    tracing::warn!(
                        detector = detector.id().as_str(),
                        error = %e,
                        "Detector failed"
                    );
                }
            }
        }

        Ok(candidates)
    }

    /// One full detection run for a user
    ///
    /// Loads (or creates) settings, fetches the clamped transaction window,
    /// applies dismissal rules before and after detection, persists new
    /// findings exactly once per (settings, transaction, type), and returns
    /// the active anomaly set with the effective settings.
    ///
    /// Settings or transaction fetch failures abort the run; a failure on a
    /// single candidate does not.
    pub fn run(
        &self,
        db: &Database,
        user_id: i64,
        overrides: &DetectionOverrides,
        include_hidden: bool,
    ) -> Result<DetectionReport> {
        let (stored, created) = db.get_or_create_settings(user_id)?;
        if created {
            tracing::debug!(user = user_id, "Created default detection settings");
        }
        let settings = stored.with_overrides(overrides);

        if !settings.enabled {
            tracing::info!(user = user_id, "Detection disabled for user");
            return Ok(DetectionReport {
                anomalies: vec![],
                new_count: 0,
                settings,
            });
        }

        let now = Utc::now();
        let since = now - Duration::days(settings.time_window_days);
        let transactions = db.transactions_in_window(
            user_id,
            since.naive_utc(),
            now.naive_utc(),
            settings.min_amount,
            settings.max_amount,
        )?;

        let rules = db.list_dismissal_rules(user_id)?;
        let filter = RuleFilter::new(&rules);
        let transactions = filter.filter_transactions(transactions);

        let ctx = DetectionContext::new(&settings, &transactions, now);
        let candidates = self.detect_all(&ctx)?;

        let mut new_count = 0;
        for candidate in &candidates {
            // The window was fetched earlier in the run; the transaction
            // could have been deleted since
            match db.transaction_exists(candidate.transaction_id) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        transaction = candidate.transaction_id,
                        "Skipping candidate for deleted transaction"
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        transaction = candidate.transaction_id,
                        error = %e,
                        "Skipping candidate, existence check failed"
                    );
                    continue;
                }
            }

            match db.insert_anomaly(settings.id, candidate, now) {
                Ok(Some(_)) => new_count += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        transaction = candidate.transaction_id,
                        anomaly_type = candidate.anomaly_type.as_str(),
                        error = %e,
                        "Failed to persist anomaly"
                    );
                }
            }
        }

        let mut anomalies = db.list_anomalies(settings.id, include_hidden)?;
        // Rules added after an anomaly was stored still suppress it here
        anomalies.retain(|a| !filter.is_dismissed(&a.transaction));
        sort_anomalies(&mut anomalies);

        tracing::info!(
            user = user_id,
            candidates = candidates.len(),
            new = new_count,
            active = anomalies.len(),
            "Detection run complete"
        );

        Ok(DetectionReport {
            anomalies,
            new_count,
            settings,
        })
    }
}

/// Sort by severity (highest first), then by transaction date (most recent
/// first), then by row ID for a stable order
pub fn sort_anomalies(anomalies: &mut [Anomaly]) {
    anomalies.sort_by(|a, b| {
        b.severity
            .priority()
            .cmp(&a.severity.priority())
            .then_with(|| b.transaction.date.cmp(&a.transaction.date))
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTransaction, Severity, Transaction};
    use chrono::NaiveDateTime;

    #[test]
    fn test_engine_registers_builtin_detectors() {
        let engine = DetectionEngine::new();
        let types = engine.detector_types();

        assert_eq!(types.len(), 5);
        assert!(types.contains(&AnomalyType::SuspiciousPattern));
        assert!(types.contains(&AnomalyType::DuplicateCharge));
        assert!(types.contains(&AnomalyType::UnusualAmount));
        assert!(types.contains(&AnomalyType::NewHighValueMerchant));
        assert!(types.contains(&AnomalyType::GeographicAnomaly));
    }

    #[test]
    fn test_run_on_empty_database() {
        let db = Database::in_memory().unwrap();
        let engine = DetectionEngine::new();

        let report = engine
            .run(&db, 1, &DetectionOverrides::default(), false)
            .unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.new_count, 0);
        assert_eq!(report.settings.z_score_threshold, 2.5);
    }

    #[test]
    fn test_run_disabled_returns_empty_report() {
        let db = Database::in_memory().unwrap();
        let account_id = db.create_account(1, "Card", None, None).unwrap();

        // A duplicate pair that would fire if detection ran
        let date = Utc::now().naive_utc() - Duration::days(2);
        for _ in 0..2 {
            db.insert_transaction(
                account_id,
                &NewTransaction {
                    date,
                    name: "Acme Corp".to_string(),
                    merchant: Some("Acme Corp".to_string()),
                    merchant_id: None,
                    amount: -200.0,
                    category: None,
                    ai_category: None,
                    location: None,
                    pending: false,
                },
            )
            .unwrap();
        }
        db.update_settings(
            1,
            &DetectionOverrides {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let engine = DetectionEngine::new();
        let report = engine
            .run(&db, 1, &DetectionOverrides::default(), false)
            .unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.new_count, 0);
        assert!(!report.settings.enabled);
    }

    fn anomaly(id: i64, severity: Severity, date: &str) -> Anomaly {
        let tx = Transaction {
            id,
            account_id: 1,
            date: NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap(),
            name: "x".to_string(),
            merchant: None,
            merchant_id: None,
            amount: -100.0,
            category: None,
            ai_category: None,
            location: None,
            pending: false,
            created_at: Utc::now(),
        };
        Anomaly {
            id,
            settings_id: 1,
            transaction_id: id,
            anomaly_type: AnomalyType::DuplicateCharge,
            severity,
            reason: "r".to_string(),
            metadata: serde_json::Value::Null,
            is_hidden: false,
            is_resolved: false,
            detected_at: Utc::now(),
            created_at: Utc::now(),
            transaction: tx,
        }
    }

    #[test]
    fn test_sort_severity_then_transaction_date() {
        let mut anomalies = vec![
            anomaly(1, Severity::Medium, "2026-03-12 10:00:00"),
            anomaly(2, Severity::High, "2026-03-01 10:00:00"),
            anomaly(3, Severity::Low, "2026-03-15 10:00:00"),
            anomaly(4, Severity::High, "2026-03-10 10:00:00"),
        ];
        sort_anomalies(&mut anomalies);

        let order: Vec<i64> = anomalies.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![4, 2, 1, 3]);
    }
}
