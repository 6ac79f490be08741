//! Shared types for the detector pipeline

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::{AnomalyType, DetectionSettings, Severity, Transaction};

/// Context handed to every detector for one run
///
/// Transactions are the rule-filtered working set for the lookback window,
/// ordered oldest first. Detectors only read; they never mutate. `now` is
/// fixed once per run so every detector agrees on recency.
pub struct DetectionContext<'a> {
    pub settings: &'a DetectionSettings,
    pub transactions: &'a [Transaction],
    pub now: DateTime<Utc>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        settings: &'a DetectionSettings,
        transactions: &'a [Transaction],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            settings,
            transactions,
            now,
        }
    }
}

/// An in-memory detection output, before persistence and dedup
#[derive(Debug, Clone)]
pub struct AnomalyCandidate {
    pub transaction_id: i64,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub reason: String,
    /// Detector-specific structured payload
    pub metadata: Value,
}

impl AnomalyCandidate {
    pub fn new(
        transaction_id: i64,
        anomaly_type: AnomalyType,
        severity: Severity,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            anomaly_type,
            severity,
            reason: reason.into(),
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Metadata payload for `suspicious_pattern` candidates
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousMatchData {
    pub pattern: String,
}

/// Metadata payload for `duplicate_charge` candidates
///
/// `cluster` holds every transaction ID in the duplicate group, sorted
/// chronologically; `span_hours` is the spread between first and last.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateChargeData {
    pub amount: f64,
    pub merchant: String,
    pub cluster: Vec<i64>,
    pub span_hours: f64,
}

/// Metadata payload for `unusual_amount` candidates
#[derive(Debug, Clone, Serialize)]
pub struct UnusualAmountData {
    pub category: String,
    pub amount: f64,
    pub category_mean: f64,
    /// Rounded to one decimal for display; the threshold comparison uses
    /// the exact value
    pub z_score: f64,
}

/// Metadata payload for `new_high_value_merchant` candidates
#[derive(Debug, Clone, Serialize)]
pub struct NewMerchantData {
    pub merchant: String,
    pub total_spend: f64,
}

/// Metadata payload for `geographic_anomaly` candidates
#[derive(Debug, Clone, Serialize)]
pub struct GeographicData {
    pub merchant: String,
    pub previous_location: String,
    pub location: String,
    pub hours_apart: f64,
}
