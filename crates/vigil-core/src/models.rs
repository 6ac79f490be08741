//! Domain models for Vigil

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bank account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    /// Owner of the account; users live in the surrounding system
    pub user_id: i64,
    pub name: String,
    pub account_type: Option<AccountType>,
    /// Institution name as reported by the aggregator
    pub institution: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    /// Posting timestamp; hour precision matters for the duplicate and
    /// geographic detectors
    pub date: NaiveDateTime,
    /// Display name from the provider
    pub name: String,
    /// Cleaned merchant name
    pub merchant: Option<String>,
    /// Provider merchant-entity identifier, when available
    pub merchant_id: Option<String>,
    /// Negative = expense, positive = income
    pub amount: f64,
    /// Provider-assigned category
    pub category: Option<String>,
    /// User- or AI-assigned category override
    pub ai_category: Option<String>,
    /// Free-form location string (e.g. "Portland, OR")
    pub location: Option<String>,
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Category used for grouping: AI override, then provider, then a fixed
    /// fallback bucket
    pub fn effective_category(&self) -> &str {
        self.ai_category
            .as_deref()
            .or(self.category.as_deref())
            .unwrap_or("Uncategorized")
    }

    /// Lowercased "name merchant" text that the pattern libraries and
    /// free-text dismissal rules match against
    pub fn search_text(&self) -> String {
        match &self.merchant {
            Some(m) => format!("{} {}", self.name, m).to_lowercase(),
            None => self.name.to_lowercase(),
        }
    }

    /// Merchant identity key shared by the duplicate, new-merchant, and
    /// geographic detectors: entity id, else merchant name, else display name
    pub fn merchant_key(&self) -> String {
        if let Some(id) = &self.merchant_id {
            return id.clone();
        }
        match &self.merchant {
            Some(m) => m.to_lowercase(),
            None => self.name.to_lowercase(),
        }
    }

    /// Merchant name for human-readable output
    pub fn merchant_display(&self) -> &str {
        self.merchant.as_deref().unwrap_or(&self.name)
    }
}

/// A new transaction to be recorded (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDateTime,
    pub name: String,
    pub merchant: Option<String>,
    pub merchant_id: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
    pub ai_category: Option<String>,
    pub location: Option<String>,
    pub pending: bool,
}

/// Per-user detection configuration, created lazily with defaults on first
/// read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    pub id: i64,
    pub user_id: i64,
    /// Master switch; a disabled user gets an empty report
    pub enabled: bool,
    /// Transactions with abs(amount) below this are never considered
    pub min_amount: f64,
    /// Transactions with abs(amount) above this are never considered
    pub max_amount: f64,
    /// Lookback window in days
    pub time_window_days: i64,
    /// Z-score above which a charge is an outlier for its category
    pub z_score_threshold: f64,
    /// Cumulative spend above which a brand-new merchant is flagged
    pub new_merchant_threshold: f64,
    /// Minimum significance for geographic checks; stored and surfaced but
    /// the detector applies a fixed $50 floor
    pub geographic_threshold: f64,
    /// Shared hour window for the duplicate and geographic detectors
    pub hours_window: i64,
    /// Notification preferences; round-tripped, never consulted by detection
    pub notify_in_app: bool,
    pub notify_email: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DetectionSettings {
    pub const DEFAULT_MIN_AMOUNT: f64 = 50.0;
    pub const DEFAULT_MAX_AMOUNT: f64 = 10000.0;
    pub const DEFAULT_TIME_WINDOW_DAYS: i64 = 30;
    pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 2.5;
    pub const DEFAULT_NEW_MERCHANT_THRESHOLD: f64 = 100.0;
    pub const DEFAULT_GEOGRAPHIC_THRESHOLD: f64 = 50.0;
    pub const DEFAULT_HOURS_WINDOW: i64 = 24;

    /// Settings record with all defaults, not yet persisted
    pub fn defaults(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            enabled: true,
            min_amount: Self::DEFAULT_MIN_AMOUNT,
            max_amount: Self::DEFAULT_MAX_AMOUNT,
            time_window_days: Self::DEFAULT_TIME_WINDOW_DAYS,
            z_score_threshold: Self::DEFAULT_Z_SCORE_THRESHOLD,
            new_merchant_threshold: Self::DEFAULT_NEW_MERCHANT_THRESHOLD,
            geographic_threshold: Self::DEFAULT_GEOGRAPHIC_THRESHOLD,
            hours_window: Self::DEFAULT_HOURS_WINDOW,
            notify_in_app: true,
            notify_email: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective settings for a single run; the stored row is untouched
    pub fn with_overrides(&self, overrides: &DetectionOverrides) -> Self {
        let mut s = self.clone();
        if let Some(v) = overrides.enabled {
            s.enabled = v;
        }
        if let Some(v) = overrides.min_amount {
            s.min_amount = v;
        }
        if let Some(v) = overrides.max_amount {
            s.max_amount = v;
        }
        if let Some(v) = overrides.time_window_days {
            s.time_window_days = v;
        }
        if let Some(v) = overrides.z_score_threshold {
            s.z_score_threshold = v;
        }
        if let Some(v) = overrides.new_merchant_threshold {
            s.new_merchant_threshold = v;
        }
        if let Some(v) = overrides.geographic_threshold {
            s.geographic_threshold = v;
        }
        if let Some(v) = overrides.hours_window {
            s.hours_window = v;
        }
        if let Some(v) = overrides.notify_in_app {
            s.notify_in_app = v;
        }
        if let Some(v) = overrides.notify_email {
            s.notify_email = v;
        }
        s
    }
}

/// Optional per-run or per-update overrides for every settings field
#[derive(Debug, Clone, Default)]
pub struct DetectionOverrides {
    pub enabled: Option<bool>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub time_window_days: Option<i64>,
    pub z_score_threshold: Option<f64>,
    pub new_merchant_threshold: Option<f64>,
    pub geographic_threshold: Option<f64>,
    pub hours_window: Option<i64>,
    pub notify_in_app: Option<bool>,
    pub notify_email: Option<bool>,
}

impl DetectionOverrides {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.time_window_days.is_none()
            && self.z_score_threshold.is_none()
            && self.new_merchant_threshold.is_none()
            && self.geographic_threshold.is_none()
            && self.hours_window.is_none()
            && self.notify_in_app.is_none()
            && self.notify_email.is_none()
    }
}

/// Recognized dismissal pattern kinds
///
/// Rows carry the kind as free text so that rules written by newer clients
/// still evaluate (unrecognized kinds fall back to free-text matching).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    ExactName,
    MerchantName,
    Category,
    AmountRange,
    FreeText,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactName => "exact_name",
            Self::MerchantName => "merchant_name",
            Self::Category => "category",
            Self::AmountRange => "amount_range",
            Self::FreeText => "free_text",
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact_name" => Ok(Self::ExactName),
            "merchant_name" => Ok(Self::MerchantName),
            "category" => Ok(Self::Category),
            "amount_range" => Ok(Self::AmountRange),
            "free_text" => Ok(Self::FreeText),
            _ => Err(format!("Unknown pattern kind: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-authored suppression rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissalRule {
    pub id: i64,
    pub user_id: i64,
    /// Stored as text; see [`PatternKind`] for recognized values
    pub pattern_type: String,
    /// Payload interpreted per kind; "min-max" for amount_range
    pub pattern: String,
    pub created_at: DateTime<Utc>,
}

/// Anomaly categories produced by the detector pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Transaction text matches a known scam/fraud pattern
    SuspiciousPattern,
    /// Same charge posted more than once within the hour window
    DuplicateCharge,
    /// Statistically unusual amount for its category
    UnusualAmount,
    /// First-ever charge from a merchant, above the value threshold
    NewHighValueMerchant,
    /// Same merchant in two places implausibly fast
    GeographicAnomaly,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuspiciousPattern => "suspicious_pattern",
            Self::DuplicateCharge => "duplicate_charge",
            Self::UnusualAmount => "unusual_amount",
            Self::NewHighValueMerchant => "new_high_value_merchant",
            Self::GeographicAnomaly => "geographic_anomaly",
        }
    }

    /// Short human label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::SuspiciousPattern => "Suspicious pattern",
            Self::DuplicateCharge => "Duplicate charge",
            Self::UnusualAmount => "Unusual amount",
            Self::NewHighValueMerchant => "New high-value merchant",
            Self::GeographicAnomaly => "Geographic anomaly",
        }
    }
}

impl std::str::FromStr for AnomalyType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "suspicious_pattern" => Ok(Self::SuspiciousPattern),
            "duplicate_charge" => Ok(Self::DuplicateCharge),
            "unusual_amount" => Ok(Self::UnusualAmount),
            "new_high_value_merchant" => Ok(Self::NewHighValueMerchant),
            "geographic_anomaly" => Ok(Self::GeographicAnomaly),
            _ => Err(format!("Unknown anomaly type: {}", s)),
        }
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level of an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted anomaly, joined with its underlying transaction
///
/// One row per (settings, transaction, type) tuple. Rows are append-only
/// from the engine's perspective; hide/resolve are the only mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: i64,
    pub settings_id: i64,
    pub transaction_id: i64,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    /// Human-readable explanation
    pub reason: String,
    /// Detector-specific structured payload
    pub metadata: serde_json::Value,
    pub is_hidden: bool,
    pub is_resolved: bool,
    pub detected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// The transaction this anomaly was raised against
    pub transaction: Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_tx() -> Transaction {
        Transaction {
            id: 1,
            account_id: 1,
            date: NaiveDateTime::parse_from_str("2026-03-01 09:30:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            name: "COFFEE SHOP #42".to_string(),
            merchant: Some("Coffee Shop".to_string()),
            merchant_id: None,
            amount: -4.50,
            category: Some("Food and Drink".to_string()),
            ai_category: None,
            location: Some("Portland, OR".to_string()),
            pending: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_category_precedence() {
        let mut tx = sample_tx();
        assert_eq!(tx.effective_category(), "Food and Drink");

        tx.ai_category = Some("Coffee".to_string());
        assert_eq!(tx.effective_category(), "Coffee");

        tx.ai_category = None;
        tx.category = None;
        assert_eq!(tx.effective_category(), "Uncategorized");
    }

    #[test]
    fn test_search_text_lowercases_and_joins() {
        let tx = sample_tx();
        assert_eq!(tx.search_text(), "coffee shop #42 coffee shop");

        let mut no_merchant = sample_tx();
        no_merchant.merchant = None;
        assert_eq!(no_merchant.search_text(), "coffee shop #42");
    }

    #[test]
    fn test_merchant_key_fallback_order() {
        let mut tx = sample_tx();
        tx.merchant_id = Some("mer_123".to_string());
        assert_eq!(tx.merchant_key(), "mer_123");

        tx.merchant_id = None;
        assert_eq!(tx.merchant_key(), "coffee shop");

        tx.merchant = None;
        assert_eq!(tx.merchant_key(), "coffee shop #42");
    }

    #[test]
    fn test_severity_priority_ordering() {
        assert!(Severity::High.priority() > Severity::Medium.priority());
        assert!(Severity::Medium.priority() > Severity::Low.priority());
    }

    #[test]
    fn test_anomaly_type_round_trip() {
        for t in [
            AnomalyType::SuspiciousPattern,
            AnomalyType::DuplicateCharge,
            AnomalyType::UnusualAmount,
            AnomalyType::NewHighValueMerchant,
            AnomalyType::GeographicAnomaly,
        ] {
            assert_eq!(AnomalyType::from_str(t.as_str()).unwrap(), t);
        }
        assert!(AnomalyType::from_str("bogus").is_err());
    }

    #[test]
    fn test_with_overrides_touches_only_set_fields() {
        let base = DetectionSettings::defaults(1);
        let overrides = DetectionOverrides {
            z_score_threshold: Some(3.0),
            hours_window: Some(48),
            ..Default::default()
        };

        let effective = base.with_overrides(&overrides);
        assert_eq!(effective.z_score_threshold, 3.0);
        assert_eq!(effective.hours_window, 48);
        assert_eq!(effective.min_amount, DetectionSettings::DEFAULT_MIN_AMOUNT);
        assert_eq!(effective.time_window_days, 30);
        assert!(effective.enabled);
    }

    #[test]
    fn test_overrides_is_empty() {
        assert!(DetectionOverrides::default().is_empty());
        let o = DetectionOverrides {
            min_amount: Some(0.0),
            ..Default::default()
        };
        assert!(!o.is_empty());
    }
}
