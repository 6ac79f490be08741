//! Vigil Core Library
//!
//! Shared functionality for the Vigil transaction anomaly detection tool:
//! - Database access and migrations (encrypted SQLite)
//! - The anomaly detection engine and its five detectors
//! - Static suspicious/allow-list/chain-store pattern libraries
//! - User-authored dismissal rules for suppressing false positives
//! - Per-user detection settings with create-on-first-read defaults

pub mod db;
pub mod detect;
pub mod error;
pub mod models;
pub mod patterns;
pub mod rules;

pub use db::Database;
pub use detect::{AnomalyCandidate, DetectionEngine, DetectionReport};
pub use error::{Error, Result};
pub use models::{
    Account, AccountType, Anomaly, AnomalyType, DetectionOverrides, DetectionSettings,
    DismissalRule, NewTransaction, PatternKind, Severity, Transaction,
};
pub use rules::{DismissalPattern, RuleFilter};
