//! Anomaly Detection Engine
//!
//! Five independent detectors scan the same rule-filtered transaction
//! window and emit candidates; the engine persists each finding exactly
//! once per (settings, transaction, type) and returns the active set.
//!
//! ## Detectors
//!
//! - **Suspicious pattern** - transaction text matches known scam/fraud language
//! - **Duplicate charge** - same merchant and amount posted twice within the hour window
//! - **Unusual amount** - statistically large charge for its category
//! - **New high-value merchant** - large first-ever charge from an unknown merchant
//! - **Geographic anomaly** - same merchant charging from two places implausibly fast
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vigil_core::detect::DetectionEngine;
//!
//! let engine = DetectionEngine::new();
//! let report = engine.run(&db, user_id, &overrides, false)?;
//! ```

pub mod duplicates;
pub mod engine;
pub mod geographic;
pub mod new_merchant;
pub mod outliers;
pub mod suspicious;
pub mod types;

pub use duplicates::DuplicateChargeDetector;
pub use engine::{sort_anomalies, DetectionEngine, DetectionReport, Detector};
pub use geographic::GeographicAnomalyDetector;
pub use new_merchant::NewMerchantDetector;
pub use outliers::UnusualAmountDetector;
pub use suspicious::SuspiciousPatternDetector;
pub use types::{
    AnomalyCandidate, DetectionContext, DuplicateChargeData, GeographicData, NewMerchantData,
    SuspiciousMatchData, UnusualAmountData,
};
