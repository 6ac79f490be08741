//! Suspicious-pattern detector
//!
//! Matches transaction text against the static scam/fraud pattern library.
//! The legitimate allow-list is checked first and always wins, so payroll,
//! transfers and the like are never flagged no matter what else they
//! happen to contain.

use super::engine::Detector;
use super::types::{AnomalyCandidate, DetectionContext, SuspiciousMatchData};
use crate::error::Result;
use crate::models::{AnomalyType, Severity};
use crate::patterns::{is_allow_listed, suspicious_patterns};

pub struct SuspiciousPatternDetector;

impl SuspiciousPatternDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SuspiciousPatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SuspiciousPatternDetector {
    fn id(&self) -> AnomalyType {
        AnomalyType::SuspiciousPattern
    }

    fn name(&self) -> &'static str {
        "Suspicious pattern matching"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>> {
        let mut candidates = vec![];

        for tx in ctx.transactions {
            let search = tx.search_text();
            if is_allow_listed(&search) {
                continue;
            }

            // Match-all: one transaction can trip several patterns and each
            // concern is reported separately
            for pattern in suspicious_patterns() {
                if pattern.regex.is_match(&search) {
                    let metadata = serde_json::to_value(SuspiciousMatchData {
                        pattern: pattern.label.to_string(),
                    })?;
                    candidates.push(
                        AnomalyCandidate::new(
                            tx.id,
                            AnomalyType::SuspiciousPattern,
                            Severity::High,
                            pattern.label,
                        )
                        .with_metadata(metadata),
                    );
                }
            }
        }

        Ok(candidates)
    }
}
