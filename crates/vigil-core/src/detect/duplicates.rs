//! Duplicate-charge detector
//!
//! Groups transactions by merchant identity plus amount-to-the-cent, then
//! looks for group members posted within the configured hour window of each
//! other. Every transaction in a cluster gets its own candidate so the user
//! sees each posting flagged.

use std::collections::HashMap;

use chrono::{Datelike, Duration};

use super::engine::Detector;
use super::types::{AnomalyCandidate, DetectionContext, DuplicateChargeData};
use crate::error::Result;
use crate::models::{AnomalyType, Severity, Transaction};
use crate::patterns::is_allow_listed;

pub struct DuplicateChargeDetector;

impl DuplicateChargeDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DuplicateChargeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly two charges, both in the first five days of their months, is the
/// classic billing-cycle coincidence (subscription billed on the 1st-5th)
fn looks_like_billing_cycle(cluster: &[&Transaction]) -> bool {
    cluster.len() == 2 && cluster.iter().all(|t| t.date.day() <= 5)
}

impl Detector for DuplicateChargeDetector {
    fn id(&self) -> AnomalyType {
        AnomalyType::DuplicateCharge
    }

    fn name(&self) -> &'static str {
        "Duplicate charge detection"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>> {
        let window = Duration::hours(ctx.settings.hours_window);

        // Merchant identity + amount rounded to the cent
        let mut groups: HashMap<(String, i64), Vec<&Transaction>> = HashMap::new();
        for tx in ctx.transactions {
            if is_allow_listed(&tx.search_text()) {
                continue;
            }
            let cents = (tx.amount.abs() * 100.0).round() as i64;
            groups.entry((tx.merchant_key(), cents)).or_default().push(tx);
        }

        let mut candidates = vec![];
        for members in groups.values() {
            if members.len() < 2 {
                continue;
            }

            for anchor in members {
                // Cluster around this posting; the window is inclusive
                let mut cluster: Vec<&Transaction> = members
                    .iter()
                    .filter(|m| (m.date - anchor.date).abs() <= window)
                    .copied()
                    .collect();
                if cluster.len() < 2 {
                    continue;
                }
                if looks_like_billing_cycle(&cluster) {
                    continue;
                }

                cluster.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
                let span = cluster[cluster.len() - 1].date - cluster[0].date;
                let span_hours = span.num_minutes() as f64 / 60.0;

                let metadata = serde_json::to_value(DuplicateChargeData {
                    amount: anchor.amount.abs(),
                    merchant: anchor.merchant_display().to_string(),
                    cluster: cluster.iter().map(|t| t.id).collect(),
                    span_hours,
                })?;

                candidates.push(
                    AnomalyCandidate::new(
                        anchor.id,
                        AnomalyType::DuplicateCharge,
                        Severity::High,
                        format!(
                            "Possible duplicate: {} charges of ${:.2} at {} within {} hours",
                            cluster.len(),
                            anchor.amount.abs(),
                            anchor.merchant_display(),
                            ctx.settings.hours_window
                        ),
                    )
                    .with_metadata(metadata),
                );
            }
        }

        Ok(candidates)
    }
}
