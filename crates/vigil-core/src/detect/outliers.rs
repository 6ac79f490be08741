//! Statistical outlier detector
//!
//! Scores each charge against the user's own history in the same category.
//! Categories with fewer than 3 transactions are skipped as an insufficient
//! sample.

use std::collections::HashMap;

use super::engine::Detector;
use super::types::{AnomalyCandidate, DetectionContext, UnusualAmountData};
use crate::error::Result;
use crate::models::{AnomalyType, Severity, Transaction};
use crate::patterns::is_allow_listed;

pub struct UnusualAmountDetector;

impl UnusualAmountDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnusualAmountDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

impl Detector for UnusualAmountDetector {
    fn id(&self) -> AnomalyType {
        AnomalyType::UnusualAmount
    }

    fn name(&self) -> &'static str {
        "Statistical outlier detection"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>> {
        let mut groups: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for tx in ctx.transactions {
            if is_allow_listed(&tx.search_text()) {
                continue;
            }
            groups.entry(tx.effective_category()).or_default().push(tx);
        }

        let mut candidates = vec![];
        for (category, members) in &groups {
            if members.len() < 3 {
                continue;
            }

            let amounts: Vec<f64> = members.iter().map(|t| t.amount.abs()).collect();
            let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;

            // Spread is the median absolute deviation about the mean, so a
            // single wild charge among otherwise-steady spending still
            // scores high instead of inflating its own baseline
            let mut deviations: Vec<f64> = amounts.iter().map(|a| (a - mean).abs()).collect();
            let spread = median(&mut deviations);
            if spread < 0.001 {
                // All amounts effectively identical: no outlier possible
                continue;
            }

            for (tx, amount) in members.iter().zip(&amounts) {
                let z = (amount - mean) / spread;
                if z <= ctx.settings.z_score_threshold {
                    continue;
                }

                let severity = if z > 3.5 {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let z_rounded = (z * 10.0).round() / 10.0;
                let metadata = serde_json::to_value(UnusualAmountData {
                    category: category.to_string(),
                    amount: *amount,
                    category_mean: mean,
                    z_score: z_rounded,
                })?;

                candidates.push(
                    AnomalyCandidate::new(
                        tx.id,
                        AnomalyType::UnusualAmount,
                        severity,
                        format!(
                            "Unusual amount for {}: ${:.2} is {:.1}x the category average of ${:.2}",
                            category,
                            amount,
                            amount / mean,
                            mean
                        ),
                    )
                    .with_metadata(metadata),
                );
            }
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectionSettings;
    use chrono::{NaiveDateTime, Utc};

    fn tx(id: i64, amount: f64, category: &str) -> Transaction {
        Transaction {
            id,
            account_id: 1,
            date: NaiveDateTime::parse_from_str("2026-03-10 12:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            name: format!("Store {}", id),
            merchant: None,
            merchant_id: None,
            amount: -amount,
            category: Some(category.to_string()),
            ai_category: None,
            location: None,
            pending: false,
            created_at: Utc::now(),
        }
    }

    fn detect(transactions: &[Transaction]) -> Vec<AnomalyCandidate> {
        let settings = DetectionSettings::defaults(1);
        let ctx = DetectionContext::new(&settings, transactions, Utc::now());
        UnusualAmountDetector::new().detect(&ctx).unwrap()
    }

    #[test]
    fn test_lone_outlier_fires_at_default_threshold() {
        let candidates = detect(&[
            tx(1, 10.0, "Shopping"),
            tx(2, 10.0, "Shopping"),
            tx(3, 10.0, "Shopping"),
            tx(4, 100.0, "Shopping"),
        ]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].transaction_id, 4);
        assert_eq!(candidates[0].severity, Severity::Medium);
        assert_eq!(candidates[0].metadata["z_score"], 3.0);
        assert_eq!(candidates[0].metadata["category"], "Shopping");
        assert_eq!(candidates[0].metadata["category_mean"], 32.5);
    }

    #[test]
    fn test_identical_amounts_produce_no_candidates() {
        let candidates = detect(&[
            tx(1, 50.0, "Food"),
            tx(2, 50.0, "Food"),
            tx(3, 50.0, "Food"),
        ]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_small_samples_are_skipped() {
        let candidates = detect(&[tx(1, 10.0, "Travel"), tx(2, 5000.0, "Travel")]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_extreme_outlier_is_high_severity() {
        // mean 48, spread 38, z(200) = 4.0
        let candidates = detect(&[
            tx(1, 10.0, "Shopping"),
            tx(2, 10.0, "Shopping"),
            tx(3, 10.0, "Shopping"),
            tx(4, 10.0, "Shopping"),
            tx(5, 200.0, "Shopping"),
        ]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].severity, Severity::High);
        assert_eq!(candidates[0].metadata["z_score"], 4.0);
    }

    #[test]
    fn test_categories_do_not_contaminate_each_other() {
        // The $500 travel charge is alone in its category
        let candidates = detect(&[
            tx(1, 20.0, "Food"),
            tx(2, 20.0, "Food"),
            tx(3, 20.0, "Food"),
            tx(4, 500.0, "Travel"),
        ]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_ai_category_overrides_provider_category() {
        let mut reassigned = tx(4, 100.0, "Shopping");
        reassigned.ai_category = Some("Electronics".to_string());

        // Without the override this would be the [10,10,10,100] fixture;
        // with it, Shopping has 3 identical members and Electronics has 1
        let candidates = detect(&[
            tx(1, 10.0, "Shopping"),
            tx(2, 10.0, "Shopping"),
            tx(3, 10.0, "Shopping"),
            reassigned,
        ]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_allow_listed_transactions_excluded_from_stats() {
        let mut mortgage = tx(4, 4000.0, "Housing");
        mortgage.name = "Mortgage Payment".to_string();

        let candidates = detect(&[
            tx(1, 40.0, "Housing"),
            tx(2, 40.0, "Housing"),
            tx(3, 40.0, "Housing"),
            mortgage,
        ]);
        assert!(candidates.is_empty());
    }
}
