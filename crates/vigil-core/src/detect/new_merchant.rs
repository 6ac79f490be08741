//! New high-value merchant detector
//!
//! A single pass over the chronological window folds per-merchant state
//! (first-seen date, charge count, cumulative spend), then each merchant's
//! final state is judged once. A merchant qualifies only when the window
//! holds exactly one charge, that first sighting is recent, and the spend
//! clears the configured threshold. Two or more charges make the merchant
//! an established relationship and it can never fire.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use super::engine::Detector;
use super::types::{AnomalyCandidate, DetectionContext, NewMerchantData};
use crate::error::Result;
use crate::models::{AnomalyType, Severity, Transaction};
use crate::patterns::is_allow_listed;

pub struct NewMerchantDetector;

impl NewMerchantDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NewMerchantDetector {
    fn default() -> Self {
        Self::new()
    }
}

struct MerchantState<'a> {
    first_seen: NaiveDateTime,
    first_tx: &'a Transaction,
    count: u32,
    total_spend: f64,
}

impl Detector for NewMerchantDetector {
    fn id(&self) -> AnomalyType {
        AnomalyType::NewHighValueMerchant
    }

    fn name(&self) -> &'static str {
        "New high-value merchant detection"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>> {
        let mut merchants: HashMap<String, MerchantState<'_>> = HashMap::new();

        // ctx.transactions is oldest-first; the fold depends on it
        for tx in ctx.transactions {
            if is_allow_listed(&tx.search_text()) {
                continue;
            }

            let state = merchants
                .entry(tx.merchant_key())
                .or_insert_with(|| MerchantState {
                    first_seen: tx.date,
                    first_tx: tx,
                    count: 0,
                    total_spend: 0.0,
                });
            state.count += 1;
            if tx.amount < 0.0 {
                state.total_spend += tx.amount.abs();
            }
        }

        let cutoff = ctx.now.naive_utc() - Duration::days(7);
        let mut candidates = vec![];

        for state in merchants.values() {
            let single_charge = state.count == 1;
            let recent = state.first_seen >= cutoff;
            if !single_charge || !recent || state.total_spend <= ctx.settings.new_merchant_threshold
            {
                continue;
            }

            let tx = state.first_tx;
            let severity = if state.total_spend > 500.0 {
                Severity::High
            } else {
                Severity::Medium
            };
            let metadata = serde_json::to_value(NewMerchantData {
                merchant: tx.merchant_display().to_string(),
                total_spend: state.total_spend,
            })?;

            candidates.push(
                AnomalyCandidate::new(
                    tx.id,
                    AnomalyType::NewHighValueMerchant,
                    severity,
                    format!(
                        "First-ever charge of ${:.2} at new merchant {}",
                        state.total_spend,
                        tx.merchant_display()
                    ),
                )
                .with_metadata(metadata),
            );
        }

        // HashMap order is arbitrary
        candidates.sort_by_key(|c| c.transaction_id);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectionSettings;
    use chrono::{DateTime, TimeZone, Utc};

    fn tx(id: i64, date: &str, merchant: &str, amount: f64) -> Transaction {
        Transaction {
            id,
            account_id: 1,
            date: NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap(),
            name: merchant.to_string(),
            merchant: Some(merchant.to_string()),
            merchant_id: None,
            amount,
            category: None,
            ai_category: None,
            location: None,
            pending: false,
            created_at: Utc::now(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 12, 12, 0, 0).unwrap()
    }

    fn detect(transactions: &[Transaction]) -> Vec<AnomalyCandidate> {
        let settings = DetectionSettings::defaults(1);
        let ctx = DetectionContext::new(&settings, transactions, fixed_now());
        NewMerchantDetector::new().detect(&ctx).unwrap()
    }

    #[test]
    fn test_large_first_charge_fires_high() {
        let candidates = detect(&[tx(1, "2026-03-10 12:00:00", "Unknown Gift Card Store", -3000.0)]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].transaction_id, 1);
        assert_eq!(candidates[0].severity, Severity::High);
        assert_eq!(candidates[0].metadata["total_spend"], 3000.0);
    }

    #[test]
    fn test_moderate_first_charge_is_medium() {
        let candidates = detect(&[tx(1, "2026-03-10 12:00:00", "New Boutique", -200.0)]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].severity, Severity::Medium);
    }

    #[test]
    fn test_first_charge_below_threshold_ignored() {
        let candidates = detect(&[tx(1, "2026-03-10 12:00:00", "New Boutique", -80.0)]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_stale_first_sighting_ignored() {
        // Large, but first seen well over a week before the run
        let candidates = detect(&[tx(1, "2026-02-20 12:00:00", "New Boutique", -900.0)]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_repeat_merchant_never_fires() {
        // A second charge makes it a relationship, however large either one is
        let candidates = detect(&[
            tx(1, "2026-03-08 12:00:00", "New Boutique", -30.0),
            tx(2, "2026-03-10 12:00:00", "New Boutique", -5000.0),
        ]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_income_does_not_count_as_spend() {
        let candidates = detect(&[tx(1, "2026-03-10 12:00:00", "Acme Rewards", 300.0)]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_allow_listed_transactions_skipped() {
        let candidates = detect(&[tx(1, "2026-03-10 12:00:00", "Direct Deposit Payroll", 5000.0)]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_merchants_tracked_independently() {
        let candidates = detect(&[
            tx(1, "2026-03-08 12:00:00", "Old Favorite", -60.0),
            tx(2, "2026-03-10 12:00:00", "Brand New Shop", -150.0),
        ]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].transaction_id, 2);
    }
}
