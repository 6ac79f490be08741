//! Geographic anomaly detector
//!
//! Flags the same merchant charging from two different locations faster
//! than a person plausibly travels. Nationwide chains are exempt since
//! their locations legitimately differ, and unknown locations never
//! participate in a comparison.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use super::engine::Detector;
use super::types::{AnomalyCandidate, DetectionContext, GeographicData};
use crate::error::Result;
use crate::models::{AnomalyType, Severity, Transaction};
use crate::patterns::{is_allow_listed, is_chain_store};

/// Charges at or below this are ignored regardless of settings
const MIN_SIGNIFICANT_AMOUNT: f64 = 50.0;

pub struct GeographicAnomalyDetector;

impl GeographicAnomalyDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GeographicAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

struct LocationState {
    last_location: Option<String>,
    last_date: NaiveDateTime,
}

/// Normalized location, or `None` for missing/placeholder values
fn known_location(tx: &Transaction) -> Option<String> {
    let loc = tx.location.as_deref()?.trim();
    if loc.is_empty() || loc.eq_ignore_ascii_case("unknown") {
        return None;
    }
    Some(loc.to_string())
}

impl Detector for GeographicAnomalyDetector {
    fn id(&self) -> AnomalyType {
        AnomalyType::GeographicAnomaly
    }

    fn name(&self) -> &'static str {
        "Geographic anomaly detection"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<AnomalyCandidate>> {
        let window = Duration::hours(ctx.settings.hours_window);
        let mut merchants: HashMap<String, LocationState> = HashMap::new();
        let mut candidates = vec![];

        // ctx.transactions is oldest-first; the fold depends on it
        for tx in ctx.transactions {
            if is_allow_listed(&tx.search_text()) {
                continue;
            }
            if is_chain_store(&tx.merchant_display().to_lowercase()) {
                continue;
            }

            let location = known_location(tx);

            if let Some(state) = merchants.get_mut(&tx.merchant_key()) {
                if let (Some(prev), Some(cur)) = (&state.last_location, &location) {
                    let elapsed = tx.date - state.last_date;
                    if !prev.eq_ignore_ascii_case(cur)
                        && elapsed <= window
                        && tx.amount.abs() > MIN_SIGNIFICANT_AMOUNT
                    {
                        let hours = elapsed.num_minutes() as f64 / 60.0;
                        let metadata = serde_json::to_value(GeographicData {
                            merchant: tx.merchant_display().to_string(),
                            previous_location: prev.clone(),
                            location: cur.clone(),
                            hours_apart: (hours * 10.0).round() / 10.0,
                        })?;

                        candidates.push(
                            AnomalyCandidate::new(
                                tx.id,
                                AnomalyType::GeographicAnomaly,
                                Severity::Medium,
                                format!(
                                    "{}: charge in {} followed by {} {:.0} hours later",
                                    tx.merchant_display(),
                                    prev,
                                    cur,
                                    hours.round()
                                ),
                            )
                            .with_metadata(metadata),
                        );
                    }
                }
                state.last_location = location;
                state.last_date = tx.date;
            } else {
                merchants.insert(
                    tx.merchant_key(),
                    LocationState {
                        last_location: location,
                        last_date: tx.date,
                    },
                );
            }
        }

        Ok(candidates)
    }
}
