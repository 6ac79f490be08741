//! Dismissal rules
//!
//! User-authored suppressions matched against transactions before detection
//! (so dismissed transactions never reach a detector) and again against the
//! persisted set (so older stored anomalies disappear once a rule is added).

use tracing::warn;

use crate::models::{DismissalRule, PatternKind, Transaction};

/// A parsed dismissal rule ready for matching
#[derive(Debug, Clone, PartialEq)]
pub enum DismissalPattern {
    /// Case-insensitive full match on the transaction name
    ExactName(String),
    /// Case-insensitive substring of the merchant, if one is set
    MerchantName(String),
    /// Case-insensitive substring of the effective category
    Category(String),
    /// Inclusive range over the absolute amount
    AmountRange { min: f64, max: f64 },
    /// Substring anywhere in the searchable text
    FreeText(String),
}

impl DismissalPattern {
    /// Parse a stored (pattern_type, pattern) pair
    ///
    /// Returns `None` for patterns that cannot match anything: empty text,
    /// or an amount range that does not parse as `min-max` with min <= max.
    /// An unrecognized pattern_type falls back to free-text matching.
    pub fn parse(pattern_type: &str, pattern: &str) -> Option<DismissalPattern> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        let lowered = pattern.to_lowercase();
        match pattern_type.parse::<PatternKind>() {
            Ok(PatternKind::ExactName) => Some(DismissalPattern::ExactName(lowered)),
            Ok(PatternKind::MerchantName) => Some(DismissalPattern::MerchantName(lowered)),
            Ok(PatternKind::Category) => Some(DismissalPattern::Category(lowered)),
            Ok(PatternKind::AmountRange) => {
                let (min_s, max_s) = pattern.split_once('-')?;
                let min: f64 = min_s.trim().parse().ok()?;
                let max: f64 = max_s.trim().parse().ok()?;
                if min > max {
                    return None;
                }
                Some(DismissalPattern::AmountRange { min, max })
            }
            Ok(PatternKind::FreeText) | Err(_) => Some(DismissalPattern::FreeText(lowered)),
        }
    }

    /// Whether this rule dismisses the given transaction
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            DismissalPattern::ExactName(name) => tx.name.to_lowercase() == *name,
            DismissalPattern::MerchantName(needle) => tx
                .merchant
                .as_deref()
                .map(|m| m.to_lowercase().contains(needle))
                .unwrap_or(false),
            DismissalPattern::Category(needle) => {
                tx.effective_category().to_lowercase().contains(needle)
            }
            DismissalPattern::AmountRange { min, max } => {
                let amount = tx.amount.abs();
                amount >= *min && amount <= *max
            }
            DismissalPattern::FreeText(needle) => tx.search_text().contains(needle.as_str()),
        }
    }
}

/// All of a user's dismissal rules, parsed once per detection run
pub struct RuleFilter {
    patterns: Vec<DismissalPattern>,
}

impl RuleFilter {
    /// Build a filter from stored rules, skipping any that fail to parse
    pub fn new(rules: &[DismissalRule]) -> RuleFilter {
        let mut patterns = Vec::with_capacity(rules.len());
        for rule in rules {
            match DismissalPattern::parse(&rule.pattern_type, &rule.pattern) {
                Some(p) => patterns.push(p),
                None => {
                    warn!(
                        "Skipping malformed dismissal rule {} ({}: '{}')",
                        rule.id, rule.pattern_type, rule.pattern
                    );
                }
            }
        }
        RuleFilter { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if any rule matches; rules combine with OR
    pub fn is_dismissed(&self, tx: &Transaction) -> bool {
        self.patterns.iter().any(|p| p.matches(tx))
    }

    /// Drop every transaction a rule dismisses
    pub fn filter_transactions(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        if self.patterns.is_empty() {
            return transactions;
        }
        transactions
            .into_iter()
            .filter(|tx| !self.is_dismissed(tx))
            .collect()
    }
}
