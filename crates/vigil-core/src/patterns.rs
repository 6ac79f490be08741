//! Static pattern libraries for the detector pipeline
//!
//! Three immutable, compiled-once libraries:
//! - suspicious patterns: scam/fraud text, matched against every transaction
//! - legitimate allow-list: known-good transaction text, checked before any
//!   detector and always winning
//! - chain stores: nationwide brands exempt from the geographic detector
//!
//! All matching is against lowercased text; the patterns are written in
//! lowercase accordingly.

use std::sync::OnceLock;

use regex::Regex;

/// A suspicious-activity pattern with its human label
///
/// The label is used verbatim as the anomaly reason.
pub struct SuspiciousPattern {
    pub label: &'static str,
    pub regex: Regex,
}

fn re(pattern: &str) -> Regex {
    // Library patterns are literals; a failed compile is a programmer error
    Regex::new(pattern).expect("static pattern")
}

/// Ordered suspicious-activity patterns; matching is match-ALL, one
/// candidate per matching entry
pub fn suspicious_patterns() -> &'static [SuspiciousPattern] {
    static PATTERNS: OnceLock<Vec<SuspiciousPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            SuspiciousPattern {
                label: "Possible tech support scam",
                regex: re(
                    r"(microsoft|apple|windows|amazon|norton|mcafee)\s+(tech\s+)?support|tech\s*support|remote\s+(access|support)|teamviewer|anydesk",
                ),
            },
            SuspiciousPattern {
                label: "Account verification phishing attempt",
                regex: re(
                    r"verify\s+(your\s+)?account|account\s+(verification|suspended|suspension|locked)|confirm\s+(your\s+)?identity",
                ),
            },
            SuspiciousPattern {
                label: "Possible refund scam",
                regex: re(r"refund\s+(processing|department|dept|agent|center)"),
            },
            SuspiciousPattern {
                label: "Gift card purchase",
                regex: re(
                    r"(buy|buying|purchase|purchased|bought)\s+(a\s+)?gift\s?card|e-?gift\s?card\b|gift\s?card\s+(purchase|order|activation)",
                ),
            },
            SuspiciousPattern {
                label: "Cryptocurrency purchase",
                regex: re(r"\bbitcoin\b|btc\s+atm|\bcrypto\b|cryptocurrency|coinbase|binance|\bkraken\b"),
            },
            SuspiciousPattern {
                label: "Money transfer service",
                regex: re(r"western\s+union|moneygram|\bremitly\b|money\s+transfer\s+service"),
            },
            SuspiciousPattern {
                label: "Peer-to-peer payment request",
                regex: re(
                    r"(cash\s?app|venmo|zelle|paypal)\s+request|request\s+(via|from)\s+(cash\s?app|venmo|zelle)|payment\s+request",
                ),
            },
            SuspiciousPattern {
                label: "Free trial or auto-renewal charge",
                regex: re(
                    r"free\s+trial|trial\s+(ending|expiring|conversion)|subscription\s+renewal|auto-?renew(al)?\b",
                ),
            },
            SuspiciousPattern {
                label: "Retail gift card purchase",
                regex: re(
                    r"(walmart|target|best\s?buy|amazon|cvs|walgreens|kroger|safeway)[\w\s#.]*gift\s?card|gift\s?card[\w\s#.]*(walmart|target|best\s?buy|amazon)",
                ),
            },
            SuspiciousPattern {
                label: "Prepaid card reload",
                regex: re(
                    r"prepaid\s+(card|debit|visa|mastercard)|\breload\b|top\s?-?\s?up\b|green\s?dot|netspend|vanilla\s+(visa|gift)",
                ),
            },
        ]
    })
}

/// Known-legitimate transaction text; a match exempts the transaction from
/// every detector
///
/// The refund entry is end-anchored on purpose: "amazon refund" is a bank
/// posting, "refund processing department" is scam bait.
fn allow_list() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            re(r"direct\s+dep(osit)?|payroll|salary|paycheck"),
            re(r"payment\s+(thank\s+you|received)|autopay|auto-?pay\b|bill\s+pay(ment)?|card\s+payment"),
            re(r"\batm\b|cash\s+deposit|check\s+deposit|mobile\s+deposit|\bdeposit\b"),
            re(r"(online|account|internal|external|balance)\s+transfer|transfer\s+(to|from)|\bxfer\b"),
            re(r"\brefund$|refund\s+issued|\breversal\b|return\s+credit|cash\s?back"),
            re(r"loan\s+payment|mortgage\s+(payment|pymt)|student\s+loan|auto\s+loan"),
            re(r"utility\s+payment|(electric|gas|water|sewer|power|energy)\s+(bill|company|co\b|payment)|internet\s+(bill|service)"),
            re(r"insurance\s+(premium|payment|pymt)"),
            re(r"dividend|interest\s+(payment|earned|paid)|\bbrokerage\b|vanguard|fidelity|schwab|401k|ira\s+contribution"),
            re(r"\birs\b|tax\s+(payment|refund|pymt)|\btreasury\b|\bdmv\b|federal\s+payment|state\s+of\s+\w+"),
            re(r"(zelle|venmo|cash\s?app|paypal)\s+(payment\s+)?from|received\s+from"),
        ]
    })
}

/// Whether lowercased transaction text matches the legitimate allow-list
pub fn is_allow_listed(search: &str) -> bool {
    allow_list().iter().any(|p| p.is_match(search))
}

/// Nationwide brands where a location change between charges is ordinary
pub fn chain_stores() -> &'static [&'static str] {
    &[
        "starbucks",
        "mcdonald",
        "burger king",
        "subway",
        "chipotle",
        "panera",
        "dunkin",
        "walmart",
        "target",
        "costco",
        "kroger",
        "safeway",
        "whole foods",
        "trader joe",
        "aldi",
        "walgreens",
        "cvs",
        "7-eleven",
        "shell",
        "chevron",
        "exxon",
        "home depot",
        "lowes",
        "best buy",
        "amazon",
        "uber",
        "lyft",
        "doordash",
        "grubhub",
    ]
}

/// Whether a lowercased merchant name belongs to a known chain
pub fn is_chain_store(merchant: &str) -> bool {
    chain_stores().iter().any(|c| merchant.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching_labels(search: &str) -> Vec<&'static str> {
        suspicious_patterns()
            .iter()
            .filter(|p| p.regex.is_match(search))
            .map(|p| p.label)
            .collect()
    }

    #[test]
    fn test_allow_list_covers_common_legitimate_text() {
        for text in [
            "zelle payment from friend",
            "direct deposit payroll acme inc",
            "atm withdrawal main st",
            "online transfer to savings",
            "amazon refund",
            "mortgage payment wells fargo",
            "vanguard dividend reinvest",
            "irs treas 310 tax refund",
        ] {
            assert!(is_allow_listed(text), "expected allow-list hit: {}", text);
        }
    }

    #[test]
    fn test_allow_list_rejects_ordinary_merchants() {
        for text in [
            "coffee shop #42",
            "unknown gift card store",
            "acme corp invoice 991",
        ] {
            assert!(!is_allow_listed(text), "unexpected allow-list hit: {}", text);
        }
    }

    #[test]
    fn test_refund_scam_not_swallowed_by_refund_allow_entry() {
        let scam = "refund processing department call now";
        assert!(!is_allow_listed(scam));
        assert_eq!(matching_labels(scam), vec!["Possible refund scam"]);
    }

    #[test]
    fn test_tech_support_scam_matches() {
        assert_eq!(
            matching_labels("apple support 800-275-2273"),
            vec!["Possible tech support scam"]
        );
        assert_eq!(
            matching_labels("anydesk remote access fee"),
            vec!["Possible tech support scam"]
        );
    }

    #[test]
    fn test_gift_card_requires_purchase_phrasing_or_brand() {
        // A store whose name merely contains the words is not a match
        assert!(matching_labels("unknown gift card store").is_empty());

        assert_eq!(
            matching_labels("purchase gift card online"),
            vec!["Gift card purchase"]
        );
        assert_eq!(
            matching_labels("walmart gift card 25.00"),
            vec!["Retail gift card purchase"]
        );
        assert_eq!(matching_labels("egift card order"), vec!["Gift card purchase"]);
    }

    #[test]
    fn test_multiple_patterns_can_match_one_text() {
        let labels = matching_labels("coinbase bitcoin purchase");
        assert_eq!(labels, vec!["Cryptocurrency purchase"]);

        let labels = matching_labels("venmo request bitcoin");
        assert!(labels.contains(&"Cryptocurrency purchase"));
        assert!(labels.contains(&"Peer-to-peer payment request"));
    }

    #[test]
    fn test_prepaid_and_trial_patterns() {
        assert_eq!(
            matching_labels("greendot reload pack"),
            vec!["Prepaid card reload"]
        );
        assert_eq!(
            matching_labels("subscription renewal svc"),
            vec!["Free trial or auto-renewal charge"]
        );
    }

    #[test]
    fn test_chain_store_containment() {
        assert!(is_chain_store("starbucks #1234"));
        assert!(is_chain_store("mcdonald's f26723"));
        assert!(is_chain_store("shell oil 5744"));
        assert!(!is_chain_store("joe's diner"));
        assert!(!is_chain_store("corner bistro"));
    }
}
