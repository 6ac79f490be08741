//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `accounts` - Account commands (list, add)
//! - `anomalies` - Anomaly review commands (list, hide, resolve)
//! - `core` - Core commands (init, detect) and shared utilities (open_db)
//! - `rules` - Dismissal rule commands (list, add, delete)
//! - `settings` - Detection settings commands (show, set)
//! - `status` - Status command (encryption, size, row counts)
//! - `transactions` - Transaction commands (list, add)

pub mod accounts;
pub mod anomalies;
pub mod core;
pub mod rules;
pub mod settings;
pub mod status;
pub mod transactions;

// Re-export command functions for main.rs
pub use accounts::*;
pub use anomalies::*;
pub use core::*;
pub use rules::*;
pub use settings::*;
pub use status::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
