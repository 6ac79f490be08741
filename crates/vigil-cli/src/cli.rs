//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vigil - Transaction anomaly detection
#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Transaction anomaly detection for personal finances", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// User whose data the command operates on
    #[arg(long, default_value = "1", global = true)]
    pub user: i64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set VIGIL_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Show database status (encryption, size, counts)
    Status,

    /// Manage accounts (list, add)
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Manage transactions (list, add)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Run anomaly detection over the recent transaction window
    Detect {
        /// Lookback window in days (overrides stored settings)
        #[arg(long)]
        days: Option<i64>,

        /// Minimum transaction amount to consider
        #[arg(long)]
        min_amount: Option<f64>,

        /// Maximum transaction amount to consider
        #[arg(long)]
        max_amount: Option<f64>,

        /// Z-score threshold for unusual-amount detection
        #[arg(long)]
        z_threshold: Option<f64>,

        /// Cumulative-spend threshold for new-merchant detection
        #[arg(long)]
        new_merchant_threshold: Option<f64>,

        /// Amount significance threshold for geographic detection
        #[arg(long)]
        geographic_threshold: Option<f64>,

        /// Hour window for duplicate and geographic detection
        #[arg(long)]
        hours_window: Option<i64>,

        /// Include hidden anomalies in the report
        #[arg(long)]
        include_hidden: bool,

        /// Print the report as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Review detected anomalies (list, hide, resolve)
    Anomalies {
        #[command(subcommand)]
        action: Option<AnomaliesAction>,
    },

    /// Manage dismissal rules (list, add, delete)
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Show or change detection settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List accounts
    List,

    /// Add an account
    Add {
        /// Account name
        name: String,

        /// Account type: checking, savings, credit
        #[arg(long, short = 't')]
        account_type: Option<String>,

        /// Institution name
        #[arg(long)]
        institution: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Record a transaction
    Add {
        /// Account ID the transaction belongs to
        #[arg(long)]
        account: i64,

        /// Transaction name as the statement shows it
        #[arg(long)]
        name: String,

        /// Amount; negative for expenses, positive for income
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,

        /// Cleaned merchant name
        #[arg(long)]
        merchant: Option<String>,

        /// Posting date: YYYY-MM-DD or "YYYY-MM-DD HH:MM" (defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Category (e.g. "Food and Drink")
        #[arg(long)]
        category: Option<String>,

        /// Location (e.g. "Portland, OR")
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AnomaliesAction {
    /// List active anomalies
    List {
        /// Include hidden anomalies
        #[arg(long)]
        include_hidden: bool,
    },

    /// Hide an anomaly (kept in the database, excluded from default listings)
    Hide {
        /// Anomaly ID
        id: i64,
    },

    /// Mark an anomaly as resolved
    Resolve {
        /// Anomaly ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List dismissal rules
    List,

    /// Add a dismissal rule
    Add {
        /// Rule kind: exact_name, merchant_name, category, amount_range, free_text
        pattern_type: String,

        /// Pattern text; amount_range uses "MIN-MAX" (e.g. "40-60")
        pattern: String,
    },

    /// Delete a dismissal rule
    Delete {
        /// Rule ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the stored detection settings
    Show,

    /// Update stored detection settings
    Set {
        /// Enable or disable detection for this user
        #[arg(long)]
        enabled: Option<bool>,

        /// Minimum transaction amount to consider
        #[arg(long)]
        min_amount: Option<f64>,

        /// Maximum transaction amount to consider
        #[arg(long)]
        max_amount: Option<f64>,

        /// Lookback window in days
        #[arg(long)]
        days: Option<i64>,

        /// Z-score threshold for unusual-amount detection
        #[arg(long)]
        z_threshold: Option<f64>,

        /// Cumulative-spend threshold for new-merchant detection
        #[arg(long)]
        new_merchant_threshold: Option<f64>,

        /// Amount significance threshold for geographic detection
        #[arg(long)]
        geographic_threshold: Option<f64>,

        /// Hour window for duplicate and geographic detection
        #[arg(long)]
        hours_window: Option<i64>,

        /// Surface anomalies in the app
        #[arg(long)]
        notify_in_app: Option<bool>,

        /// Send anomaly notifications by email
        #[arg(long)]
        notify_email: Option<bool>,
    },
}
