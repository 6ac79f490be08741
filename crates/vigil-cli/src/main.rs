//! Vigil CLI - Transaction anomaly detection
//!
//! Usage:
//!   vigil init                  Initialize database
//!   vigil transactions add      Record a transaction
//!   vigil detect                Run anomaly detection
//!   vigil anomalies             Review findings

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vigil_core::models::DetectionOverrides;

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(cli.db.as_deref(), cli.no_encrypt),
        Commands::Status => commands::cmd_status(cli.db.as_deref(), cli.user, cli.no_encrypt),
        Commands::Accounts { action } => {
            let db = commands::open_db(cli.db.as_deref(), cli.no_encrypt)?;
            match action {
                None | Some(AccountsAction::List) => commands::cmd_accounts_list(&db, cli.user),
                Some(AccountsAction::Add {
                    name,
                    account_type,
                    institution,
                }) => commands::cmd_accounts_add(
                    &db,
                    cli.user,
                    &name,
                    account_type.as_deref(),
                    institution.as_deref(),
                ),
            }
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(cli.db.as_deref(), cli.no_encrypt)?;
            match action {
                None | Some(TransactionsAction::List { limit: 20 }) => {
                    commands::cmd_transactions_list(&db, cli.user, 20)
                }
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&db, cli.user, limit)
                }
                Some(TransactionsAction::Add {
                    account,
                    name,
                    amount,
                    merchant,
                    date,
                    category,
                    location,
                }) => commands::cmd_transactions_add(
                    &db,
                    cli.user,
                    account,
                    &name,
                    merchant.as_deref(),
                    amount,
                    date.as_deref(),
                    category.as_deref(),
                    location.as_deref(),
                ),
            }
        }
        Commands::Detect {
            days,
            min_amount,
            max_amount,
            z_threshold,
            new_merchant_threshold,
            geographic_threshold,
            hours_window,
            include_hidden,
            json,
        } => {
            let db = commands::open_db(cli.db.as_deref(), cli.no_encrypt)?;
            let overrides = DetectionOverrides {
                min_amount,
                max_amount,
                time_window_days: days,
                z_score_threshold: z_threshold,
                new_merchant_threshold,
                geographic_threshold,
                hours_window,
                ..Default::default()
            };
            commands::cmd_detect(&db, cli.user, &overrides, include_hidden, json)
        }
        Commands::Anomalies { action } => {
            let db = commands::open_db(cli.db.as_deref(), cli.no_encrypt)?;
            match action {
                None
                | Some(AnomaliesAction::List {
                    include_hidden: false,
                }) => commands::cmd_anomalies_list(&db, cli.user, false),
                Some(AnomaliesAction::List { include_hidden }) => {
                    commands::cmd_anomalies_list(&db, cli.user, include_hidden)
                }
                Some(AnomaliesAction::Hide { id }) => commands::cmd_anomalies_hide(&db, id),
                Some(AnomaliesAction::Resolve { id }) => commands::cmd_anomalies_resolve(&db, id),
            }
        }
        Commands::Rules { action } => {
            let db = commands::open_db(cli.db.as_deref(), cli.no_encrypt)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&db, cli.user),
                Some(RulesAction::Add {
                    pattern_type,
                    pattern,
                }) => commands::cmd_rules_add(&db, cli.user, &pattern_type, &pattern),
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&db, cli.user, id),
            }
        }
        Commands::Settings { action } => {
            let db = commands::open_db(cli.db.as_deref(), cli.no_encrypt)?;
            match action {
                None | Some(SettingsAction::Show) => commands::cmd_settings_show(&db, cli.user),
                Some(SettingsAction::Set {
                    enabled,
                    min_amount,
                    max_amount,
                    days,
                    z_threshold,
                    new_merchant_threshold,
                    geographic_threshold,
                    hours_window,
                    notify_in_app,
                    notify_email,
                }) => {
                    let overrides = DetectionOverrides {
                        enabled,
                        min_amount,
                        max_amount,
                        time_window_days: days,
                        z_score_threshold: z_threshold,
                        new_merchant_threshold,
                        geographic_threshold,
                        hours_window,
                        notify_in_app,
                        notify_email,
                    };
                    commands::cmd_settings_set(&db, cli.user, &overrides)
                }
            }
        }
    }
}
