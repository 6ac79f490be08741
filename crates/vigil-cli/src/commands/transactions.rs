//! Transaction command implementations (list, add)

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use vigil_core::db::Database;
use vigil_core::models::NewTransaction;

use super::truncate;

/// Parse the --date flag: YYYY-MM-DD or "YYYY-MM-DD HH:MM", defaulting to now
pub fn parse_date_arg(date: Option<&str>) -> Result<NaiveDateTime> {
    let Some(date) = date else {
        return Ok(Utc::now().naive_utc());
    };

    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .context("Invalid --date format (use YYYY-MM-DD or \"YYYY-MM-DD HH:MM\")")?;
    Ok(day.and_time(NaiveTime::MIN))
}

pub fn cmd_transactions_list(db: &Database, user_id: i64, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(user_id, limit)?;

    if transactions.is_empty() {
        println!("No transactions found. Record one with:");
        println!("  vigil transactions add --account 1 --name \"Coffee\" --amount -4.50");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let amount_str = if tx.amount < 0.0 {
            format!("\x1b[31m${:.2}\x1b[0m", tx.amount.abs()) // Red for expenses
        } else {
            format!("\x1b[32m+${:.2}\x1b[0m", tx.amount) // Green for income
        };

        let category = tx.effective_category();
        let category_str = if category == "Uncategorized" {
            String::new()
        } else {
            format!(" │ {}", category)
        };

        println!(
            "   [{}] {} │ {:>10} │ {}{}",
            tx.id,
            tx.date.format("%Y-%m-%d"),
            amount_str,
            truncate(tx.merchant_display(), 40),
            category_str
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_transactions_add(
    db: &Database,
    user_id: i64,
    account: i64,
    name: &str,
    merchant: Option<&str>,
    amount: f64,
    date: Option<&str>,
    category: Option<&str>,
    location: Option<&str>,
) -> Result<()> {
    // Verify the account exists and belongs to this user
    let owned = db
        .get_account(account)?
        .map(|a| a.user_id == user_id)
        .unwrap_or(false);
    if !owned {
        bail!("Account {} not found", account);
    }

    let tx = NewTransaction {
        date: parse_date_arg(date)?,
        name: name.to_string(),
        merchant: merchant.map(String::from),
        merchant_id: None,
        amount,
        category: category.map(String::from),
        ai_category: None,
        location: location.map(String::from),
        pending: false,
    };
    let id = db.insert_transaction(account, &tx)?;

    println!(
        "✅ Recorded transaction [{}] {} │ ${:.2} │ {}",
        id,
        tx.date.format("%Y-%m-%d"),
        amount.abs(),
        truncate(name, 40)
    );

    Ok(())
}
