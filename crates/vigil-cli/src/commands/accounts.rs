//! Account command implementations (list, add)

use anyhow::{anyhow, Result};
use vigil_core::db::Database;
use vigil_core::models::AccountType;

pub fn cmd_accounts_list(db: &Database, user_id: i64) -> Result<()> {
    let accounts = db.list_accounts(user_id)?;

    if accounts.is_empty() {
        println!("No accounts found. Add one with:");
        println!("  vigil accounts add \"Everyday Checking\" -t checking");
        return Ok(());
    }

    println!();
    println!("📁 Accounts");
    println!("   ─────────────────────────────");

    for account in accounts {
        let detail = match (&account.institution, &account.account_type) {
            (Some(institution), _) => institution.clone(),
            (None, Some(account_type)) => account_type.to_string(),
            (None, None) => "unknown".to_string(),
        };
        println!("   [{}] {} ({})", account.id, account.name, detail);
    }

    Ok(())
}

pub fn cmd_accounts_add(
    db: &Database,
    user_id: i64,
    name: &str,
    account_type: Option<&str>,
    institution: Option<&str>,
) -> Result<()> {
    let account_type = account_type
        .map(|t| {
            t.parse::<AccountType>()
                .map_err(|_| anyhow!("Unknown account type '{}' (valid types: checking, savings, credit)", t))
        })
        .transpose()?;

    let id = db.create_account(user_id, name, account_type, institution)?;
    println!("✅ Added account [{}] {}", id, name);

    Ok(())
}
