//! Account operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Account, AccountType};

impl Database {
    /// Create a new account for a user
    pub fn create_account(
        &self,
        user_id: i64,
        name: &str,
        account_type: Option<AccountType>,
        institution: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO accounts (user_id, name, account_type, institution) VALUES (?, ?, ?, ?)",
            params![
                user_id,
                name,
                account_type.map(|t| t.as_str()),
                institution
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's accounts
    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, account_type, institution, created_at
             FROM accounts WHERE user_id = ? ORDER BY name",
        )?;

        let accounts = stmt
            .query_map(params![user_id], |row| {
                let account_type_str: Option<String> = row.get(3)?;
                let created_at_str: String = row.get(5)?;

                Ok(Account {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    account_type: account_type_str.and_then(|s| s.parse::<AccountType>().ok()),
                    institution: row.get(4)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get an account by ID
    pub fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                "SELECT id, user_id, name, account_type, institution, created_at
                 FROM accounts WHERE id = ?",
                params![id],
                |row| {
                    let account_type_str: Option<String> = row.get(3)?;
                    let created_at_str: String = row.get(5)?;

                    Ok(Account {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        account_type: account_type_str.and_then(|s| s.parse::<AccountType>().ok()),
                        institution: row.get(4)?,
                        created_at: parse_datetime(&created_at_str),
                    })
                },
            )
            .ok();

        Ok(account)
    }
}
