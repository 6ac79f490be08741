//! Transaction storage and window queries

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

/// Storage format for transaction timestamps; lexicographic order matches
/// chronological order so range predicates work on the text column
pub(super) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Map a row whose transaction columns start at `base`, in the order
/// id, account_id, date, name, merchant, merchant_id, amount, category,
/// ai_category, location, pending, created_at
///
/// The offset lets joined queries (anomalies) reuse the mapping.
pub(super) fn row_to_transaction(
    row: &rusqlite::Row<'_>,
    base: usize,
) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(base + 2)?;
    let created_at_str: String = row.get(base + 11)?;

    Ok(Transaction {
        id: row.get(base)?,
        account_id: row.get(base + 1)?,
        date: NaiveDateTime::parse_from_str(&date_str, DATE_FORMAT).unwrap_or_default(),
        name: row.get(base + 3)?,
        merchant: row.get(base + 4)?,
        merchant_id: row.get(base + 5)?,
        amount: row.get(base + 6)?,
        category: row.get(base + 7)?,
        ai_category: row.get(base + 8)?,
        location: row.get(base + 9)?,
        pending: row.get(base + 10)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Insert a transaction into an account
    pub fn insert_transaction(&self, account_id: i64, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (account_id, date, name, merchant, merchant_id, amount, category, ai_category, location, pending)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account_id,
                tx.date.format(DATE_FORMAT).to_string(),
                tx.name,
                tx.merchant,
                tx.merchant_id,
                tx.amount,
                tx.category,
                tx.ai_category,
                tx.location,
                tx.pending,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                "SELECT id, account_id, date, name, merchant, merchant_id, amount, category, ai_category, location, pending, created_at
                 FROM transactions WHERE id = ?",
                params![id],
                |row| row_to_transaction(row, 0),
            )
            .optional()?;
        Ok(tx)
    }

    /// Check whether a transaction row still exists
    pub fn transaction_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Settled transactions for a user inside a date window, with the
    /// absolute amount clamped to [min_amount, max_amount], oldest first
    ///
    /// This is the detection engine's input query. Pending transactions are
    /// excluded because their amounts and merchants can still change.
    pub fn transactions_in_window(
        &self,
        user_id: i64,
        since: NaiveDateTime,
        until: NaiveDateTime,
        min_amount: f64,
        max_amount: f64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.account_id, t.date, t.name, t.merchant, t.merchant_id, t.amount, t.category, t.ai_category, t.location, t.pending, t.created_at
             FROM transactions t
             JOIN accounts a ON a.id = t.account_id
             WHERE a.user_id = ?
               AND t.pending = 0
               AND t.date >= ?
               AND t.date <= ?
               AND ABS(t.amount) >= ?
               AND ABS(t.amount) <= ?
             ORDER BY t.date ASC, t.id ASC",
        )?;

        let transactions = stmt
            .query_map(
                params![
                    user_id,
                    since.format(DATE_FORMAT).to_string(),
                    until.format(DATE_FORMAT).to_string(),
                    min_amount,
                    max_amount,
                ],
                |row| row_to_transaction(row, 0),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Most recent transactions for a user (for display)
    pub fn list_transactions(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.account_id, t.date, t.name, t.merchant, t.merchant_id, t.amount, t.category, t.ai_category, t.location, t.pending, t.created_at
             FROM transactions t
             JOIN accounts a ON a.id = t.account_id
             WHERE a.user_id = ?
             ORDER BY t.date DESC, t.id DESC
             LIMIT ?",
        )?;

        let transactions = stmt
            .query_map(params![user_id, limit], |row| row_to_transaction(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}
