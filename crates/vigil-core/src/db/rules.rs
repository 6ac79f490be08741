//! Dismissal rule CRUD

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::DismissalRule;
use crate::rules::DismissalPattern;

impl Database {
    /// Add a dismissal rule for a user
    ///
    /// The pattern is validated up front; rules that could never match
    /// (empty text, malformed amount ranges) are rejected rather than
    /// stored as dead weight.
    pub fn add_dismissal_rule(
        &self,
        user_id: i64,
        pattern_type: &str,
        pattern: &str,
    ) -> Result<i64> {
        if DismissalPattern::parse(pattern_type, pattern).is_none() {
            return Err(Error::InvalidData(format!(
                "Invalid dismissal rule ({}: '{}')",
                pattern_type, pattern
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO dismissal_rules (user_id, pattern_type, pattern) VALUES (?, ?, ?)",
            params![user_id, pattern_type, pattern],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's dismissal rules, oldest first
    pub fn list_dismissal_rules(&self, user_id: i64) -> Result<Vec<DismissalRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, pattern_type, pattern, created_at
             FROM dismissal_rules WHERE user_id = ? ORDER BY id",
        )?;

        let rules = stmt
            .query_map(params![user_id], |row| {
                let created_at_str: String = row.get(4)?;
                Ok(DismissalRule {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    pattern_type: row.get(2)?,
                    pattern: row.get(3)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Delete a user's dismissal rule; returns false if no such rule
    pub fn delete_dismissal_rule(&self, user_id: i64, rule_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM dismissal_rules WHERE id = ? AND user_id = ?",
            params![rule_id, user_id],
        )?;
        Ok(rows > 0)
    }
}
