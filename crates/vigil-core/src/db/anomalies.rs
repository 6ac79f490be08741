//! Persisted detection results

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde_json::Value;

use super::transactions::{row_to_transaction, DATE_FORMAT};
use super::{parse_datetime, Database};
use crate::detect::AnomalyCandidate;
use crate::error::Result;
use crate::models::{Anomaly, AnomalyType, Severity};

fn row_to_anomaly(row: &rusqlite::Row<'_>) -> rusqlite::Result<Anomaly> {
    let type_str: String = row.get(3)?;
    let severity_str: String = row.get(4)?;
    let metadata_str: Option<String> = row.get(6)?;
    let detected_at_str: String = row.get(9)?;
    let created_at_str: String = row.get(10)?;

    let anomaly_type = type_str.parse::<AnomalyType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;
    let severity = severity_str.parse::<Severity>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Anomaly {
        id: row.get(0)?,
        settings_id: row.get(1)?,
        transaction_id: row.get(2)?,
        anomaly_type,
        severity,
        reason: row.get(5)?,
        metadata: metadata_str
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(Value::Null),
        is_hidden: row.get(7)?,
        is_resolved: row.get(8)?,
        detected_at: parse_datetime(&detected_at_str),
        created_at: parse_datetime(&created_at_str),
        transaction: row_to_transaction(row, 11)?,
    })
}

impl Database {
    /// Persist a detection candidate
    ///
    /// Returns the new row ID, or `None` when an anomaly of the same type
    /// already exists for this (settings, transaction) pair. That makes
    /// repeated detection runs idempotent.
    pub fn insert_anomaly(
        &self,
        settings_id: i64,
        candidate: &AnomalyCandidate,
        detected_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            INSERT OR IGNORE INTO anomalies
                (settings_id, transaction_id, anomaly_type, severity, reason, metadata, detected_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                settings_id,
                candidate.transaction_id,
                candidate.anomaly_type.as_str(),
                candidate.severity.as_str(),
                candidate.reason,
                serde_json::to_string(&candidate.metadata)?,
                detected_at.naive_utc().format(DATE_FORMAT).to_string(),
            ],
        )?;

        if rows == 0 {
            Ok(None)
        } else {
            Ok(Some(conn.last_insert_rowid()))
        }
    }

    /// Active anomalies for a settings row, newest transaction first
    ///
    /// Resolved anomalies are always excluded; hidden ones only appear when
    /// `include_hidden` is set. The inner join drops anomalies whose
    /// transaction has been deleted.
    pub fn list_anomalies(&self, settings_id: i64, include_hidden: bool) -> Result<Vec<Anomaly>> {
        let conn = self.conn()?;

        let mut sql = String::from(
            "SELECT a.id, a.settings_id, a.transaction_id, a.anomaly_type, a.severity, a.reason, a.metadata, a.is_hidden, a.is_resolved, a.detected_at, a.created_at,
                    t.id, t.account_id, t.date, t.name, t.merchant, t.merchant_id, t.amount, t.category, t.ai_category, t.location, t.pending, t.created_at
             FROM anomalies a
             JOIN transactions t ON t.id = a.transaction_id
             WHERE a.settings_id = ? AND a.is_resolved = 0",
        );
        if !include_hidden {
            sql.push_str(" AND a.is_hidden = 0");
        }
        sql.push_str(" ORDER BY t.date DESC, a.id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let anomalies = stmt
            .query_map(params![settings_id], row_to_anomaly)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(anomalies)
    }

    /// Hide an anomaly from default listings; returns false if not found
    pub fn hide_anomaly(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("UPDATE anomalies SET is_hidden = 1 WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }

    /// Mark an anomaly as resolved; returns false if not found
    pub fn resolve_anomaly(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE anomalies SET is_resolved = 1 WHERE id = ?",
            params![id],
        )?;
        Ok(rows > 0)
    }
}
