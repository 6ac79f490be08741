//! Per-user detection settings

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{DetectionOverrides, DetectionSettings};

fn row_to_settings(row: &rusqlite::Row<'_>) -> rusqlite::Result<DetectionSettings> {
    let created_at_str: String = row.get(12)?;
    let updated_at_str: String = row.get(13)?;

    Ok(DetectionSettings {
        id: row.get(0)?,
        user_id: row.get(1)?,
        enabled: row.get(2)?,
        min_amount: row.get(3)?,
        max_amount: row.get(4)?,
        time_window_days: row.get(5)?,
        z_score_threshold: row.get(6)?,
        new_merchant_threshold: row.get(7)?,
        geographic_threshold: row.get(8)?,
        hours_window: row.get(9)?,
        notify_in_app: row.get(10)?,
        notify_email: row.get(11)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

const SETTINGS_QUERY: &str = "SELECT id, user_id, enabled, min_amount, max_amount, time_window_days, \
     z_score_threshold, new_merchant_threshold, geographic_threshold, hours_window, \
     notify_in_app, notify_email, created_at, updated_at \
     FROM detection_settings WHERE user_id = ?";

impl Database {
    /// Get a user's detection settings, creating a default row on first use
    ///
    /// Returns the settings and whether the row was created by this call.
    /// Safe against concurrent first reads: the UNIQUE constraint plus
    /// INSERT OR IGNORE means exactly one caller creates the row.
    pub fn get_or_create_settings(&self, user_id: i64) -> Result<(DetectionSettings, bool)> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "INSERT OR IGNORE INTO detection_settings (user_id) VALUES (?)",
            params![user_id],
        )?;
        let created = rows == 1;

        let settings = conn.query_row(SETTINGS_QUERY, params![user_id], row_to_settings)?;
        Ok((settings, created))
    }

    /// Apply persistent overrides to a user's settings
    ///
    /// Only fields set in `overrides` change; the row is created with
    /// defaults first if missing. Returns the updated settings.
    pub fn update_settings(
        &self,
        user_id: i64,
        overrides: &DetectionOverrides,
    ) -> Result<DetectionSettings> {
        let (current, _) = self.get_or_create_settings(user_id)?;
        if overrides.is_empty() {
            return Ok(current);
        }

        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(v) = overrides.enabled {
            sets.push("enabled = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.min_amount {
            sets.push("min_amount = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.max_amount {
            sets.push("max_amount = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.time_window_days {
            sets.push("time_window_days = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.z_score_threshold {
            sets.push("z_score_threshold = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.new_merchant_threshold {
            sets.push("new_merchant_threshold = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.geographic_threshold {
            sets.push("geographic_threshold = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.hours_window {
            sets.push("hours_window = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.notify_in_app {
            sets.push("notify_in_app = ?".to_string());
            values.push(Box::new(v));
        }
        if let Some(v) = overrides.notify_email {
            sets.push("notify_email = ?".to_string());
            values.push(Box::new(v));
        }

        sets.push("updated_at = CURRENT_TIMESTAMP".to_string());
        values.push(Box::new(user_id));

        let sql = format!(
            "UPDATE detection_settings SET {} WHERE user_id = ?",
            sets.join(", ")
        );
        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let conn = self.conn()?;
        conn.execute(&sql, params_refs.as_slice())?;

        let settings = conn.query_row(SETTINGS_QUERY, params![user_id], row_to_settings)?;
        Ok(settings)
    }
}
