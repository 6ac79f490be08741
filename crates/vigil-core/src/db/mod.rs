//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Bank account operations
//! - `transactions` - Transaction storage and window queries
//! - `settings` - Per-user detection settings
//! - `rules` - Dismissal rule CRUD
//! - `anomalies` - Persisted detection results

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod accounts;
mod anomalies;
mod rules;
mod settings;
mod transactions;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "VIGIL_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"vigil-salt-v1-fx";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    // Derive key using Argon2id
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    // Extract the hash portion for use as SQLCipher key (hex encoded)
    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Default database location under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vigil")
        .join("vigil.db")
}

/// Per-user row counts for the status command
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_accounts: i64,
    pub total_transactions: i64,
    pub active_anomalies: i64,
    pub dismissal_rules: i64,
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `VIGIL_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `VIGIL_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing. For production, use `new()` with `VIGIL_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        // Foreign keys are per-connection in SQLite, so every pooled
        // connection needs the pragma (the anomalies cascade relies on it)
        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            let manager =
                manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/vigil_test_{}.db", id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Row counts across the main tables for one user
    pub fn get_stats(&self, user_id: i64) -> Result<DatabaseStats> {
        let conn = self.conn()?;

        let total_accounts = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        let total_transactions = conn.query_row(
            "SELECT COUNT(*) FROM transactions t
             JOIN accounts a ON t.account_id = a.id
             WHERE a.user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        let active_anomalies = conn.query_row(
            "SELECT COUNT(*) FROM anomalies an
             JOIN detection_settings ds ON an.settings_id = ds.id
             WHERE ds.user_id = ?1 AND an.is_hidden = 0 AND an.is_resolved = 0",
            [user_id],
            |row| row.get(0),
        )?;
        let dismissal_rules = conn.query_row(
            "SELECT COUNT(*) FROM dismissal_rules WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_accounts,
            total_transactions,
            active_anomalies,
            dismissal_rules,
        })
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Performance pragmas for local storage (SSD/M.2 recommended)
            -- WAL mode: better concurrency, readers don't block writers
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            -- FULL is safer but slower; NORMAL is safe for most power-loss scenarios
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory (faster for complex queries)
            PRAGMA temp_store = MEMORY;

            -- Accounts (bank accounts)
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                account_type TEXT,
                institution TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

            -- Transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                date DATETIME NOT NULL,
                name TEXT NOT NULL,
                merchant TEXT,
                merchant_id TEXT,                          -- provider merchant-entity id
                amount REAL NOT NULL,                      -- negative = expense
                category TEXT,
                ai_category TEXT,                          -- user/AI category override
                location TEXT,                             -- e.g. "Portland, OR"
                pending BOOLEAN DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Index for common queries
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(merchant);

            -- Per-user detection settings (one row per user, created on demand)
            CREATE TABLE IF NOT EXISTS detection_settings (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                enabled BOOLEAN DEFAULT 1,
                min_amount REAL DEFAULT 50.0,
                max_amount REAL DEFAULT 10000.0,
                time_window_days INTEGER DEFAULT 30,
                z_score_threshold REAL DEFAULT 2.5,
                new_merchant_threshold REAL DEFAULT 100.0,
                geographic_threshold REAL DEFAULT 50.0,
                hours_window INTEGER DEFAULT 24,
                notify_in_app BOOLEAN DEFAULT 1,
                notify_email BOOLEAN DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Dismissal rules (user-authored suppressions)
            CREATE TABLE IF NOT EXISTS dismissal_rules (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                pattern_type TEXT NOT NULL,               -- exact_name, merchant_name, category, amount_range, free_text
                pattern TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_dismissal_rules_user ON dismissal_rules(user_id);

            -- Anomalies (detection findings)
            -- The UNIQUE constraint makes repeated runs idempotent
            CREATE TABLE IF NOT EXISTS anomalies (
                id INTEGER PRIMARY KEY,
                settings_id INTEGER NOT NULL REFERENCES detection_settings(id),
                transaction_id INTEGER NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
                anomaly_type TEXT NOT NULL,
                severity TEXT NOT NULL,                   -- high, medium, low
                reason TEXT NOT NULL,
                metadata TEXT,                            -- JSON detector payload
                is_hidden BOOLEAN DEFAULT 0,
                is_resolved BOOLEAN DEFAULT 0,
                detected_at DATETIME NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(settings_id, transaction_id, anomaly_type)
            );

            CREATE INDEX IF NOT EXISTS idx_anomalies_settings ON anomalies(settings_id);
            CREATE INDEX IF NOT EXISTS idx_anomalies_transaction ON anomalies(transaction_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
