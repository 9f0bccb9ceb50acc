//! SQLite key store.
//!
//! Durable device-local storage for key-pair material, using rusqlite with
//! bundled SQLite. Calls run on the blocking pool via
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use keyward_core::Address;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::KeyStore;

/// SQLite-backed [`KeyStore`].
///
/// Thread-safe via an internal mutex around the single connection.
#[derive(Clone)]
pub struct SqliteKeyStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyStore {
    /// Open (or create) a database at `path` and run migrations.
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("connection mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl KeyStore for SqliteKeyStore {
    async fn put(&self, address: &Address, material: &str) -> Result<()> {
        let address = address.clone();
        let material = material.to_owned();

        self.blocking(move |conn| {
            // Single statement: the old row is replaced atomically.
            conn.execute(
                "INSERT INTO key_pairs (address, material, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(address) DO UPDATE SET
                    material = excluded.material,
                    updated_at = excluded.updated_at",
                params![address.as_str(), material, now_millis()],
            )?;
            debug!(address = %address, "key pair material stored");
            Ok(())
        })
        .await
    }

    async fn get(&self, address: &Address) -> Result<Option<String>> {
        let address = address.clone();

        self.blocking(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT material FROM key_pairs WHERE address = ?1",
                    params![address.as_str()],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .await
    }
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
