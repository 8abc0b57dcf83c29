pub mod audit;
pub mod schema;

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use audit::{AuditLog, SqliteAuditLog};

/// Shared SQLite connection.
///
/// rusqlite is blocking, so every statement runs through [`Database::call`],
/// which hops onto tokio's blocking pool. The mutex is only taken inside that
/// closure and never across an `.await`.
#[derive(Clone)]
pub struct Database {
  conn: Arc<Mutex<Connection>>,
}

impl Database {
  /// Open or create the database at `path` and apply `schema`.
  pub fn open(path: &Path, schema: &str) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    conn
      .pragma_update(None, "journal_mode", "WAL")
      .map_err(|e| eyre!("Failed to enable WAL on {}: {}", path.display(), e))?;

    let db = Self {
      conn: Arc::new(Mutex::new(conn)),
    };
    db.run_migrations(schema)?;

    Ok(db)
  }

  /// Run database migrations
  fn run_migrations(&self, schema: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(schema)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;

    Ok(())
  }

  /// Run `f` against the connection on the blocking thread pool.
  pub async fn call<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);

    tokio::task::spawn_blocking(move || {
      let conn = conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
      f(&conn)
    })
    .await
    .map_err(|e| eyre!("Database task failed: {}", e))?
  }
}
