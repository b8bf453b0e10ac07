use sqlx::migrate::Migrator;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use crate::append_log::{AppendLogError, AppendStore, LogContent, LogMetadata, LogProperties};

static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn setup_database(database_url: &str) -> Pool<Postgres> {
  let pool = Pool::<Postgres>::connect(database_url)
    .await
    .expect("Failed to connect to database.");

  MIGRATOR.run(&pool)
    .await
    .expect("Failed to run database migrations.");
  info!("Database migrations complete");
  pool
}

/// Postgres-backed append store: one `append_logs` row per live log. The
/// single-statement `content || $2` update is the atomic block append; the
/// primary-key insert is the fails-if-exists create.
#[derive(Clone)]
pub struct PgAppendStore {
  pool: Pool<Postgres>,
}

impl PgAppendStore {
  pub fn new(pool: Pool<Postgres>) -> Self {
    Self { pool }
  }
}

impl AppendStore for PgAppendStore {
  async fn exists(&self, name: &str) -> Result<bool, AppendLogError> {
    let row = sqlx::query("SELECT 1 FROM append_logs WHERE name = $1")
      .bind(name)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| AppendLogError::Store(e.into()))?;
    Ok(row.is_some())
  }

  async fn create(&self, name: &str, metadata: LogMetadata) -> Result<(), AppendLogError> {
    sqlx::query("INSERT INTO append_logs (name, content, trigger_data, block_count) VALUES ($1, '', $2, 0)")
      .bind(name)
      .bind(metadata.trigger_data)
      .execute(&self.pool)
      .await
      .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppendLogError::AlreadyExists,
        _ => AppendLogError::Store(e.into()),
      })?;
    Ok(())
  }

  async fn append(&self, name: &str, block: &str) -> Result<(), AppendLogError> {
    let result = sqlx::query(
      "UPDATE append_logs SET content = content || $2, block_count = block_count + 1, last_modified = now() WHERE name = $1",
    )
      .bind(name)
      .bind(block)
      .execute(&self.pool)
      .await
      .map_err(|e| AppendLogError::Store(e.into()))?;

    if result.rows_affected() == 0 {
      return Err(AppendLogError::NotFound);
    }
    Ok(())
  }

  async fn read_all(&self, name: &str) -> Result<LogContent, AppendLogError> {
    let row = sqlx::query(
      "SELECT content, trigger_data, block_count, created_at, last_modified FROM append_logs WHERE name = $1",
    )
      .bind(name)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| AppendLogError::Store(e.into()))?
      .ok_or(AppendLogError::NotFound)?;

    Ok(LogContent {
      content: row.get("content"),
      metadata: LogMetadata { trigger_data: row.get("trigger_data") },
      properties: LogProperties {
        block_count: row.get("block_count"),
        created_at: row.get("created_at"),
        last_modified: row.get("last_modified"),
      },
    })
  }

  async fn delete(&self, name: &str) -> Result<(), AppendLogError> {
    let result = sqlx::query("DELETE FROM append_logs WHERE name = $1")
      .bind(name)
      .execute(&self.pool)
      .await
      .map_err(|e| AppendLogError::Store(e.into()))?;

    if result.rows_affected() == 0 {
      return Err(AppendLogError::NotFound);
    }
    Ok(())
  }
}
