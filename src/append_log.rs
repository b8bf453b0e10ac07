use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppendLogError {
  #[error("append log not found")]
  NotFound,
  #[error("append log already exists")]
  AlreadyExists,
  #[error(transparent)]
  Store(#[from] anyhow::Error),
}

/// Creation-time attributes of a log. Set once at create, read back at
/// rotation. `trigger_data` is absent on logs created before the metadata was
/// introduced; readers must tolerate that.
#[derive(Debug, Clone, Default)]
pub struct LogMetadata {
  pub trigger_data: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LogProperties {
  pub block_count: i32,
  pub created_at: DateTime<Utc>,
  pub last_modified: DateTime<Utc>,
}

/// Full read-back of one log: concatenated entry text plus metadata and
/// store-maintained properties.
#[derive(Debug, Clone)]
pub struct LogContent {
  pub content: String,
  pub metadata: LogMetadata,
  pub properties: LogProperties,
}

/// A named, shared, append-only text log.
///
/// Many workers append concurrently while the scheduler reads, deletes and
/// recreates the same name; the store only guarantees that a single `append`
/// lands atomically and that `create` fails on a live log. An append racing a
/// rotation may land on the log about to be deleted (lost) or fail with
/// `NotFound` after it; callers accept both outcomes.
#[allow(async_fn_in_trait)]
pub trait AppendStore {
  async fn exists(&self, name: &str) -> Result<bool, AppendLogError>;

  /// Creates an empty log. Fails with `AlreadyExists` if a live log of the
  /// same name is present; callers own the delete-then-create sequencing.
  async fn create(&self, name: &str, metadata: LogMetadata) -> Result<(), AppendLogError>;

  /// Appends `block` atomically as one unit. `NotFound` if the log was
  /// deleted concurrently.
  async fn append(&self, name: &str, block: &str) -> Result<(), AppendLogError>;

  async fn read_all(&self, name: &str) -> Result<LogContent, AppendLogError>;

  async fn delete(&self, name: &str) -> Result<(), AppendLogError>;
}
