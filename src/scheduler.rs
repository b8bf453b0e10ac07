use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::aggregate::{LogSummary, summarize};
use crate::append_log::{AppendLogError, AppendStore, LogMetadata};
use crate::generation::{generation_name, previous_generation_name};
use crate::messaging::WorkQueue;
use crate::models::{Outcome, WorkDescriptor};

#[derive(Debug, Clone)]
pub struct CycleSettings {
  pub queue_name: String,
  pub message_count: u32,
  pub bucket_width_secs: u32,
}

/// What one scheduler invocation did, for the status record.
#[derive(Debug)]
pub struct CycleReport {
  pub job_name: String,
  pub enqueued: u32,
  pub summary: Option<LogSummary>,
  pub outcome: Outcome,
}

/// Runs one generation cycle: rotate the append log, ensure the queue,
/// enqueue the work batch.
///
/// Never propagates a failure: each step's error is logged here and flips the
/// outcome to `Failed`, keeping whatever the run got done (already-enqueued
/// messages are not compensated; the next timer firing retries rotation
/// naturally).
pub async fn run_cycle<S: AppendStore, Q: WorkQueue>(
  store: &S,
  queue: &Q,
  now: DateTime<Utc>,
  invocation_id: Uuid,
  settings: &CycleSettings,
) -> CycleReport {
  let job_name = generation_name(now, settings.bucket_width_secs);

  let summary = match rotate(store, &job_name, now, settings.bucket_width_secs).await {
    Ok(summary) => summary,
    Err(e) => {
      error!("Rotation failed for {}: {:?}", job_name, e);
      return CycleReport { job_name, enqueued: 0, summary: None, outcome: Outcome::Failed };
    }
  };

  if let Err(e) = queue.ensure_queue(&settings.queue_name).await {
    error!("Failed to ensure queue {}: {:?}", settings.queue_name, e);
    return CycleReport { job_name, enqueued: 0, summary, outcome: Outcome::Failed };
  }

  let mut enqueued = 0;
  for job_id in 0..settings.message_count {
    let descriptor = WorkDescriptor {
      insert_time_utc: Utc::now(),
      job_name: job_name.clone(),
      invocation_id: invocation_id.to_string(),
      job_id: job_id.to_string(),
    };
    let payload = match serde_json::to_vec(&descriptor) {
      Ok(payload) => payload,
      Err(e) => {
        error!("Failed to serialize descriptor {}: {:?}", job_id, e);
        return CycleReport { job_name, enqueued, summary, outcome: Outcome::Failed };
      }
    };
    if let Err(e) = queue.enqueue(&settings.queue_name, &payload).await {
      error!("Failed to enqueue message {} of {}: {:?}", job_id, settings.message_count, e);
      return CycleReport { job_name, enqueued, summary, outcome: Outcome::Failed };
    }
    enqueued += 1;
  }

  info!("Added {} messages to queue {} for {}", enqueued, settings.queue_name, job_name);
  CycleReport { job_name, enqueued, summary, outcome: Outcome::Succeeded }
}

/// Rotates the append log for the generation named `job_name`.
///
/// If that log already exists, an overlapping run rotated first and this run
/// must not touch it. Otherwise the previous generation's log (if any) is
/// read, summarized and deleted, and a fresh log is created carrying the
/// generation start time. Losing the create race to a concurrent run counts
/// as success.
async fn rotate<S: AppendStore>(
  store: &S,
  job_name: &str,
  now: DateTime<Utc>,
  bucket_width_secs: u32,
) -> Result<Option<LogSummary>> {
  if store.exists(job_name).await? {
    info!("Log {} already exists, rotation done by an overlapping run", job_name);
    return Ok(None);
  }

  let previous = previous_generation_name(now, bucket_width_secs);
  let summary = match store.read_all(&previous).await {
    Ok(log) => {
      let summary = summarize(&previous, &log);
      info!("Generation summary: {}", summary);
      match store.delete(&previous).await {
        Ok(()) | Err(AppendLogError::NotFound) => {}
        Err(e) => return Err(e.into()),
      }
      Some(summary)
    }
    Err(AppendLogError::NotFound) => {
      info!("Log {} does not exist", previous);
      None
    }
    Err(e) => return Err(e.into()),
  };

  match store.create(job_name, LogMetadata { trigger_data: Some(now) }).await {
    Ok(()) => {}
    Err(AppendLogError::AlreadyExists) => {
      info!("Lost create race for {}, another scheduler rotated", job_name);
    }
    Err(e) => return Err(e.into()),
  }

  Ok(summary)
}
