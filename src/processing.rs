use std::time::Instant;

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use crate::append_log::{AppendLogError, AppendStore};

/// The synthetic work item: fetch the configured metrics page and report its
/// size and the call duration. The response body is discarded.
pub async fn fetch_remote_info(client: &reqwest::Client, endpoint: &str) -> Result<usize> {
  let started = Instant::now();
  let body = client
    .get(endpoint)
    .send()
    .await?
    .error_for_status()?
    .text()
    .await?;

  info!(
    "Received remote info of size: {}, call duration: {}ms",
    body.len(),
    started.elapsed().as_millis()
  );
  Ok(body.len())
}

/// Appends this invocation's completion marker to the generation log named by
/// the descriptor. Returns whether the marker landed: a log that is missing
/// or rotated away mid-append is logged and reported as `false`, not an error
/// (the marker is lost for aggregation, the invocation itself succeeded).
pub async fn record_completion<S: AppendStore>(
  store: &S,
  job_name: &str,
  host_id: &str,
  invocation_id: &Uuid,
) -> Result<bool> {
  if !store.exists(job_name).await? {
    info!("Log {} does not exist", job_name);
    return Ok(false);
  }

  let block = format!("{}:{};", host_id, invocation_id);
  match store.append(job_name, &block).await {
    Ok(()) => {
      info!("Log {} exists, appended block {}", job_name, block);
      Ok(true)
    }
    Err(AppendLogError::NotFound) => {
      info!("Log {} rotated away before append, marker dropped", job_name);
      Ok(false)
    }
    Err(e) => Err(e.into()),
  }
}
