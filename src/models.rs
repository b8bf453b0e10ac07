use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of synthetic work, serialized as JSON onto the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDescriptor {
  pub insert_time_utc: DateTime<Utc>,
  /// Name of the generation log completions for this item are recorded in.
  pub job_name: String,
  /// Invocation id of the scheduler run that enqueued this item.
  pub invocation_id: String,
  /// Sequence number within the scheduler run, `0..messageCount-1`.
  pub job_id: String,
}

/// What the timer hands a scheduler invocation.
#[derive(Debug, Clone, Copy)]
pub struct TriggerInfo {
  pub fired_at: DateTime<Utc>,
  pub past_due: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
  Succeeded,
  Failed,
}

/// Per-invocation status record, built once at the end of a run and emitted
/// as a single structured log line. Observability only; never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
  pub duration_in_sec: f64,
  pub trigger_type: &'static str,
  pub status: Outcome,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub trigger_data: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pickup_time_in_sec: Option<f64>,
}

impl RunStatus {
  pub fn new(
    trigger_type: &'static str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: Outcome,
  ) -> Self {
    Self {
      start_time,
      end_time,
      duration_in_sec: (end_time - start_time).num_milliseconds() as f64 / 1000.0,
      trigger_type,
      status,
      trigger_data: None,
      pickup_time_in_sec: None,
    }
  }

  pub fn with_trigger_data(mut self, data: serde_json::Value) -> Self {
    self.trigger_data = Some(data);
    self
  }

  pub fn with_pickup_time(mut self, pickup: chrono::Duration) -> Self {
    self.pickup_time_in_sec = Some(pickup.num_milliseconds() as f64 / 1000.0);
    self
  }
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", serde_json::to_string(self).map_err(|_| fmt::Error)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn descriptor_round_trips_with_camel_case_names() {
    let descriptor = WorkDescriptor {
      insert_time_utc: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
      job_name: "generation_1".into(),
      invocation_id: "a6a1f7a2-0000-0000-0000-000000000000".into(),
      job_id: "7".into(),
    };

    let json = serde_json::to_value(&descriptor).unwrap();
    assert_eq!(json["jobName"], "generation_1");
    assert_eq!(json["jobId"], "7");
    assert!(json.get("insertTimeUtc").is_some());
    assert!(json.get("invocationId").is_some());

    let back: WorkDescriptor = serde_json::from_value(json).unwrap();
    assert_eq!(back.job_name, descriptor.job_name);
    assert_eq!(back.insert_time_utc, descriptor.insert_time_utc);
  }

  #[test]
  fn run_status_serializes_duration_and_outcome() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let end = start + chrono::Duration::milliseconds(2500);
    let status = RunStatus::new("Scheduler", start, end, Outcome::Succeeded)
      .with_trigger_data(serde_json::json!(32));

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["durationInSec"], 2.5);
    assert_eq!(json["status"], "Succeeded");
    assert_eq!(json["triggerType"], "Scheduler");
    assert_eq!(json["triggerData"], 32);
    assert!(json.get("pickupTimeInSec").is_none());
  }
}
