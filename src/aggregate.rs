use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::append_log::LogContent;

/// Summary of one finished generation, derived from its log at rotation time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
  pub append_log_name: String,
  pub block_count: i32,
  pub processed_message_count: usize,
  pub host_count: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_generation_start_time: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub last_modified: DateTime<Utc>,
}

impl fmt::Display for LogSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", serde_json::to_string(self).map_err(|_| fmt::Error)?)
  }
}

/// Computes the generation summary from a log's raw text.
///
/// Entries are `<workerId>:<invocationId>;` substrings; anything that does
/// not split into exactly two non-empty fields is skipped. Distinct counts
/// are case-insensitive.
pub fn summarize(name: &str, log: &LogContent) -> LogSummary {
  let mut hosts: HashSet<String> = HashSet::new();
  let mut invocations: HashSet<String> = HashSet::new();

  for entry in log.content.split(';').filter(|e| !e.is_empty()) {
    let fields: Vec<&str> = entry.split(':').filter(|s| !s.is_empty()).collect();
    if fields.len() != 2 {
      continue;
    }
    hosts.insert(fields[0].to_ascii_lowercase());
    invocations.insert(fields[1].to_ascii_lowercase());
  }

  LogSummary {
    append_log_name: name.to_string(),
    block_count: log.properties.block_count,
    processed_message_count: invocations.len(),
    host_count: hosts.len(),
    last_generation_start_time: log.metadata.trigger_data,
    created_at: log.properties.created_at,
    last_modified: log.properties.last_modified,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::append_log::{LogMetadata, LogProperties};
  use chrono::TimeZone;

  fn log_with(content: &str, trigger_data: Option<DateTime<Utc>>) -> LogContent {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    LogContent {
      content: content.to_string(),
      metadata: LogMetadata { trigger_data },
      properties: LogProperties { block_count: 3, created_at: t, last_modified: t },
    }
  }

  #[test]
  fn counts_distinct_hosts_and_invocations() {
    let summary = summarize("generation_1", &log_with("h1:i1;h2:i2;h1:i3;", None));
    assert_eq!(summary.host_count, 2);
    assert_eq!(summary.processed_message_count, 3);
    assert_eq!(summary.block_count, 3);
  }

  #[test]
  fn skips_malformed_entries() {
    let summary = summarize("generation_1", &log_with("h1:i1;badentry;h2:i2;", None));
    assert_eq!(summary.host_count, 2);
    assert_eq!(summary.processed_message_count, 2);
  }

  #[test]
  fn skips_entries_with_extra_fields() {
    let summary = summarize("generation_1", &log_with("h1:i1:extra;h2:i2;", None));
    assert_eq!(summary.host_count, 1);
    assert_eq!(summary.processed_message_count, 1);
  }

  #[test]
  fn empty_log_yields_zero_counts() {
    let summary = summarize("generation_0", &log_with("", None));
    assert_eq!(summary.host_count, 0);
    assert_eq!(summary.processed_message_count, 0);
  }

  #[test]
  fn distinct_counts_ignore_case() {
    let summary = summarize("generation_1", &log_with("HostA:I1;hosta:i2;", None));
    assert_eq!(summary.host_count, 1);
    assert_eq!(summary.processed_message_count, 2);
  }

  #[test]
  fn missing_metadata_is_omitted_from_output() {
    let summary = summarize("generation_1", &log_with("h1:i1;", None));
    assert!(summary.last_generation_start_time.is_none());
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("lastGenerationStartTime").is_none());
    assert_eq!(json["appendLogName"], "generation_1");
    assert_eq!(json["processedMessageCount"], 1);
  }

  #[test]
  fn metadata_passes_through_when_present() {
    let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 59, 40).unwrap();
    let summary = summarize("generation_2", &log_with("h1:i1;", Some(started)));
    assert_eq!(summary.last_generation_start_time, Some(started));
  }
}
