use chrono::{DateTime, Timelike, Utc};

static GENERATION_PREFIX: &str = "generation";

/// Log name for the generation covering `at`. Buckets over seconds within the
/// minute, so names recycle once per minute and every process lands on the
/// same name without coordination.
pub fn generation_name(at: DateTime<Utc>, bucket_width_secs: u32) -> String {
  format!("{}_{}", GENERATION_PREFIX, at.second() / bucket_width_secs)
}

/// Name of the generation one bucket earlier, wrapping at the minute boundary.
pub fn previous_generation_name(at: DateTime<Utc>, bucket_width_secs: u32) -> String {
  let buckets = 60 / bucket_width_secs;
  let bucket = at.second() / bucket_width_secs;
  format!("{}_{}", GENERATION_PREFIX, (bucket + buckets - 1) % buckets)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at_second(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, second).unwrap()
  }

  #[test]
  fn same_bucket_same_name() {
    assert_eq!(generation_name(at_second(0), 20), generation_name(at_second(19), 20));
    assert_eq!(generation_name(at_second(40), 20), generation_name(at_second(59), 20));
    assert_eq!(generation_name(at_second(3), 10), generation_name(at_second(9), 10));
  }

  #[test]
  fn adjacent_buckets_differ() {
    assert_ne!(generation_name(at_second(19), 20), generation_name(at_second(20), 20));
    assert_ne!(generation_name(at_second(9), 10), generation_name(at_second(10), 10));
  }

  #[test]
  fn name_is_minute_local() {
    let a = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 5).unwrap();
    let b = Utc.with_ymd_and_hms(2024, 3, 1, 23, 42, 5).unwrap();
    assert_eq!(generation_name(a, 20), generation_name(b, 20));
  }

  #[test]
  fn previous_is_adjacent_earlier_bucket() {
    assert_eq!(previous_generation_name(at_second(25), 20), generation_name(at_second(5), 20));
    assert_eq!(previous_generation_name(at_second(45), 20), generation_name(at_second(25), 20));
  }

  #[test]
  fn previous_wraps_at_minute_start() {
    assert_eq!(previous_generation_name(at_second(5), 20), generation_name(at_second(45), 20));
    assert_eq!(previous_generation_name(at_second(0), 10), generation_name(at_second(50), 10));
  }
}
