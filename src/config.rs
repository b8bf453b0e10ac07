use std::env;

static DEFAULT_METRICS_ENDPOINT: &str = "https://example.com/metrics.html";

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub rabbitmq_url: String,
  pub message_count: u32,
  pub bucket_width_secs: u32,
  pub metrics_endpoint: String,
  pub worker_concurrency: usize,
}

impl Config {
  pub fn from_env() -> Self {
    Self {
      database_url: env::var("DATABASE_URL").unwrap(),
      rabbitmq_url: env::var("RABBITMQ_URL").unwrap(),
      message_count: env::var("MESSAGE_COUNT")
        .unwrap_or_else(|_| "32".into())
        .parse()
        .unwrap_or(32),
      bucket_width_secs: env::var("BUCKET_WIDTH_SECONDS")
        .unwrap_or_else(|_| "20".into())
        .parse()
        .unwrap_or(20)
        .clamp(1, 60),
      metrics_endpoint: env::var("METRICS_ENDPOINT")
        .unwrap_or_else(|_| DEFAULT_METRICS_ENDPOINT.into()),
      worker_concurrency: env::var("WORKER_CONCURRENCY")
        .unwrap_or_else(|_| "4".into())
        .parse()
        .unwrap_or(4),
    }
  }
}
