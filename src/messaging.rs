use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::info;
use anyhow::Result;

static MAX_RETRIES: usize = 5;
static DELAY: u64 = 100;

/// Queue shared by the scheduler and all workers.
pub static CHECKS_QUEUE: &str = "checks";

/// Per-message TTL for work descriptors (30 minutes).
static MESSAGE_TTL_MS: &str = "1800000";

pub async fn create_rabbit_channel(rabbitmq_url: &str) -> Result<Channel> {
  let conn = Retry::spawn(ExponentialBackoff::from_millis(DELAY).take(MAX_RETRIES), || {
    Connection::connect(rabbitmq_url, ConnectionProperties::default())
  })
    .await?;
  let channel = conn.create_channel().await?;
  info!("RabbitMQ channel created");
  Ok(channel)
}

pub async fn publish_message(channel: &Channel, queue: &str, payload: &[u8]) -> Result<()> {
  Retry::spawn(ExponentialBackoff::from_millis(DELAY).take(MAX_RETRIES), || async {
    channel
      .basic_publish(
        "",
        queue,
        BasicPublishOptions::default(),
        payload,
        BasicProperties::default().with_expiration(MESSAGE_TTL_MS.into()),
      )
      .await
  })
    .await?;
  Ok(())
}

/// Best-effort shared work queue: idempotent declare plus opaque enqueue.
/// At-least-once delivery; no ordering guarantee across enqueues.
#[allow(async_fn_in_trait)]
pub trait WorkQueue {
  async fn ensure_queue(&self, name: &str) -> Result<()>;
  async fn enqueue(&self, name: &str, payload: &[u8]) -> Result<()>;
}

#[derive(Clone)]
pub struct RabbitWorkQueue {
  channel: Channel,
}

impl RabbitWorkQueue {
  pub fn new(channel: Channel) -> Self {
    Self { channel }
  }
}

impl WorkQueue for RabbitWorkQueue {
  async fn ensure_queue(&self, name: &str) -> Result<()> {
    self.channel
      .queue_declare(name, QueueDeclareOptions::default(), FieldTable::default())
      .await?;
    Ok(())
  }

  async fn enqueue(&self, name: &str, payload: &[u8]) -> Result<()> {
    publish_message(&self.channel, name, payload).await
  }
}
