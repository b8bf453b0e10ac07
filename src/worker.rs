use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use std::env;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};
use uuid::Uuid;
use chrono::Utc;
use futures::StreamExt;

use checkgen::config::Config;
use checkgen::database::{PgAppendStore, setup_database};
use checkgen::messaging::{CHECKS_QUEUE, create_rabbit_channel};
use checkgen::models::{Outcome, RunStatus, WorkDescriptor};
use checkgen::processing::{fetch_remote_info, record_completion};

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt::init();
  let config = Config::from_env();
  let host_id = env::var("HOST_ID").unwrap();

  let db_pool = setup_database(&config.database_url).await;
  let store = PgAppendStore::new(db_pool);
  let http = reqwest::Client::new();
  let rabbit_channel = create_rabbit_channel(&config.rabbitmq_url)
    .await
    .expect("Failed to create RabbitMQ channel");

  let _ = rabbit_channel
    .queue_declare(CHECKS_QUEUE, QueueDeclareOptions::default(), FieldTable::default())
    .await
    .expect("Queue declaration failed");

  let mut consumer = rabbit_channel
    .basic_consume(CHECKS_QUEUE, "worker", BasicConsumeOptions::default(), FieldTable::default())
    .await
    .expect("Failed to start consumer");

  let semaphore = Arc::new(Semaphore::new(config.worker_concurrency));

  while let Some(delivery) = consumer.next().await {
    match delivery {
      Ok(delivery) => {
        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let store = store.clone();
        let http = http.clone();
        let host_id = host_id.clone();
        let metrics_endpoint = config.metrics_endpoint.clone();
        tokio::spawn(async move {
          handle_delivery(&store, &http, &metrics_endpoint, &host_id, delivery).await;
          drop(permit);
        });
      }
      Err(e) => error!("Consumer error: {:?}", e),
    }
  }
}

async fn handle_delivery(
  store: &PgAppendStore,
  http: &reqwest::Client,
  metrics_endpoint: &str,
  host_id: &str,
  delivery: Delivery,
) {
  let start_time = Utc::now();
  let invocation_id = Uuid::new_v4();

  let descriptor = match serde_json::from_slice::<WorkDescriptor>(&delivery.data) {
    Ok(descriptor) => descriptor,
    Err(e) => {
      // Poison message: drop it, never redeliver.
      error!("Failed to decode work descriptor: {:?}", e);
      let _ = delivery.ack(BasicAckOptions::default()).await;
      let status = RunStatus::new("MessageProcessor", start_time, Utc::now(), Outcome::Failed);
      info!("MessageProcessor execution details: {}", status);
      return;
    }
  };

  let pickup_time = start_time - descriptor.insert_time_utc;
  let outcome = match process_message(store, http, metrics_endpoint, host_id, &invocation_id, &descriptor).await {
    Ok(()) => Outcome::Succeeded,
    Err(e) => {
      error!("Error processing message {} of {}: {:?}", descriptor.job_id, descriptor.job_name, e);
      Outcome::Failed
    }
  };

  let _ = delivery.ack(BasicAckOptions::default()).await;

  let status = RunStatus::new("MessageProcessor", start_time, Utc::now(), outcome)
    .with_trigger_data(serde_json::to_value(&descriptor).unwrap_or_default())
    .with_pickup_time(pickup_time);
  info!("MessageProcessor execution details: {}", status);
}

async fn process_message(
  store: &PgAppendStore,
  http: &reqwest::Client,
  metrics_endpoint: &str,
  host_id: &str,
  invocation_id: &Uuid,
  descriptor: &WorkDescriptor,
) -> anyhow::Result<()> {
  fetch_remote_info(http, metrics_endpoint).await?;
  record_completion(store, &descriptor.job_name, host_id, invocation_id).await?;
  Ok(())
}
