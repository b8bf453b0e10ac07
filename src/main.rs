use chrono::Utc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::info;
use uuid::Uuid;

use checkgen::config::Config;
use checkgen::database::{PgAppendStore, setup_database};
use checkgen::messaging::{CHECKS_QUEUE, RabbitWorkQueue, create_rabbit_channel};
use checkgen::models::{RunStatus, TriggerInfo};
use checkgen::scheduler::{CycleSettings, run_cycle};

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt::init();
  let config = Config::from_env();
  let db_pool = setup_database(&config.database_url).await;
  let store = PgAppendStore::new(db_pool);
  let rabbit_channel = create_rabbit_channel(&config.rabbitmq_url)
    .await
    .expect("Failed to create RabbitMQ channel");
  let queue = RabbitWorkQueue::new(rabbit_channel);

  let settings = CycleSettings {
    queue_name: CHECKS_QUEUE.to_string(),
    message_count: config.message_count,
    bucket_width_secs: config.bucket_width_secs,
  };

  let mut timer = interval(Duration::from_secs(config.bucket_width_secs as u64));
  timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

  loop {
    let tick = timer.tick().await;
    let trigger = TriggerInfo {
      fired_at: Utc::now(),
      past_due: tick.elapsed() > Duration::from_secs(1),
    };
    run_invocation(&store, &queue, &settings, trigger).await;
  }
}

async fn run_invocation(
  store: &PgAppendStore,
  queue: &RabbitWorkQueue,
  settings: &CycleSettings,
  trigger: TriggerInfo,
) {
  if trigger.past_due {
    info!("The timer is past due!");
  }
  info!("Timer trigger fired at: {}", trigger.fired_at);

  let invocation_id = Uuid::new_v4();
  let report = run_cycle(store, queue, trigger.fired_at, invocation_id, settings).await;

  let status = RunStatus::new("Scheduler", trigger.fired_at, Utc::now(), report.outcome)
    .with_trigger_data(serde_json::json!(report.enqueued));
  info!("Scheduler execution details: {}", status);
}
