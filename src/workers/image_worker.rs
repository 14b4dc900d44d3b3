use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::openai::client::OpenAiImageClient;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::local::ContentStore;
use crate::modules::images::job::QueuedJob;
use crate::modules::images::persistence::PgImageReferences;
use crate::modules::images::queue::{ConsumptionLimiter, RedisResultBackend};
use crate::modules::images::worker::ImageWorker;
use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use lapin::message::Delivery;
use lapin::options::BasicAckOptions;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// One message handed out by the broker.
#[async_trait]
pub trait JobDelivery: Send + Sized {
    fn payload(&self) -> &[u8];

    fn redelivered(&self) -> bool;

    async fn ack(self) -> anyhow::Result<()>;
}

#[async_trait]
impl JobDelivery for Delivery {
    fn payload(&self) -> &[u8] {
        &self.data
    }

    fn redelivered(&self) -> bool {
        self.redelivered
    }

    async fn ack(self) -> anyhow::Result<()> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(|e| anyhow!("{}", e))
    }
}

pub fn build_image_worker(
    config: &AppConfig,
    db: DbPool,
    redis: RedisService,
) -> anyhow::Result<ImageWorker> {
    let generator = OpenAiImageClient::new(config)?;

    Ok(ImageWorker::new(
        Arc::new(generator),
        ContentStore::new(&config.image_dir),
        Arc::new(PgImageReferences::new(db)),
        Arc::new(RedisResultBackend::new(redis, config.result_ttl())),
        config.retry_policy(),
    ))
}

pub async fn start_image_worker(
    queue: RabbitMqService,
    config: &AppConfig,
    worker: Arc<ImageWorker>,
) -> anyhow::Result<()> {
    info!("🖼️ Starting image worker...");

    let queue_name = config.image_queue.as_str();
    let consumer_tag = format!("image_worker_{}", Uuid::new_v4().simple());
    let consumer = queue.consume(queue_name, &consumer_tag, 1).await?;
    let limiter = ConsumptionLimiter::per_minute(config.image_rate_limit_per_minute);

    info!(
        consumer_tag = %consumer_tag,
        rate_limit_per_minute = ?config.image_rate_limit_per_minute,
        "🖼️ Image worker listening on '{}'", queue_name
    );

    consume_jobs(consumer, queue_name, &worker, limiter).await
}

/// Runs deliveries one at a time. Never returns `Ok`: a closed or broken
/// stream is an error, so the process exits non-zero and gets restarted.
///
/// A delivery is acked only after its job has run, so a crash mid-job means
/// the broker hands it out again.
pub async fn consume_jobs<S, D, E>(
    mut deliveries: S,
    queue_name: &str,
    worker: &ImageWorker,
    mut limiter: ConsumptionLimiter,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<D, E>> + Unpin,
    D: JobDelivery,
    E: Display,
{
    while let Some(delivery) = deliveries.next().await {
        let delivery = delivery.map_err(|e| anyhow!("Consumer stream failed: {}", e))?;

        if delivery.redelivered() {
            warn!("📦 Redelivered image job, running it again");
        }

        match serde_json::from_slice::<QueuedJob>(delivery.payload()) {
            Ok(queued) => {
                limiter.acquire().await;
                let outcome = worker.run(queued.id, &queued.job).await;
                info!(job_id = %queued.id, ?outcome, "Image job finished");
            }
            Err(e) => {
                // Unparsable payloads are dropped; redelivering them would fail the same way.
                error!("❌ Failed to parse image job: {}", e);
            }
        }

        if let Err(e) = delivery.ack().await {
            error!("Failed to ack message: {}", e);
        }
    }

    Err(anyhow!("Consumer stream for '{}' closed", queue_name))
}
