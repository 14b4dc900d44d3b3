use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::job::{ImageJob, JobRecord, QueuedJob};
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::redis::client::RedisService;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to encode job: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("broker error: {0}")]
    Broker(String),

    #[error("result backend error: {0}")]
    Backend(String),
}

/// Accepts a job and returns its id once the broker has it. Delivery is at-least-once.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: ImageJob) -> Result<Uuid, QueueError>;
}

/// Where workers report job progress and where status queries read it back.
#[async_trait]
pub trait ResultBackend: Send + Sync {
    async fn store(&self, job_id: Uuid, record: &JobRecord) -> Result<(), QueueError>;

    async fn load(&self, job_id: Uuid) -> Result<Option<JobRecord>, QueueError>;
}

pub struct AmqpJobQueue {
    broker: RabbitMqService,
    queue_name: String,
}

impl AmqpJobQueue {
    pub fn new(broker: RabbitMqService, queue_name: impl Into<String>) -> Self {
        Self {
            broker,
            queue_name: queue_name.into(),
        }
    }
}

#[async_trait]
impl JobQueue for AmqpJobQueue {
    async fn enqueue(&self, job: ImageJob) -> Result<Uuid, QueueError> {
        let id = Uuid::new_v4();
        let file_name = job.file_name.clone();
        let message = QueuedJob {
            id,
            job,
            enqueued_at: OffsetDateTime::now_utc(),
        };
        let payload = serde_json::to_vec(&message)?;

        self.broker
            .publish(&self.queue_name, &id.to_string(), &payload)
            .await
            .map_err(|e| QueueError::Broker(e.to_string()))?;

        info!(job_id = %id, %file_name, queue = %self.queue_name, "📨 Queued image job");
        Ok(id)
    }
}

pub struct RedisResultBackend {
    redis: RedisService,
    ttl: Duration,
}

impl RedisResultBackend {
    pub fn new(redis: RedisService, ttl: Duration) -> Self {
        Self { redis, ttl }
    }

    fn key(job_id: Uuid) -> String {
        format!("image_job:{}", job_id)
    }
}

#[async_trait]
impl ResultBackend for RedisResultBackend {
    async fn store(&self, job_id: Uuid, record: &JobRecord) -> Result<(), QueueError> {
        let value = serde_json::to_string(record)?;

        self.redis
            .set_ex(&Self::key(job_id), &value, self.ttl.as_secs().max(1))
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        debug!(job_id = %job_id, state = ?record.state, "Recorded job state");
        Ok(())
    }

    async fn load(&self, job_id: Uuid) -> Result<Option<JobRecord>, QueueError> {
        let raw = self
            .redis
            .get(&Self::key(job_id))
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// Consumer-side throttle: spaces job starts on one worker by a fixed interval.
/// Independent of whatever limits the upstream API applies.
#[derive(Debug)]
pub struct ConsumptionLimiter {
    interval: Option<Duration>,
    next_slot: Option<Instant>,
}

impl ConsumptionLimiter {
    pub fn unlimited() -> Self {
        Self {
            interval: None,
            next_slot: None,
        }
    }

    /// `None` or `0` disables the limit.
    pub fn per_minute(jobs: Option<u32>) -> Self {
        match jobs {
            Some(n) if n > 0 => Self {
                interval: Some(Duration::from_secs(60) / n),
                next_slot: None,
            },
            _ => Self::unlimited(),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Waits for the next free slot, then books the one after it.
    pub async fn acquire(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };

        if let Some(slot) = self.next_slot {
            tokio::time::sleep_until(slot).await;
        }

        self.next_slot = Some(Instant::now() + interval);
    }
}
