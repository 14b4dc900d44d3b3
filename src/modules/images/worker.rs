//! Executes one image job end to end:
//! `received -> generating -> (succeeded | retrying -> generating | failed)`.
//!
//! Jobs are fire-and-forget. Every outcome is logged and written to the result
//! backend, but nothing is raised back to the queue and nothing is re-enqueued.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::job::{ImageJob, JobRecord, JobState};
use super::persistence::ImageReferenceStore;
use super::queue::ResultBackend;
use crate::config::settings::RetryPolicy;
use crate::infrastructure::openai::client::{ImageApiError, ImageGenerator};
use crate::infrastructure::storage::local::ContentStore;

/// Server-side framing applied to every caller prompt.
pub fn wrap_prompt(prompt: &str) -> String {
    format!(
        "Create a widescreen, 16:9, photorealistic, photographic image using this reference: {}.",
        prompt.trim()
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// Asset written to the content directory. `persisted` is false when the
    /// owning entity was gone or the database write failed.
    Stored {
        file_name: String,
        persisted: bool,
        attempts: u32,
    },
    /// Every attempt was rate limited.
    Exhausted { attempts: u32 },
    /// Non-retryable error from the API, the download, or the disk.
    Failed { error: String, attempts: u32 },
}

impl JobOutcome {
    /// Exhaustion reports `SUCCESS` with no result: the job returned normally without an image.
    pub fn to_record(&self) -> JobRecord {
        match self {
            JobOutcome::Stored {
                file_name,
                attempts,
                ..
            } => JobRecord::new(JobState::Success, Some(file_name.clone()), *attempts),
            JobOutcome::Exhausted { attempts } => JobRecord::new(JobState::Success, None, *attempts),
            JobOutcome::Failed { error, attempts } => {
                JobRecord::new(JobState::Failure, Some(error.clone()), *attempts)
            }
        }
    }
}

enum Generation {
    Ready { url: String, attempts: u32 },
    Exhausted { attempts: u32 },
    Failed { error: ImageApiError, attempts: u32 },
}

pub struct ImageWorker {
    generator: Arc<dyn ImageGenerator>,
    store: ContentStore,
    references: Arc<dyn ImageReferenceStore>,
    results: Arc<dyn ResultBackend>,
    policy: RetryPolicy,
}

impl ImageWorker {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        store: ContentStore,
        references: Arc<dyn ImageReferenceStore>,
        results: Arc<dyn ResultBackend>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            store,
            references,
            results,
            policy,
        }
    }

    pub async fn run(&self, job_id: Uuid, job: &ImageJob) -> JobOutcome {
        info!(%job_id, file_name = %job.file_name, kind = %job.entity_kind, "🖼️ Received image job");
        self.report(job_id, JobRecord::new(JobState::Started, None, 0)).await;

        let outcome = self.execute(job_id, job).await;

        self.report(job_id, outcome.to_record()).await;
        outcome
    }

    async fn execute(&self, job_id: Uuid, job: &ImageJob) -> JobOutcome {
        let (url, attempts) = match self.generate_with_backoff(job_id, job).await {
            Generation::Ready { url, attempts } => (url, attempts),
            Generation::Exhausted { attempts } => {
                warn!(%job_id, file_name = %job.file_name, attempts, "Image generation gave up after repeated rate limits");
                return JobOutcome::Exhausted { attempts };
            }
            Generation::Failed { error, attempts } => {
                error!(%job_id, file_name = %job.file_name, attempts, "❌ Image generation failed: {}", error);
                return JobOutcome::Failed {
                    error: error.to_string(),
                    attempts,
                };
            }
        };

        let bytes = match self.generator.download(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%job_id, file_name = %job.file_name, "❌ Failed to download generated image: {}", e);
                return JobOutcome::Failed {
                    error: e.to_string(),
                    attempts,
                };
            }
        };

        if let Err(e) = self.store.write(&job.file_name, &bytes).await {
            error!(%job_id, file_name = %job.file_name, "❌ Failed to store generated image: {}", e);
            return JobOutcome::Failed {
                error: e.to_string(),
                attempts,
            };
        }

        let persisted = match self
            .references
            .set_image_reference(job.entity_kind, job.entity_id, &job.file_name)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                error!(%job_id, file_name = %job.file_name, "❌ Failed to save image reference: {}", e);
                false
            }
        };

        info!(%job_id, file_name = %job.file_name, persisted, "✅ Image job completed");
        JobOutcome::Stored {
            file_name: job.file_name.clone(),
            persisted,
            attempts,
        }
    }

    /// Calls the API until it answers, sleeping out each rate limit.
    /// Any other error ends the loop at once.
    async fn generate_with_backoff(&self, job_id: Uuid, job: &ImageJob) -> Generation {
        let prompt = wrap_prompt(&job.prompt);
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            info!(%job_id, file_name = %job.file_name, attempt, "Generating image");
            let started = Instant::now();

            match self.generator.generate(&prompt).await {
                Ok(url) => {
                    info!(
                        %job_id,
                        file_name = %job.file_name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Image generated"
                    );
                    return Generation::Ready {
                        url,
                        attempts: attempt,
                    };
                }
                Err(ImageApiError::RateLimited {
                    retry_after,
                    message,
                }) => {
                    let delay = retry_after.unwrap_or(self.policy.default_reset);
                    warn!(
                        %job_id,
                        attempt,
                        max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        "Rate limited by image API: {}", message
                    );

                    if attempt == max_attempts {
                        break;
                    }

                    self.report(job_id, JobRecord::new(JobState::Retry, None, attempt))
                        .await;
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    return Generation::Failed {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }

        Generation::Exhausted {
            attempts: max_attempts,
        }
    }

    async fn report(&self, job_id: Uuid, record: JobRecord) {
        if let Err(e) = self.results.store(job_id, &record).await {
            warn!(%job_id, state = ?record.state, "Failed to record job state: {}", e);
        }
    }
}
