use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    /// Result backend for job status records.
    pub redis_url: String,
    /// Broker holding queued image jobs.
    pub amqp_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
    pub image_dir: PathBuf,
    pub image_url_prefix: String,
    pub image_queue: String,
    pub image_max_attempts: u32,
    pub image_default_reset_secs: u64,
    pub image_rate_limit_per_minute: Option<u32>,
    pub result_ttl_secs: u64,
    pub embedded_worker: bool,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            redis_url: env::get(EnvKey::RedisUrl)?,
            amqp_url: env::get(EnvKey::AmqpUrl)?,
            openai_api_key: env::get(EnvKey::OpenAiApiKey)?,
            openai_base_url: env::get_or(EnvKey::OpenAiBaseUrl, "https://api.openai.com/v1"),
            image_model: env::get_or(EnvKey::ImageModel, "dall-e-3"),
            image_size: env::get_or(EnvKey::ImageSize, "1792x1024"),
            image_quality: env::get_or(EnvKey::ImageQuality, "hd"),
            image_dir: PathBuf::from(env::get_or(EnvKey::ImageDir, "./images")),
            image_url_prefix: env::get_or(EnvKey::ImageUrlPrefix, "/images"),
            image_queue: env::get_or(EnvKey::ImageQueue, "image_generation"),
            image_max_attempts: env::get_parsed(EnvKey::ImageMaxAttempts, 5),
            image_default_reset_secs: env::get_parsed(EnvKey::ImageDefaultResetSecs, 60),
            image_rate_limit_per_minute: env::get_optional(EnvKey::ImageRateLimitPerMinute),
            result_ttl_secs: env::get_parsed(EnvKey::ResultTtlSecs, 86_400),
            embedded_worker: env::get_parsed(EnvKey::EmbeddedWorker, false),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.image_max_attempts.max(1),
            default_reset: Duration::from_secs(self.image_default_reset_secs),
        }
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}

/// Bounds on how the worker retries a rate-limited image request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls to the image API per job, first attempt included.
    pub max_attempts: u32,
    /// Sleep used when the API gives no reset hint.
    pub default_reset: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            default_reset: Duration::from_secs(60),
        }
    }
}
