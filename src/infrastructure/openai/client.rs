use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::config::settings::AppConfig;

const RATE_LIMIT_CODE: &str = "rate_limit_exceeded";

#[derive(Debug, thiserror::Error)]
pub enum ImageApiError {
    /// The provider throttled the call. `retry_after` is its reset hint, if it sent one.
    #[error("rate limited by image API: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("image API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("image API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected image API response: {0}")]
    InvalidResponse(String),
}

/// Text-to-image provider. `generate` returns a short-lived asset URL that must be fetched right away.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ImageApiError>;

    async fn download(&self, url: &str) -> Result<Bytes, ImageApiError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiImageClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
    quality: String,
}

impl OpenAiImageClient {
    pub fn new(config: &AppConfig) -> Result<Self, ImageApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()?;

        info!(model = %config.image_model, "✅ Image API client ready");

        Ok(Self {
            http,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<String, ImageApiError> {
        let request = GenerationRequest {
            model: &self.model,
            prompt,
            size: &self.size,
            quality: &self.quality,
            n: 1,
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &body));
        }

        let parsed: GenerationResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .find_map(|image| image.url)
            .ok_or_else(|| ImageApiError::InvalidResponse("no image url in response".to_string()))
    }

    async fn download(&self, url: &str) -> Result<Bytes, ImageApiError> {
        let url = Url::parse(url)
            .map_err(|e| ImageApiError::InvalidResponse(format!("bad asset url: {}", e)))?;

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageApiError::Upstream {
                status: status.as_u16(),
                message: "asset download failed".to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!(size = bytes.len(), "Downloaded generated asset");
        Ok(bytes)
    }
}

/// Turns a non-2xx reply into a typed error. 429s and `rate_limit_exceeded` bodies are retryable.
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> ImageApiError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.error.code.clone());
    let message = parsed
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || code.as_deref() == Some(RATE_LIMIT_CODE) {
        return ImageApiError::RateLimited {
            retry_after: reset_hint(headers),
            message,
        };
    }

    ImageApiError::Upstream {
        status: status.as_u16(),
        message,
    }
}

fn reset_hint(headers: &HeaderMap) -> Option<Duration> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("x-ratelimit-reset-requests")
        .and_then(parse_reset_hint)
        .or_else(|| {
            header("retry-after-ms")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        })
        .or_else(|| header("retry-after").and_then(parse_reset_hint))
}

/// Parses reset hints such as `20`, `1.5`, `1s`, `250ms` or `6m0s`. Bare numbers are seconds.
pub fn parse_reset_hint(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(secs) = raw.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;

        let after = &rest[number_len..];
        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let seconds = match &after[..unit_len] {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            "ms" => value / 1000.0,
            _ => return None,
        };

        total = total.checked_add(Duration::try_from_secs_f64(seconds).ok()?)?;
        rest = &after[unit_len..];
    }

    Some(total)
}
