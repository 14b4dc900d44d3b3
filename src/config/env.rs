use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    RedisUrl,
    AmqpUrl,
    OpenAiApiKey,
    OpenAiBaseUrl,
    ImageModel,
    ImageSize,
    ImageQuality,
    ImageDir,
    ImageUrlPrefix,
    ImageQueue,
    ImageMaxAttempts,
    ImageDefaultResetSecs,
    ImageRateLimitPerMinute,
    ResultTtlSecs,
    EmbeddedWorker,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::AmqpUrl => "AMQP_URL",
            EnvKey::OpenAiApiKey => "OPENAI_API_KEY",
            EnvKey::OpenAiBaseUrl => "OPENAI_BASE_URL",
            EnvKey::ImageModel => "IMAGE_MODEL",
            EnvKey::ImageSize => "IMAGE_SIZE",
            EnvKey::ImageQuality => "IMAGE_QUALITY",
            EnvKey::ImageDir => "IMAGE_DIR",
            EnvKey::ImageUrlPrefix => "IMAGE_URL_PREFIX",
            EnvKey::ImageQueue => "IMAGE_QUEUE",
            EnvKey::ImageMaxAttempts => "IMAGE_MAX_ATTEMPTS",
            EnvKey::ImageDefaultResetSecs => "IMAGE_DEFAULT_RESET_SECS",
            EnvKey::ImageRateLimitPerMinute => "IMAGE_RATE_LIMIT_PER_MINUTE",
            EnvKey::ResultTtlSecs => "RESULT_TTL_SECS",
            EnvKey::EmbeddedWorker => "EMBEDDED_WORKER",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Unset, empty, or unparsable values all read as `None`.
pub fn get_optional<T: FromStr>(key: EnvKey) -> Option<T> {
    get(key).ok().and_then(|val| val.trim().parse::<T>().ok())
}
