use adneura::common::telemetry;
use adneura::config::settings::AppConfig;
use adneura::infrastructure::db::pool;
use adneura::infrastructure::queue::rabbitmq::RabbitMqService;
use adneura::infrastructure::redis::client::RedisService;
use adneura::workers::image_worker;
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init_tracing();

    let config = AppConfig::new().context("missing required environment variable")?;
    info!(queue = %config.image_queue, "Starting image worker process...");

    let db = pool::connect_to_db(&config.database_url).await?;
    let redis = RedisService::new(&config.redis_url).await?;
    let queue = RabbitMqService::new(&config.amqp_url).await?;

    let worker = image_worker::build_image_worker(&config, db, redis)?;
    image_worker::start_image_worker(queue, &config, Arc::new(worker)).await
}
