use adneura::app;
use adneura::common::telemetry;
use adneura::config::settings::AppConfig;
use adneura::infrastructure::db::pool;
use adneura::infrastructure::queue::rabbitmq::RabbitMqService;
use adneura::infrastructure::redis::client::RedisService;
use adneura::modules::images::dispatcher::ImageDispatcher;
use adneura::modules::images::persistence::PgCandidateSource;
use adneura::modules::images::queue::{AmqpJobQueue, RedisResultBackend};
use adneura::modules::images::status::StatusService;
use adneura::state::AppState;
use adneura::workers::image_worker;
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    telemetry::init_tracing();

    info!("Starting server...");

    let config = AppConfig::new().context("missing required environment variable")?;

    let db = pool::connect_to_db(&config.database_url).await?;
    pool::run_migrations(&db).await?;

    let redis = RedisService::new(&config.redis_url).await?;
    let queue = RabbitMqService::new(&config.amqp_url).await?;

    if config.embedded_worker {
        let worker = image_worker::build_image_worker(&config, db.clone(), redis.clone())?;
        let worker_queue = queue.clone();
        let worker_config = config.clone();
        tokio::spawn(async move {
            if let Err(e) =
                image_worker::start_image_worker(worker_queue, &worker_config, Arc::new(worker)).await
            {
                error!("Embedded image worker stopped: {}", e);
            }
        });
    }

    let dispatcher = ImageDispatcher::new(
        Arc::new(PgCandidateSource::new(db.clone())),
        Arc::new(AmqpJobQueue::new(queue, config.image_queue.clone())),
    );
    let statuses = StatusService::new(Arc::new(RedisResultBackend::new(
        redis,
        config.result_ttl(),
    )));

    let port = config.server_port;
    let state = AppState::new(config, dispatcher, statuses);
    let app = app::create_app(state).await;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
