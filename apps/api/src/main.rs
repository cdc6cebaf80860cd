mod config;
mod db;
mod errors;
mod evaluation;
mod extraction;
mod jobs;
mod llm_client;
mod models;
mod responses;
mod retry;
mod routes;
mod schema;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod transcription;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::extraction::PdfTextExtractor;
use crate::jobs::lease::RedisLocks;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::{AppState, Collaborators};
use crate::storage::blobs::S3BlobStore;
use crate::storage::postgres::PgStore;
use crate::transcription::whisper::WhisperClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rehearse API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize Redis (generation leases)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize collaborators
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.collaborator_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let whisper = WhisperClient::new(
        config.openai_api_key.clone(),
        config.whisper_model.clone(),
        config.collaborator_timeout,
    )?;
    info!("Transcription client initialized (model: {})", config.whisper_model);

    let collaborators = Collaborators {
        store: Arc::new(PgStore::new(db)),
        blobs: Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone())),
        extractor: Arc::new(PdfTextExtractor),
        llm: Arc::new(llm),
        transcriber: Arc::new(whisper),
        locks: Arc::new(RedisLocks::new(redis, config.generation_lease)),
    };

    // Build app state
    let state = AppState::new(config.clone(), collaborators);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "rehearse-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
