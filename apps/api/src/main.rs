mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::evaluator::ScreeningEvaluator;
use crate::interview::question_bank::QuestionBank;
use crate::interview::session::InterviewServices;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{JsonFileStore, PgSessionStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Session store: Postgres when DATABASE_URL is set, JSON files otherwise
    let store: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => {
            let store = PgSessionStore::new(create_pool(url).await?);
            store.ensure_schema().await?;
            info!("Session records stored in PostgreSQL");
            Arc::new(store)
        }
        None => {
            info!(
                "Session records stored under {}",
                config.candidates_dir.display()
            );
            Arc::new(JsonFileStore::new(config.candidates_dir.clone()))
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let services = Arc::new(InterviewServices {
        reasoning: Arc::new(llm),
        store,
        question_bank: QuestionBank::default(),
        evaluator: ScreeningEvaluator::new(config.screen_in_threshold, config.llm_retry_backoff),
        min_questions: config.min_questions,
        max_questions: config.max_questions,
        retry_backoff: config.llm_retry_backoff,
    });
    info!(
        "Screening threshold {:.1}, {}..={} technical questions",
        config.screen_in_threshold, config.min_questions, config.max_questions
    );

    // Build app state
    let state = AppState::new(config.clone(), services);
    Arc::clone(&state.sessions).spawn_sweeper(config.session_sweep_interval);

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
