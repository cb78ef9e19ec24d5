//! costwatch_server — standalone REST server for the Costwatch assistant.
//!
//! Reads config from env vars:
//!   COSTWATCH_DATABASE_URL     — Postgres connection string (required)
//!   COSTWATCH_JWT_SECRET       — JWT HMAC secret (required)
//!   COSTWATCH_BIND_ADDR        — listen address (default: 0.0.0.0:4200)
//!   COSTWATCH_CHAT_DEADLINE_MS — per-LLM-call deadline (default: 30000)
//!   OPENAI_API_KEY             — chat model credential (required)

use std::sync::Arc;
use std::time::Duration;

use costwatch_agent::{ChatPipeline, LlmClient, OpenAiClient};
use costwatch_core::executor::QueryExecutor;
use costwatch_core::ports::ReadStore;
use costwatch_postgres::PgReadStore;
use costwatch_server::middleware::jwt::JwtConfig;
use costwatch_server::router::build_router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,costwatch_server=debug".into()),
        )
        .init();

    // Read config from environment
    let database_url =
        std::env::var("COSTWATCH_DATABASE_URL").expect("COSTWATCH_DATABASE_URL must be set");
    let jwt_secret =
        std::env::var("COSTWATCH_JWT_SECRET").expect("COSTWATCH_JWT_SECRET must be set");
    let bind_addr =
        std::env::var("COSTWATCH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4200".into());
    let chat_deadline_ms: u64 = std::env::var("COSTWATCH_CHAT_DEADLINE_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30_000);

    // Create PgPool
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("Connected to database");

    // Wire the core over the Postgres port implementation
    let store: Arc<dyn ReadStore> = Arc::new(PgReadStore::new(pool));
    let executor = Arc::new(QueryExecutor::new(store));

    // Chat pipeline with its per-call deadline
    let llm: Arc<dyn LlmClient> =
        Arc::new(OpenAiClient::from_env().expect("OPENAI_API_KEY must be set"));
    let pipeline = Arc::new(ChatPipeline::new(
        llm,
        Arc::clone(&executor),
        Duration::from_millis(chat_deadline_ms),
    ));

    let jwt_config = JwtConfig::from_secret(jwt_secret.as_bytes());
    let app = build_router(executor, pipeline, jwt_config);

    // Bind and serve
    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_addr}: {e}"));
    tracing::info!("costwatch_server listening on {bind_addr}");

    axum::serve(listener, app).await.expect("server error");
}
