use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use eventura_api::api::{create_router, AppState};
use eventura_api::config::Config;
use eventura_api::services::GeminiClient;
use eventura_api::store::{KeyedStore, MemoryStore, RedisStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn KeyedStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Using Redis store");
            Arc::new(RedisStore::connect(url).await?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, recommendations fall back to raw interests");
    }
    let generator = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
    ));

    let state = AppState::new(store, generator);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
