mod configuration;
mod error;
mod routes;
mod state;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("murmur=info,murmur_server=info,tower_http=info")
        }))
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;
    let state = state::AppState::from_settings(&settings)?;
    if state.api_key.resolve().is_err() {
        tracing::warn!(
            "No API key configured; chat requests will fail until {} is set",
            settings.provider.api_key_env
        );
    }

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!(
        model = %settings.provider.model,
        "listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
