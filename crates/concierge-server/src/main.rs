use tracing_subscriber::EnvFilter;

use concierge_core::Config;
use concierge_server::app_state::AppState;
use concierge_server::router::create_router;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(config).expect("Failed to build application state");
    let app = create_router(state);

    tracing::info!("Concierge server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server error");
}
