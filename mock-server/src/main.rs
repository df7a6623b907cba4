use mock_server::{AppState, MockConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let defaults = MockConfig::default();
    let config = MockConfig {
        app_key: std::env::var("MOCK_APP_KEY").unwrap_or(defaults.app_key),
        app_secret: std::env::var("MOCK_APP_SECRET").unwrap_or(defaults.app_secret),
    };

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, app_key = %config.app_key, "mock Airship API listening");
    mock_server::run(listener, AppState::new(config)).await
}
