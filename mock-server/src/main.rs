use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = MockConfig::default();
    let config = MockConfig {
        user: std::env::var("MOCK_USER").unwrap_or(defaults.user),
        password: std::env::var("MOCK_PASSWORD").unwrap_or(defaults.password),
        csrf_token: std::env::var("MOCK_CSRF_TOKEN").unwrap_or(defaults.csrf_token),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, user = %config.user, "mock workflow server listening");
    mock_server::run(listener, config).await
}
