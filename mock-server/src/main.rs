use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let defaults = MockConfig::default();
    let config = MockConfig {
        service_plan_id: std::env::var("XMS_SERVICE_PLAN_ID").unwrap_or(defaults.service_plan_id),
        token: std::env::var("XMS_TOKEN").unwrap_or(defaults.token),
    };
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, plan = %config.service_plan_id, "listening");
    mock_server::run(listener, config).await
}
