use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = MockConfig::default();
    if let Ok(account_id) = std::env::var("MOCK_ACCOUNT_ID") {
        config.account_id = account_id;
    }
    if let Ok(api_key) = std::env::var("MOCK_API_KEY") {
        config.api_key = api_key;
    }
    if let Ok(ref_ids) = std::env::var("MOCK_REF_IDS") {
        config.ref_ids = ref_ids.split(',').map(|s| s.trim().to_string()).collect();
    }

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, account_id = %config.account_id, "mock FirstPromoter listening");
    mock_server::run(listener, config).await
}
