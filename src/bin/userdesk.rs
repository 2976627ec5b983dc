use userdesk::client::{console, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "userdesk=warn".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = ClientConfig::from_env();
    console::run(config).await
}
