//! # Order Console
//!
//! Admin backend for an e-commerce platform: order lifecycle and exchange
//! transitions, plus product catalog maintenance, all delegated to an
//! external order service.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - `handlers` validate transitions and drafts before anything leaves the process
//! - `service::ApiClient` talks to the order service with reqwest

use tracing::info;

use order_console::config::ConsoleConfig;
use order_console::service::ApiClient;
use order_console::{create_app, ConsoleState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_console=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting order console");

    let config = ConsoleConfig::from_env()?;
    let client = ApiClient::new(&config)?;
    info!("Using order service at {}", client.base_url());

    let app = create_app(ConsoleState::new(client));

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
