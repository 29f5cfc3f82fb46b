/// inkpost - multi-user content publishing backend
///
/// Accounts register with email OTP verification, sessions run on an
/// access/refresh token pair, and posts belong to their authors.

mod account;
mod api;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod mailer;
mod server;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
