// ============================================================================
// auth-server: local OAuth 2.0 + PKCE login for the X API
// ============================================================================
// Usage:
//   auth-server            Listen on http://localhost:3000
//
// Open http://localhost:3000/ in a browser, approve the app, and the
// credential bundle lands in ./authData.json (or AUTH_DATA_PATH).
// ============================================================================

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tweetgate_core::{
    AuthFlow, AuthServer, AuthServerConfig, FileCredentialStore, SessionStore, TwitterOAuth,
};

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,tweetgate_core=debug,auth_server=debug")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    init_logging();

    let config = AuthServerConfig::from_env()?;
    if config.client_secret.is_none() {
        warn!("CLIENT_SECRET not set, using public-client PKCE only");
    }

    let provider = Arc::new(TwitterOAuth::from_config(&config));
    let store = Arc::new(FileCredentialStore::new(config.auth_data_path.clone()));
    let sessions = SessionStore::new(&config.session_secret)?;
    let flow = AuthFlow::new(provider, store, sessions);

    let server = AuthServer::bind(&format!("127.0.0.1:{}", config.port), flow)?;
    info!("Server is running on http://localhost:{}", config.port);
    info!(
        "Credentials will be written to {}",
        config.auth_data_path.display()
    );

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down auth server");
            shutdown.shutdown();
        }
    });

    let runtime = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || server.serve(runtime))
        .await
        .map_err(|e| anyhow!("Server thread failed: {}", e))?
}
