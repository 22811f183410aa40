//! # chatvault-server
//!
//! Webhook receiver for a LINE Messaging API bot that archives
//! conversation activity:
//! - **Message records** (with per-conversation case tagging) into a
//!   SQLite-backed document store
//! - **Media content** (images, video, audio, files) into a local media
//!   store addressed by public URL
//! - **User profiles** on first contact, membership change, and
//!   self-introduction
//!
//! One HTTP endpoint, synchronous processing, fire-and-acknowledge
//! delivery semantics.

mod config;
mod error;
mod handlers;
mod media;
mod normalize;
mod webhook;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatvault_line::LineClient;
use chatvault_store::Database;

use crate::config::ServerConfig;
use crate::media::MediaStore;
use crate::webhook::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chatvault_server=debug")),
        )
        .init();

    info!("Starting chatvault webhook server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env()?;
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        media = %config.media_storage_path.display(),
        left_member_policy = ?config.left_member_policy,
        case_tagging = config.case_tagging,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Archive database (runs migrations)
    let store = Database::open(&config.database_path)?;

    // Media store (creates directory if missing)
    let media = MediaStore::new(
        config.media_storage_path.clone(),
        config.media_bucket.clone(),
        config.media_public_base_url.clone(),
    )
    .await?;

    // Outbound platform client
    let line = LineClient::with_bases(
        config.access_token.clone(),
        config.api_base.clone(),
        config.data_base.clone(),
    );

    let http_addr = config.http_addr;
    let state = AppState {
        config: Arc::new(config),
        line: Arc::new(line),
        store: Arc::new(Mutex::new(store)),
        media: Arc::new(media),
    };

    // -----------------------------------------------------------------------
    // 4. Run the webhook server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = webhook::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
