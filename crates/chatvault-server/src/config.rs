//! Server configuration loaded from environment variables.
//!
//! Everything except the two platform credentials has a default so the
//! server can start with minimal configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use chatvault_store::LeftMemberPolicy;
use thiserror::Error;

/// Configuration problems that prevent startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) webhook server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Channel secret used to verify webhook signatures.
    /// Env: `SECRET_KEY` (required)
    pub channel_secret: String,

    /// Bearer token for outbound Messaging API calls.
    /// Env: `CHANNEL_ACCESS_TOKEN` (required)
    pub access_token: String,

    /// Messaging API base URL.
    /// Env: `SERVER_URL`
    /// Default: `https://api.line.me`
    pub api_base: String,

    /// Message content download base URL.
    /// Env: `DATA_URL`
    /// Default: `https://api-data.line.me`
    pub data_base: String,

    /// Filesystem path of the archive database.
    /// Env: `DATABASE_PATH`
    /// Default: `./chatvault.db`
    pub database_path: PathBuf,

    /// Filesystem path under which media objects are stored.
    /// Env: `MEDIA_STORAGE_PATH`
    /// Default: `./media`
    pub media_storage_path: PathBuf,

    /// Bucket segment used in public media URLs.
    /// Env: `MEDIA_BUCKET`
    /// Default: `chatvault-media-public`
    pub media_bucket: String,

    /// Base of public media URLs (`<base>/<bucket>/<object path>`).
    /// Env: `MEDIA_PUBLIC_BASE_URL`
    /// Default: `https://storage.googleapis.com`
    pub media_public_base_url: String,

    /// What happens to a member's profile document when they leave a
    /// group: `soft` keeps it and flips its status, `hard` deletes it.
    /// Env: `MEMBER_LEFT_POLICY` (soft/hard)
    /// Default: `soft`
    pub left_member_policy: LeftMemberPolicy,

    /// Whether the case-start and self-introduction text commands are
    /// recognized.
    /// Env: `CASE_TAGGING` (true/false)
    /// Default: `true`
    pub case_tagging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            channel_secret: String::new(),
            access_token: String::new(),
            api_base: chatvault_line::client::DEFAULT_API_BASE.to_string(),
            data_base: chatvault_line::client::DEFAULT_DATA_BASE.to_string(),
            database_path: PathBuf::from("./chatvault.db"),
            media_storage_path: PathBuf::from("./media"),
            media_bucket: "chatvault-media-public".to_string(),
            media_public_base_url: "https://storage.googleapis.com".to_string(),
            left_member_policy: LeftMemberPolicy::Soft,
            case_tagging: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults. Fails only when a credential is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        config.channel_secret =
            std::env::var("SECRET_KEY").map_err(|_| ConfigError::Missing("SECRET_KEY"))?;
        config.access_token = std::env::var("CHANNEL_ACCESS_TOKEN")
            .map_err(|_| ConfigError::Missing("CHANNEL_ACCESS_TOKEN"))?;

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(url) = std::env::var("SERVER_URL") {
            config.api_base = url;
        }

        if let Ok(url) = std::env::var("DATA_URL") {
            config.data_base = url;
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("MEDIA_STORAGE_PATH") {
            config.media_storage_path = PathBuf::from(path);
        }

        if let Ok(bucket) = std::env::var("MEDIA_BUCKET") {
            config.media_bucket = bucket;
        }

        if let Ok(url) = std::env::var("MEDIA_PUBLIC_BASE_URL") {
            config.media_public_base_url = url;
        }

        if let Ok(policy) = std::env::var("MEMBER_LEFT_POLICY") {
            match policy.parse::<LeftMemberPolicy>() {
                Ok(parsed) => config.left_member_policy = parsed,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid MEMBER_LEFT_POLICY, using default");
                }
            }
        }

        if let Ok(val) = std::env::var("CASE_TAGGING") {
            config.case_tagging = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.api_base, "https://api.line.me");
        assert_eq!(config.left_member_policy, LeftMemberPolicy::Soft);
        assert!(config.case_tagging);
    }
}
