//! ============================================================================
//! Config - Environment-driven settings for the auth server and poster
//! ============================================================================
//! CLIENT_ID / CLIENT_SECRET / CALLBACK_URL / SESSION_SECRET come from the
//! environment (a `.env` file is loaded by the binaries before this runs).
//! AUTH_DATA_PATH overrides where the credential bundle lives.
//! ============================================================================

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::warn;

/// Port the auth server listens on
pub const DEFAULT_PORT: u16 = 3000;

/// Credential file name, relative to the working directory
pub const DEFAULT_AUTH_DATA_FILE: &str = "authData.json";

/// Fallback cookie-signing secret. Only acceptable for a local single-user tool.
pub const INSECURE_SESSION_SECRET: &str =
    "a_really_long_secret_key_for_session_management_that_is_32_chars_long";

/// Settings for the OAuth client and the auth server
#[derive(Debug, Clone)]
pub struct AuthServerConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub callback_url: String,
    pub session_secret: String,
    pub port: u16,
    pub auth_data_path: PathBuf,
}

impl AuthServerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = non_empty("CLIENT_ID")
            .ok_or_else(|| anyhow!("CLIENT_ID not set. Configure it in .env or the Developer Portal."))?;
        let callback_url = non_empty("CALLBACK_URL")
            .ok_or_else(|| anyhow!("CALLBACK_URL not set. It must match the app's registered redirect URI."))?;
        url::Url::parse(&callback_url)
            .map_err(|e| anyhow!("CALLBACK_URL is not a valid URL: {}", e))?;

        let session_secret = match non_empty("SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("SESSION_SECRET not set, falling back to the built-in insecure secret");
                INSECURE_SESSION_SECRET.to_string()
            }
        };

        Ok(Self {
            client_id,
            client_secret: non_empty("CLIENT_SECRET"),
            callback_url,
            session_secret,
            port: DEFAULT_PORT,
            auth_data_path: auth_data_path_from(non_empty("AUTH_DATA_PATH")),
        })
    }
}

fn auth_data_path_from(value: Option<String>) -> PathBuf {
    value
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_AUTH_DATA_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_full_config() {
        let config = AuthServerConfig::from_lookup(lookup(&[
            ("CLIENT_ID", "cid"),
            ("CLIENT_SECRET", "secret"),
            ("CALLBACK_URL", "http://localhost:3000/callback"),
            ("SESSION_SECRET", "s3cr3t"),
            ("AUTH_DATA_PATH", "/tmp/creds.json"),
        ]))
        .unwrap();

        assert_eq!(config.client_id, "cid");
        assert_eq!(config.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.session_secret, "s3cr3t");
        assert_eq!(config.port, 3000);
        assert_eq!(config.auth_data_path, PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn test_defaults() {
        let config = AuthServerConfig::from_lookup(lookup(&[
            ("CLIENT_ID", "cid"),
            ("CALLBACK_URL", "http://localhost:3000/callback"),
        ]))
        .unwrap();

        assert!(config.client_secret.is_none());
        assert_eq!(config.session_secret, INSECURE_SESSION_SECRET);
        assert_eq!(config.auth_data_path, PathBuf::from("authData.json"));
    }

    #[test]
    fn test_missing_client_id() {
        let err = AuthServerConfig::from_lookup(lookup(&[(
            "CALLBACK_URL",
            "http://localhost:3000/callback",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("CLIENT_ID"));
    }

    #[test]
    fn test_invalid_callback_url() {
        let result = AuthServerConfig::from_lookup(lookup(&[
            ("CLIENT_ID", "cid"),
            ("CALLBACK_URL", "not a url"),
        ]));
        assert!(result.is_err());
    }
}
