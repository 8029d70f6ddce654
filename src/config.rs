//! App configuration
//!
//! [`AppConfig`] accepts the SDK's config object as-is: the one key this
//! crate understands is `pocketbaseUrl`, every other key is kept in
//! [`AppConfig::extra`] for callers that read it back.
//!
//! [`injected_config`] is the process-wide default config, read once from
//! the environment. It names the local backend address when nothing else
//! does.

use crate::error::FirebaseError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Address used when the config names none
pub const DEFAULT_POCKETBASE_URL: &str = "http://127.0.0.1:8090";

/// Environment variable holding a JSON config object
pub const FIREBASE_CONFIG_ENV: &str = "FIREBASE_CONFIG";

/// Environment variable overriding the backend address
pub const POCKETBASE_URL_ENV: &str = "POCKETBASE_URL";

static INJECTED_CONFIG: Lazy<AppConfig> =
    Lazy::new(|| config_from_lookup(|key| std::env::var(key).ok()));

/// App configuration object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// PocketBase server address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pocketbase_url: Option<String>,

    /// Every other key of the original config object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    /// Empty config (targets [`DEFAULT_POCKETBASE_URL`])
    pub fn new() -> Self {
        Self::default()
    }

    /// Config pointing at `url`
    pub fn with_pocketbase_url(url: impl Into<String>) -> Self {
        Self {
            pocketbase_url: Some(url.into()),
            extra: Map::new(),
        }
    }

    /// Parse a JSON config object
    pub fn from_json(raw: &str) -> Result<Self, FirebaseError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Address the client should connect to
    ///
    /// An empty `pocketbase_url` counts as absent.
    pub fn target_url(&self) -> &str {
        match self.pocketbase_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_POCKETBASE_URL,
        }
    }
}

/// Process-wide default config
///
/// Built on first use from `FIREBASE_CONFIG` (a JSON object) with
/// `POCKETBASE_URL` taking precedence for the address. Falls back to
/// `{"pocketbaseUrl": "http://127.0.0.1:8090"}`.
pub fn injected_config() -> &'static AppConfig {
    &INJECTED_CONFIG
}

pub(crate) fn config_from_lookup<F>(lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(FIREBASE_CONFIG_ENV) {
        None => AppConfig::default(),
        Some(raw) => AppConfig::from_json(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring malformed {}", FIREBASE_CONFIG_ENV);
            AppConfig::default()
        }),
    };

    if let Some(url) = lookup(POCKETBASE_URL_ENV).filter(|url| !url.is_empty()) {
        config.pocketbase_url = Some(url);
    }
    if config.pocketbase_url.is_none() {
        config.pocketbase_url = Some(DEFAULT_POCKETBASE_URL.to_string());
    }
    config
}
