#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Error produced while deriving endpoint URLs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Connection settings shared by the HTTP client and the realtime link.
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP base, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Display name attached to sends, reactions, and deletes.
    pub user: String,
    /// Incident scope applied to channel and history queries, if any.
    pub incident_id: Option<String>,
}

impl Config {
    /// Join an API path onto the base URL.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Derive the per-channel websocket URL by swapping the HTTP scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the base URL is neither
    /// `http://` nor `https://`.
    pub fn ws_url(&self, channel_id: &str) -> Result<String, ConfigError> {
        let base = self.base_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("http://") {
            return Ok(format!("ws://{rest}/collab/ws/{channel_id}"));
        }
        if let Some(rest) = base.strip_prefix("https://") {
            return Ok(format!("wss://{rest}/collab/ws/{channel_id}"));
        }

        Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }
}
