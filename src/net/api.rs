//! HTTP client for the collab REST endpoints.
//!
//! The server owns all message state; every mutation here is fire-and-forget
//! from the list's point of view. Created, deleted, and reacted messages
//! reach the view through the websocket echo, never through these responses.

use events::{Channel, Message, MessageDraft};
use serde::Deserialize;

use crate::config::Config;

/// Error returned by [`ApiClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },
}

impl ApiError {
    /// Whether the failure was an HTTP status rather than a transport error.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

#[derive(Deserialize)]
struct MessagePage {
    #[serde(default)]
    data: Vec<Message>,
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<Message>,
}

/// Typed client over the `/collab/*` REST surface.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `GET /collab/channels[?incident_id=]`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a non-2xx status.
    pub async fn list_channels(&self) -> Result<Vec<Channel>, ApiError> {
        let mut request = self.http.get(self.config.api_url("/collab/channels"));
        if let Some(incident_id) = &self.config.incident_id {
            request = request.query(&[("incident_id", incident_id)]);
        }
        let response = expect_ok(request.send().await?, "/collab/channels").await?;
        Ok(response.json().await?)
    }

    /// `GET /collab/messages?channel_id=&limit=` scoped to the configured
    /// incident. A missing `data` payload decodes as an empty page.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a non-2xx status.
    pub async fn list_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<Message>, ApiError> {
        let mut request = self
            .http
            .get(self.config.api_url("/collab/messages"))
            .query(&[("channel_id", channel_id)])
            .query(&[("limit", limit)]);
        if let Some(incident_id) = &self.config.incident_id {
            request = request.query(&[("incident_id", incident_id)]);
        }
        let response = expect_ok(request.send().await?, "/collab/messages").await?;
        let page: MessagePage = response.json().await?;
        Ok(page.data)
    }

    /// `POST /collab/messages`. The response body (the created message) is
    /// deliberately discarded; the socket echo is the sole insertion path.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a non-2xx status.
    pub async fn create_message(&self, draft: &MessageDraft) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.config.api_url("/collab/messages"))
            .json(draft)
            .send()
            .await?;
        expect_ok(response, "/collab/messages").await?;
        Ok(())
    }

    /// `POST /collab/messages/search`. A missing `results` payload decodes
    /// as an empty result set.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a non-2xx status.
    pub async fn search_messages(
        &self,
        channel_id: &str,
        query: &str,
    ) -> Result<Vec<Message>, ApiError> {
        let body = serde_json::json!({
            "query": query,
            "incident_id": self.config.incident_id,
            "channel_id": channel_id,
        });
        let response = self
            .http
            .post(self.config.api_url("/collab/messages/search"))
            .json(&body)
            .send()
            .await?;
        let response = expect_ok(response, "/collab/messages/search").await?;
        let page: SearchPage = response.json().await?;
        Ok(page.results)
    }

    /// `POST /collab/messages/{id}/reactions` with the configured user.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a non-2xx status.
    pub async fn add_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError> {
        let path = format!("/collab/messages/{message_id}/reactions");
        let body = serde_json::json!({ "emoji": emoji, "user": self.config.user });
        let response = self
            .http
            .post(self.config.api_url(&path))
            .json(&body)
            .send()
            .await?;
        expect_ok(response, &path).await?;
        Ok(())
    }

    /// `DELETE /collab/messages/{id}?deleted_by=` with the configured user.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a non-2xx status.
    pub async fn delete_message(&self, message_id: &str) -> Result<(), ApiError> {
        let path = format!("/collab/messages/{message_id}");
        let response = self
            .http
            .delete(self.config.api_url(&path))
            .query(&[("deleted_by", &self.config.user)])
            .send()
            .await?;
        expect_ok(response, &path).await?;
        Ok(())
    }
}

async fn expect_ok(response: reqwest::Response, path: &str) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        path: path.to_owned(),
        body,
    })
}
