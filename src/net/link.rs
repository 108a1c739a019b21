//! Realtime link: one websocket per chat session.
//!
//! The link task connects to the channel's socket URL, decodes inbound
//! `{type, data}` frames, and forwards them to the owning session. On close
//! or error it reconnects with exponential backoff plus jitter, giving up
//! after a bounded number of consecutive failed attempts; the session then
//! stays offline until a channel switch rebuilds it.

#[cfg(test)]
#[path = "link_test.rs"]
mod link_test;

use std::time::Duration;

use futures_util::StreamExt;
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use events::ChannelEvent;

/// Websocket connection status, as surfaced to the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Events emitted by the link task toward its session.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    /// Connection lifecycle transition.
    Status(LinkStatus),
    /// Decoded realtime frame from the server.
    Event(ChannelEvent),
}

/// Reconnect schedule: exponential backoff with jitter, capped attempts.
#[derive(Clone, Copy, Debug)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failed attempts tolerated before the link gives up.
    pub max_attempts: u32,
    pub jitter_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_attempts: 6,
            jitter_ms: 250,
        }
    }
}

impl ReconnectPolicy {
    /// Deterministic part of the delay before the given attempt (1-based).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        self.initial_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

/// Handle to a running link task. Dropping it closes the socket, so a
/// session holds at most one live socket at any time.
#[derive(Debug)]
pub struct LinkHandle {
    task: JoinHandle<()>,
}

impl LinkHandle {
    /// Tear the link down explicitly.
    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the link task for one channel socket URL.
pub fn spawn_link(
    url: String,
    policy: ReconnectPolicy,
    tx: mpsc::UnboundedSender<LinkEvent>,
) -> LinkHandle {
    LinkHandle {
        task: tokio::spawn(run_link(url, policy, tx)),
    }
}

async fn run_link(url: String, policy: ReconnectPolicy, tx: mpsc::UnboundedSender<LinkEvent>) {
    let mut failed_attempts: u32 = 0;

    loop {
        if tx.send(LinkEvent::Status(LinkStatus::Connecting)).is_err() {
            return;
        }

        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                failed_attempts = 0;
                tracing::debug!(url = %url, "websocket connected");
                if tx.send(LinkEvent::Status(LinkStatus::Connected)).is_err() {
                    return;
                }
                read_until_close(stream, &tx).await;
            }
            Err(error) => {
                tracing::warn!(%error, url = %url, "websocket connect failed");
            }
        }

        if tx.send(LinkEvent::Status(LinkStatus::Disconnected)).is_err() {
            return;
        }

        failed_attempts += 1;
        if failed_attempts > policy.max_attempts {
            tracing::warn!(
                url = %url,
                attempts = policy.max_attempts,
                "reconnect attempts exhausted; staying offline"
            );
            return;
        }
        tokio::time::sleep(policy.backoff(failed_attempts)).await;
    }
}

/// Process inbound frames until the connection ends, however it ends.
/// Decode failures are logged and skipped; they never kill the link.
async fn read_until_close(
    mut stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    tx: &mpsc::UnboundedSender<LinkEvent>,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match events::decode_event(text.as_str()) {
                Ok(event) => {
                    if tx.send(LinkEvent::Event(event)).is_err() {
                        return;
                    }
                }
                Err(events::CodecError::UnknownType(kind)) => {
                    tracing::debug!(kind, "ignoring unknown event type");
                }
                Err(error) => {
                    tracing::warn!(%error, "malformed event frame");
                }
            },
            Ok(Message::Close(_)) => return,
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "websocket receive failed");
                return;
            }
        }
    }
}
