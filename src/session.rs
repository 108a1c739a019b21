//! One actor per open chat view.
//!
//! The session task exclusively owns the message list, the realtime link,
//! and the composer state for a single channel. Front ends talk to it over
//! an mpsc command queue and observe it through a watch snapshot; nothing
//! else ever writes chat state. Switching channels means dropping one
//! session and spawning another, which closes the old socket and abandons
//! any in-flight history fetch before it can touch the new channel's list.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use events::{Attachment, Message};

use crate::compose::Composer;
use crate::net::api::{ApiClient, ApiError};
use crate::net::link::{LinkEvent, LinkStatus, ReconnectPolicy, spawn_link};
use crate::state::messages::MessagesState;

/// History page size requested on load and refresh.
pub const HISTORY_LIMIT: u32 = 100;

type HistoryResult = Result<Vec<Message>, ApiError>;

/// Commands accepted by a running session.
#[derive(Clone, Debug)]
pub enum SessionCommand {
    /// Post a message. The list is not touched here; the websocket echo is
    /// the sole path by which the sender's own message appears.
    Send {
        content: String,
        attachments: Vec<Attachment>,
    },
    /// Set or clear the reply target for subsequent sends.
    ReplyTo(Option<String>),
    React {
        message_id: String,
        emoji: String,
    },
    Delete {
        message_id: String,
    },
    /// Replace the list with server-side search results.
    Search {
        query: String,
    },
    /// Leave search mode and reload history.
    ClearSearch,
    /// Manual retry after a failed history load.
    Refresh,
}

/// Point-in-time view of a session, published after every mutation.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub status: LinkStatus,
    pub loading: bool,
    /// History-panel error, when the last load failed.
    pub error: Option<String>,
    /// Composer availability; sends are refused while the link is down.
    pub can_send: bool,
}

/// Handle to a running session actor. Dropping it tears the session down,
/// socket included.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Enqueue a command; returns `false` once the session has ended.
    pub fn command(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A watch receiver for awaiting snapshot changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// End the session explicitly.
    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a session actor for one channel.
pub fn spawn(api: ApiClient, channel_id: String, policy: ReconnectPolicy) -> SessionHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot) = watch::channel(SessionSnapshot::default());
    let task = tokio::spawn(run_session(api, channel_id, policy, command_rx, snapshot_tx));

    SessionHandle {
        commands,
        snapshot,
        task,
    }
}

async fn run_session(
    api: ApiClient,
    channel_id: String,
    policy: ReconnectPolicy,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshot: watch::Sender<SessionSnapshot>,
) {
    let config = api.config().clone();
    let mut composer = Composer::new(
        config.user.clone(),
        channel_id.clone(),
        config.incident_id.clone(),
    );
    let mut state = MessagesState {
        loading: true,
        ..MessagesState::default()
    };
    let mut status = LinkStatus::default();

    let ws_url = match config.ws_url(&channel_id) {
        Ok(url) => url,
        Err(error) => {
            tracing::error!(%error, "cannot derive websocket url");
            state.loading = false;
            state.error = Some("Failed to connect to server".to_owned());
            publish(&snapshot, &state, status);
            return;
        }
    };

    let (link_tx, mut link_rx) = mpsc::unbounded_channel();
    let _link = spawn_link(ws_url, policy, link_tx);

    // History loads concurrently with the link; live events that land first
    // survive the snapshot via the merge in `apply_history`.
    let (history_tx, mut history_rx) = mpsc::unbounded_channel();
    spawn_history_fetch(&api, &channel_id, &history_tx);
    publish(&snapshot, &state, status);

    loop {
        tokio::select! {
            Some(result) = history_rx.recv() => {
                state.loading = false;
                match result {
                    Ok(page) => {
                        state.error = None;
                        state.apply_history(page);
                    }
                    Err(error) => {
                        tracing::warn!(%error, channel_id, "history fetch failed");
                        state.error = Some(fetch_error_text(&error));
                    }
                }
                publish(&snapshot, &state, status);
            }
            Some(event) = link_rx.recv() => {
                match event {
                    LinkEvent::Status(next) => status = next,
                    LinkEvent::Event(event) => state.apply_event(event),
                }
                publish(&snapshot, &state, status);
            }
            Some(command) = commands.recv() => {
                handle_command(
                    &api,
                    &channel_id,
                    &mut composer,
                    &mut state,
                    status,
                    command,
                    &history_tx,
                )
                .await;
                publish(&snapshot, &state, status);
            }
            else => break,
        }
    }
}

async fn handle_command(
    api: &ApiClient,
    channel_id: &str,
    composer: &mut Composer,
    state: &mut MessagesState,
    status: LinkStatus,
    command: SessionCommand,
    history_tx: &mpsc::UnboundedSender<HistoryResult>,
) {
    match command {
        SessionCommand::Send {
            content,
            attachments,
        } => {
            // Mirror of the disabled composer input: while offline the echo
            // could never arrive, so the send would vanish silently.
            if status != LinkStatus::Connected {
                tracing::warn!(channel_id, "send refused while offline");
                return;
            }
            let draft = composer.draft(content, attachments);
            match api.create_message(&draft).await {
                Ok(()) => composer.clear_reply_target(),
                Err(error) => tracing::warn!(%error, channel_id, "message send failed"),
            }
        }
        SessionCommand::ReplyTo(target) => composer.set_reply_target(target),
        SessionCommand::React { message_id, emoji } => {
            if let Err(error) = api.add_reaction(&message_id, &emoji).await {
                tracing::warn!(%error, message_id, "reaction failed");
            }
        }
        SessionCommand::Delete { message_id } => {
            if let Err(error) = api.delete_message(&message_id).await {
                tracing::warn!(%error, message_id, "delete failed");
            }
        }
        SessionCommand::Search { query } => {
            state.loading = true;
            match api.search_messages(channel_id, &query).await {
                Ok(results) => {
                    state.error = None;
                    state.apply_search_results(results);
                }
                Err(error) => {
                    tracing::warn!(%error, channel_id, "search failed");
                    state.error = Some(fetch_error_text(&error));
                }
            }
            state.loading = false;
        }
        SessionCommand::ClearSearch | SessionCommand::Refresh => {
            state.loading = true;
            spawn_history_fetch(api, channel_id, history_tx);
        }
    }
}

fn spawn_history_fetch(
    api: &ApiClient,
    channel_id: &str,
    tx: &mpsc::UnboundedSender<HistoryResult>,
) {
    let api = api.clone();
    let channel_id = channel_id.to_owned();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = api.list_messages(&channel_id, HISTORY_LIMIT).await;
        let _ = tx.send(result);
    });
}

/// Error strings surfaced in the history panel.
fn fetch_error_text(error: &ApiError) -> String {
    if error.is_status() {
        "Failed to load messages".to_owned()
    } else {
        "Failed to connect to server".to_owned()
    }
}

fn publish(snapshot: &watch::Sender<SessionSnapshot>, state: &MessagesState, status: LinkStatus) {
    let _ = snapshot.send(SessionSnapshot {
        messages: state.messages.clone(),
        status,
        loading: state.loading,
        error: state.error.clone(),
        can_send: status == LinkStatus::Connected,
    });
}
