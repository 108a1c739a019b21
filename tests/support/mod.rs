//! Mock collab backend for end-to-end tests: the REST surface the client
//! calls plus the per-channel websocket, with a broadcast fan-out and a kick
//! switch for forcing disconnects.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use events::{Channel, ChannelEvent, Message, encode_event};

pub struct BackendState {
    channels: Mutex<Vec<Channel>>,
    history: Mutex<Vec<Message>>,
    posted: Mutex<Vec<Value>>,
    deletes: Mutex<Vec<(String, String)>>,
    ws_channels: Mutex<Vec<String>>,
    open_sockets: AtomicUsize,
    echo_on_post: AtomicBool,
    fail_history: AtomicBool,
    next_id: AtomicU64,
    frames: broadcast::Sender<String>,
    kick: broadcast::Sender<()>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState {
            channels: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            ws_channels: Mutex::new(Vec::new()),
            open_sockets: AtomicUsize::new(0),
            echo_on_post: AtomicBool::new(true),
            fail_history: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            frames: broadcast::channel(64).0,
            kick: broadcast::channel(8).0,
        });

        let app = Router::new()
            .route("/collab/channels", get(list_channels))
            .route("/collab/messages", get(list_messages).post(create_message))
            .route("/collab/messages/search", post(search_messages))
            .route("/collab/messages/{id}/reactions", post(add_reaction))
            .route("/collab/messages/{id}", delete(delete_message))
            .route("/collab/ws/{channel_id}", get(ws_upgrade))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        Self { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seed_channels(&self, channels: Vec<Channel>) {
        *self.state.channels.lock().expect("channels") = channels;
    }

    pub fn seed_history(&self, messages: Vec<Message>) {
        *self.state.history.lock().expect("history") = messages;
    }

    pub fn set_echo_on_post(&self, echo: bool) {
        self.state.echo_on_post.store(echo, Ordering::SeqCst);
    }

    pub fn set_fail_history(&self, fail: bool) {
        self.state.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Push one realtime frame to every connected socket.
    pub fn broadcast(&self, event: &ChannelEvent) {
        let _ = self.state.frames.send(encode_event(event));
    }

    /// Force-close every connected socket, as a flaky network would.
    pub fn kick_sockets(&self) {
        let _ = self.state.kick.send(());
    }

    pub fn posted(&self) -> Vec<Value> {
        self.state.posted.lock().expect("posted").clone()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.state.deletes.lock().expect("deletes").clone()
    }

    /// Channel ids of every websocket ever accepted, in connect order.
    pub fn ws_channels(&self) -> Vec<String> {
        self.state.ws_channels.lock().expect("ws channels").clone()
    }

    pub fn open_sockets(&self) -> usize {
        self.state.open_sockets.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn list_channels(State(state): State<Arc<BackendState>>) -> Json<Vec<Channel>> {
    Json(state.channels.lock().expect("channels").clone())
}

async fn list_messages(State(state): State<Arc<BackendState>>) -> Response {
    if state.fail_history.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "history unavailable").into_response();
    }
    let history = state.history.lock().expect("history").clone();
    Json(json!({ "data": history })).into_response()
}

async fn create_message(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.posted.lock().expect("posted").push(body.clone());

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut stored = body;
    stored["id"] = json!(format!("srv-{id}"));
    stored["created_at"] = json!("2026-08-01T10:30:00Z");
    let message: Message = serde_json::from_value(stored).expect("posted body should store");

    state
        .history
        .lock()
        .expect("history")
        .push(message.clone());
    if state.echo_on_post.load(Ordering::SeqCst) {
        let _ = state
            .frames
            .send(encode_event(&ChannelEvent::MessageCreated(message.clone())));
    }

    Json(serde_json::to_value(message).expect("stored message encodes"))
}

async fn search_messages(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let results: Vec<Message> = state
        .history
        .lock()
        .expect("history")
        .iter()
        .filter(|message| message.content.to_lowercase().contains(&query))
        .cloned()
        .collect();
    Json(json!({ "results": results }))
}

async fn add_reaction(
    State(state): State<Arc<BackendState>>,
    Path(message_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let emoji = body
        .get("emoji")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let user = body
        .get("user")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let reactions = {
        let mut history = state.history.lock().expect("history");
        let Some(message) = history.iter_mut().find(|m| m.id == message_id) else {
            return (StatusCode::NOT_FOUND, "no such message").into_response();
        };
        message.reactions.entry(emoji).or_default().push(user);
        message.reactions.clone()
    };

    let _ = state.frames.send(encode_event(&ChannelEvent::ReactionAdded {
        message_id,
        reactions,
    }));
    StatusCode::OK.into_response()
}

async fn delete_message(
    State(state): State<Arc<BackendState>>,
    Path(message_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let deleted_by = params.get("deleted_by").cloned().unwrap_or_default();
    state
        .deletes
        .lock()
        .expect("deletes")
        .push((message_id.clone(), deleted_by));
    state
        .history
        .lock()
        .expect("history")
        .retain(|message| message.id != message_id);

    let _ = state
        .frames
        .send(encode_event(&ChannelEvent::MessageDeleted { message_id }));
    StatusCode::OK.into_response()
}

async fn ws_upgrade(
    State(state): State<Arc<BackendState>>,
    Path(channel_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state, channel_id))
}

async fn run_ws(mut socket: WebSocket, state: Arc<BackendState>, channel_id: String) {
    state
        .ws_channels
        .lock()
        .expect("ws channels")
        .push(channel_id);
    state.open_sockets.fetch_add(1, Ordering::SeqCst);

    let mut frames = state.frames.subscribe();
    let mut kick = state.kick.subscribe();
    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Ok(text) = frame else { break };
                if socket.send(WsMessage::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = kick.recv() => break,
            incoming = socket.recv() => {
                match incoming {
                    None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.open_sockets.fetch_sub(1, Ordering::SeqCst);
}
