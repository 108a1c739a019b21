//! Shared data model and realtime codec for the collab chat wire protocol.
//!
//! This crate owns the payload shapes used by both the HTTP API and the
//! per-channel websocket: channels, messages, attachments, and the
//! `{type, data}` event frames the server pushes to subscribed clients.
//! Payloads are plain JSON; unknown optional fields default rather than
//! failing decode, since the server schema evolves independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`decode_event`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame (or its `data` payload) is not valid JSON for its type.
    #[error("failed to decode event frame: {0}")]
    Decode(#[from] serde_json::Error),
    /// The `type` discriminator names no known event.
    #[error("unknown event type: {0}")]
    UnknownType(String),
}

/// Reaction state of a message: emoji to the users who applied it.
pub type Reactions = BTreeMap<String, Vec<String>>;

/// A chat channel. Created and owned server-side; clients only read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique channel identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Incident this channel is scoped to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    /// Server-defined channel category, e.g. `"incident"` or `"general"`.
    pub channel_type: String,
}

/// A single chat message as stored by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier, minted by the server.
    pub id: String,
    /// Channel the message belongs to.
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    /// Author display name.
    pub user: String,
    /// Message body.
    pub content: String,
    /// Server-defined message category, e.g. `"text"` or `"system"`.
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub mentions: Mentions,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Full reaction state; the server replaces this wholesale on change.
    #[serde(default)]
    pub reactions: Reactions,
    /// Message this one replies to, if part of a thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub is_edited: bool,
    /// Opaque server timestamp; clients render it but never compute with it.
    pub created_at: String,
}

/// Users and assets referenced by a message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mentions {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub assets: Vec<String>,
}

/// Attachment metadata. No binary content travels through this model; the
/// `url` points at server-hosted bytes when they exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    /// Attachment category: `"image"`, `"screenshot"`, `"log"`, `"pcap"`, or
    /// `"file"`. Kept as a string on the wire; renderers fall back to the
    /// file treatment for values they do not recognize.
    #[serde(rename = "type", default = "default_attachment_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Outgoing message payload for `POST /collab/messages`. The server assigns
/// the id and timestamp and echoes the stored message over the websocket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub content: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    pub channel_id: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Reply target, carried as the new message's thread id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// A realtime frame pushed by the server to a channel's subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    /// A new message was stored and broadcast.
    MessageCreated(Message),
    /// A message was removed.
    MessageDeleted { message_id: String },
    /// A reaction was applied; `reactions` is the full replacement map.
    ReactionAdded { message_id: String, reactions: Reactions },
    /// A reaction was withdrawn; `reactions` is the full replacement map.
    ReactionRemoved { message_id: String, reactions: Reactions },
}

#[derive(Serialize, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct DeletePayload {
    message_id: String,
}

#[derive(Deserialize)]
struct ReactionPayload {
    message_id: String,
    #[serde(default)]
    reactions: Reactions,
}

/// Decode one websocket text frame into a [`ChannelEvent`].
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON and
/// [`CodecError::UnknownType`] for an unrecognized `type` discriminator.
pub fn decode_event(text: &str) -> Result<ChannelEvent, CodecError> {
    let frame: RawFrame = serde_json::from_str(text)?;
    match frame.kind.as_str() {
        "message_created" => Ok(ChannelEvent::MessageCreated(serde_json::from_value(
            frame.data,
        )?)),
        "message_deleted" => {
            let payload: DeletePayload = serde_json::from_value(frame.data)?;
            Ok(ChannelEvent::MessageDeleted {
                message_id: payload.message_id,
            })
        }
        "reaction_added" => {
            let payload: ReactionPayload = serde_json::from_value(frame.data)?;
            Ok(ChannelEvent::ReactionAdded {
                message_id: payload.message_id,
                reactions: payload.reactions,
            })
        }
        "reaction_removed" => {
            let payload: ReactionPayload = serde_json::from_value(frame.data)?;
            Ok(ChannelEvent::ReactionRemoved {
                message_id: payload.message_id,
                reactions: payload.reactions,
            })
        }
        _ => Err(CodecError::UnknownType(frame.kind)),
    }
}

/// Encode a [`ChannelEvent`] as the JSON text frame the server would send.
///
/// # Panics
///
/// Never panics in practice; all event payloads serialize infallibly.
#[must_use]
pub fn encode_event(event: &ChannelEvent) -> String {
    let frame = match event {
        ChannelEvent::MessageCreated(message) => RawFrame {
            kind: "message_created".to_owned(),
            data: serde_json::to_value(message).unwrap_or(Value::Null),
        },
        ChannelEvent::MessageDeleted { message_id } => RawFrame {
            kind: "message_deleted".to_owned(),
            data: serde_json::json!({ "message_id": message_id }),
        },
        ChannelEvent::ReactionAdded {
            message_id,
            reactions,
        } => RawFrame {
            kind: "reaction_added".to_owned(),
            data: serde_json::json!({ "message_id": message_id, "reactions": reactions }),
        },
        ChannelEvent::ReactionRemoved {
            message_id,
            reactions,
        } => RawFrame {
            kind: "reaction_removed".to_owned(),
            data: serde_json::json!({ "message_id": message_id, "reactions": reactions }),
        },
    };

    serde_json::to_string(&frame).unwrap_or_default()
}

fn default_message_type() -> String {
    "text".to_owned()
}

fn default_attachment_kind() -> String {
    "file".to_owned()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
