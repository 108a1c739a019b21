//! Outgoing message assembly.
//!
//! The composer never touches the message list: a successful send comes back
//! through the websocket echo like everyone else's messages, which keeps the
//! server as the single authority on insertion order.

#[cfg(test)]
#[path = "compose_test.rs"]
mod compose_test;

use std::io;
use std::path::Path;

use events::{Attachment, MessageDraft};

/// Draft state for one chat session: where messages go, who sends them, and
/// which message is currently being replied to.
#[derive(Clone, Debug)]
pub struct Composer {
    user: String,
    channel_id: String,
    incident_id: Option<String>,
    replying_to: Option<String>,
}

impl Composer {
    #[must_use]
    pub fn new(user: String, channel_id: String, incident_id: Option<String>) -> Self {
        Self {
            user,
            channel_id,
            incident_id,
            replying_to: None,
        }
    }

    /// Set or clear the reply target for subsequent drafts.
    pub fn set_reply_target(&mut self, message_id: Option<String>) {
        self.replying_to = message_id;
    }

    /// Clear the reply target after a send was accepted.
    pub fn clear_reply_target(&mut self) {
        self.replying_to = None;
    }

    #[must_use]
    pub fn reply_target(&self) -> Option<&str> {
        self.replying_to.as_deref()
    }

    /// Build the `POST /collab/messages` payload for the current state.
    #[must_use]
    pub fn draft(&self, content: String, attachments: Vec<Attachment>) -> MessageDraft {
        MessageDraft {
            content,
            user: self.user.clone(),
            incident_id: self.incident_id.clone(),
            channel_id: self.channel_id.clone(),
            attachments,
            thread_id: self.replying_to.clone(),
        }
    }
}

/// Build the attachment descriptor for a local file: metadata only, the
/// bytes never leave the client. Kind is `image` for `image/*` MIME types
/// and `file` for everything else.
#[must_use]
pub fn describe_file(filename: &str, mime_type: Option<&str>, size: u64) -> Attachment {
    let kind = match mime_type {
        Some(mime) if mime.starts_with("image/") => "image",
        _ => "file",
    };

    Attachment {
        filename: filename.to_owned(),
        kind: kind.to_owned(),
        size: Some(size),
        url: None,
        mime_type: mime_type.map(ToOwned::to_owned),
    }
}

/// Describe a file on disk, sniffing the MIME type from its extension.
///
/// # Errors
///
/// Fails when the file's metadata cannot be read.
pub fn describe_path(path: &Path) -> io::Result<Attachment> {
    let metadata = std::fs::metadata(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = path
        .extension()
        .and_then(|ext| mime_for_extension(&ext.to_string_lossy()));

    Ok(describe_file(&filename, mime_type, metadata.len()))
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "txt" | "log" => Some("text/plain"),
        "json" => Some("application/json"),
        "csv" => Some("text/csv"),
        "pdf" => Some("application/pdf"),
        "pcap" | "pcapng" => Some("application/vnd.tcpdump.pcap"),
        _ => None,
    }
}
