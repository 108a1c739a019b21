//! Stateless presentation of messages and attachment metadata for the
//! terminal front end: fixed kind lookup, byte formatting, preview
//! resolution. No network or state side effects.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write;

use events::{Attachment, Message};

/// Glyph and accent color for an attachment kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentStyle {
    pub glyph: &'static str,
    pub color: &'static str,
}

/// Fixed lookup from attachment kind to its list treatment. Unknown kinds
/// get the generic file treatment.
#[must_use]
pub fn kind_style(kind: &str) -> AttachmentStyle {
    match kind {
        "image" => AttachmentStyle {
            glyph: "image",
            color: "#3b82f6",
        },
        "screenshot" => AttachmentStyle {
            glyph: "camera",
            color: "#8b5cf6",
        },
        "log" => AttachmentStyle {
            glyph: "file-text",
            color: "#eab308",
        },
        "pcap" => AttachmentStyle {
            glyph: "network",
            color: "#22c55e",
        },
        _ => AttachmentStyle {
            glyph: "file",
            color: "#94a3b8",
        },
    }
}

/// Format a byte count the way the attachment list shows it.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let bytes = bytes as f64;
    if bytes < MB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{:.1} MB", bytes / MB)
    }
}

/// What the preview surface can show for an attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preview {
    /// Server-hosted content to open full-screen.
    Url(String),
    /// No hosted content; show the placeholder.
    Unavailable,
}

/// Resolve an attachment to its preview: the URL when one exists, the
/// "preview not available" placeholder otherwise.
#[must_use]
pub fn preview(attachment: &Attachment) -> Preview {
    attachment
        .url
        .clone()
        .map_or(Preview::Unavailable, Preview::Url)
}

/// One attachment as a list row: glyph, filename, formatted size.
#[must_use]
pub fn render_attachment_line(attachment: &Attachment) -> String {
    let style = kind_style(&attachment.kind);
    let mut line = format!("[{}] {}", style.glyph, attachment.filename);
    if let Some(size) = attachment.size {
        let _ = write!(line, " ({})", format_size(size));
    }
    line
}

/// One message as terminal output: timestamp, author, body, reply marker,
/// reaction tallies, then indented attachment rows.
#[must_use]
pub fn render_message_line(message: &Message) -> String {
    let mut line = format!(
        "{} {}: {}",
        message.created_at, message.user, message.content
    );
    if message.is_edited {
        line.push_str(" (edited)");
    }
    if let Some(thread_id) = &message.thread_id {
        let _ = write!(line, " (reply to {thread_id})");
    }
    for (emoji, users) in &message.reactions {
        let _ = write!(line, "  {emoji} {}", users.len());
    }
    for attachment in &message.attachments {
        let _ = write!(line, "\n    {}", render_attachment_line(attachment));
    }
    line
}
