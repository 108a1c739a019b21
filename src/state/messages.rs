#[cfg(test)]
#[path = "messages_test.rs"]
mod messages_test;

use std::collections::HashSet;

use events::{ChannelEvent, Message, Reactions};

/// Message list state for the active channel.
///
/// The server owns message identity and order. This state applies history
/// snapshots and realtime mutations without ever re-sorting: history arrives
/// oldest→newest and live events append in socket arrival order.
#[derive(Clone, Debug, Default)]
pub struct MessagesState {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
}

impl MessagesState {
    /// Merge a history snapshot with whatever already arrived live.
    ///
    /// Snapshot order wins for every id the server returned; messages the
    /// socket delivered in the meantime that are missing from the snapshot
    /// keep their arrival order at the tail. A plain replace here would drop
    /// live messages whenever the fetch resolves after the socket opens.
    pub fn apply_history(&mut self, snapshot: Vec<Message>) {
        let known: HashSet<String> = snapshot.iter().map(|message| message.id.clone()).collect();
        let mut merged = snapshot;
        for live in self.messages.drain(..) {
            if !known.contains(&live.id) {
                merged.push(live);
            }
        }
        self.messages = merged;
    }

    /// Idempotent insert keyed by message id: a redelivered event updates
    /// the existing entry in place, a new id appends at the end.
    pub fn apply_created(&mut self, message: Message) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
        } else {
            self.messages.push(message);
        }
    }

    /// Remove the matching entry; no-op when the id is absent.
    pub fn apply_deleted(&mut self, message_id: &str) {
        self.messages.retain(|message| message.id != message_id);
    }

    /// Replace the reactions map wholesale. The server is the source of
    /// truth for reaction state; this is never a merge.
    pub fn apply_reactions(&mut self, message_id: &str, reactions: Reactions) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) {
            message.reactions = reactions;
        }
    }

    /// Replace the list with search results.
    pub fn apply_search_results(&mut self, results: Vec<Message>) {
        self.messages = results;
    }

    /// Dispatch one realtime event to the matching mutation.
    pub fn apply_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::MessageCreated(message) => self.apply_created(message),
            ChannelEvent::MessageDeleted { message_id } => self.apply_deleted(&message_id),
            ChannelEvent::ReactionAdded {
                message_id,
                reactions,
            }
            | ChannelEvent::ReactionRemoved {
                message_id,
                reactions,
            } => self.apply_reactions(&message_id, reactions),
        }
    }
}
