use super::*;

fn message(id: &str, content: &str) -> Message {
    Message {
        id: id.to_owned(),
        channel_id: "c-1".to_owned(),
        incident_id: None,
        user: "rivera".to_owned(),
        content: content.to_owned(),
        message_type: "text".to_owned(),
        mentions: events::Mentions::default(),
        attachments: Vec::new(),
        reactions: Reactions::new(),
        thread_id: None,
        is_edited: false,
        created_at: "2026-08-01T10:22:05Z".to_owned(),
    }
}

fn ids(state: &MessagesState) -> Vec<&str> {
    state.messages.iter().map(|m| m.id.as_str()).collect()
}

// =============================================================
// apply_history
// =============================================================

#[test]
fn history_populates_in_server_order() {
    let mut state = MessagesState::default();
    state.apply_history(vec![message("m-1", "a"), message("m-2", "b")]);
    assert_eq!(ids(&state), vec!["m-1", "m-2"]);
}

#[test]
fn history_keeps_live_tail_missing_from_snapshot() {
    let mut state = MessagesState::default();
    state.apply_created(message("m-3", "live"));
    state.apply_created(message("m-4", "live too"));
    state.apply_history(vec![message("m-1", "a"), message("m-2", "b")]);
    assert_eq!(ids(&state), vec!["m-1", "m-2", "m-3", "m-4"]);
}

#[test]
fn history_copy_wins_for_ids_in_snapshot() {
    let mut state = MessagesState::default();
    state.apply_created(message("m-2", "live copy"));
    state.apply_history(vec![message("m-1", "a"), message("m-2", "stored copy")]);
    assert_eq!(ids(&state), vec!["m-1", "m-2"]);
    assert_eq!(state.messages[1].content, "stored copy");
}

#[test]
fn empty_history_keeps_live_messages() {
    let mut state = MessagesState::default();
    state.apply_created(message("m-3", "live"));
    state.apply_history(Vec::new());
    assert_eq!(ids(&state), vec!["m-3"]);
}

// =============================================================
// apply_created
// =============================================================

#[test]
fn created_appends_in_arrival_order() {
    let mut state = MessagesState::default();
    state.apply_history(vec![message("m-1", "a")]);
    state.apply_created(message("m-2", "b"));
    state.apply_created(message("m-3", "c"));
    assert_eq!(ids(&state), vec!["m-1", "m-2", "m-3"]);
}

#[test]
fn redelivered_create_updates_in_place() {
    let mut state = MessagesState::default();
    state.apply_created(message("m-1", "first"));
    state.apply_created(message("m-2", "second"));
    state.apply_created(message("m-1", "redelivered"));
    assert_eq!(ids(&state), vec!["m-1", "m-2"]);
    assert_eq!(state.messages[0].content, "redelivered");
}

// =============================================================
// apply_deleted
// =============================================================

#[test]
fn delete_removes_exactly_the_matching_entry() {
    let mut state = MessagesState::default();
    state.apply_history(vec![message("m-1", "a"), message("m-2", "b"), message("m-3", "c")]);
    state.apply_deleted("m-2");
    assert_eq!(ids(&state), vec!["m-1", "m-3"]);
}

#[test]
fn delete_of_absent_id_is_a_no_op() {
    let mut state = MessagesState::default();
    state.apply_history(vec![message("m-1", "a")]);
    state.apply_deleted("m-9");
    assert_eq!(ids(&state), vec!["m-1"]);
}

// =============================================================
// apply_reactions
// =============================================================

#[test]
fn reactions_replace_wholesale_not_merge() {
    let mut state = MessagesState::default();
    let mut seeded = message("m-1", "a");
    seeded
        .reactions
        .insert("👍".to_owned(), vec!["chen".to_owned()]);
    state.apply_history(vec![seeded]);

    let after = Reactions::from([("🔥".to_owned(), vec!["ops".to_owned()])]);
    state.apply_reactions("m-1", after.clone());
    assert_eq!(state.messages[0].reactions, after);
}

#[test]
fn reactions_for_absent_message_are_dropped() {
    let mut state = MessagesState::default();
    state.apply_reactions("m-9", Reactions::new());
    assert!(state.messages.is_empty());
}

// =============================================================
// apply_event / search
// =============================================================

#[test]
fn event_sequence_from_live_channel() {
    let mut state = MessagesState::default();
    state.apply_history(vec![message("m-1", "a"), message("m-2", "b")]);

    state.apply_event(ChannelEvent::MessageCreated(message("m-3", "c")));
    assert_eq!(ids(&state), vec!["m-1", "m-2", "m-3"]);

    state.apply_event(ChannelEvent::MessageDeleted {
        message_id: "m-2".to_owned(),
    });
    assert_eq!(ids(&state), vec!["m-1", "m-3"]);
}

#[test]
fn reaction_removed_event_also_replaces_map() {
    let mut state = MessagesState::default();
    let mut seeded = message("m-1", "a");
    seeded
        .reactions
        .insert("👍".to_owned(), vec!["chen".to_owned(), "ops".to_owned()]);
    state.apply_history(vec![seeded]);

    let after = Reactions::from([("👍".to_owned(), vec!["chen".to_owned()])]);
    state.apply_event(ChannelEvent::ReactionRemoved {
        message_id: "m-1".to_owned(),
        reactions: after.clone(),
    });
    assert_eq!(state.messages[0].reactions, after);
}

#[test]
fn search_results_replace_the_list() {
    let mut state = MessagesState::default();
    state.apply_history(vec![message("m-1", "a"), message("m-2", "b")]);
    state.apply_search_results(vec![message("m-2", "b")]);
    assert_eq!(ids(&state), vec!["m-2"]);
}
