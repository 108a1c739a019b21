//! Client-side chat state. Each struct has exactly one writer: the session
//! actor for messages, the front end for channel selection.

pub mod channels;
pub mod messages;
