//! Network edges: the REST client and the per-channel realtime link.

pub mod api;
pub mod link;
