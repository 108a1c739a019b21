#[cfg(test)]
#[path = "channels_test.rs"]
mod channels_test;

use events::Channel;

/// Channel list state for one dashboard view.
///
/// The server owns channel lifecycle; this state only tracks what was
/// fetched and which channel the view is pointed at.
#[derive(Clone, Debug, Default)]
pub struct ChannelsState {
    pub channels: Vec<Channel>,
    pub active_channel_id: Option<String>,
}

impl ChannelsState {
    /// Replace the channel list with a fetched result.
    ///
    /// Under an incident scope a non-empty list selects its first entry as
    /// the active channel (first-wins; no preference for a general channel).
    /// Callers skip this entirely on fetch failure, leaving the prior list
    /// and selection untouched.
    pub fn apply_channel_list(&mut self, channels: Vec<Channel>, incident_scoped: bool) {
        if incident_scoped {
            if let Some(first) = channels.first() {
                self.active_channel_id = Some(first.id.clone());
            }
        }
        self.channels = channels;
    }

    /// Point the view at a different channel.
    pub fn select(&mut self, channel_id: &str) {
        self.active_channel_id = Some(channel_id.to_owned());
    }

    /// The active channel's full record, when it is present in the list.
    #[must_use]
    pub fn active_channel(&self) -> Option<&Channel> {
        let active = self.active_channel_id.as_deref()?;
        self.channels.iter().find(|channel| channel.id == active)
    }
}
