//! Channel and membership types.
//!
//! Channels are the primary records tracked by the store. Only open
//! channels are globally discoverable and therefore eligible for search
//! indexing; private and direct channels never reach an engine.

use serde::{Deserialize, Serialize};

/// Visibility classifier for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Visible to every member of the team
    Open,
    /// Visible only to its members
    Private,
    /// One-to-one conversation between two users
    Direct,
    /// Small group conversation outside any team
    Group,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Open => "open",
            ChannelType::Private => "private",
            ChannelType::Direct => "direct",
            ChannelType::Group => "group",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A channel record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique, immutable identifier (ULID string)
    pub id: String,

    /// Owning team. Empty for direct and group channels.
    #[serde(default)]
    pub team_id: String,

    /// Visibility classifier
    pub channel_type: ChannelType,

    /// URL-safe handle, unique within the team
    pub name: String,

    /// Human readable name
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub purpose: String,

    /// Creation time (ms since epoch)
    #[serde(default)]
    pub create_at: i64,

    /// Last update time (ms since epoch)
    #[serde(default)]
    pub update_at: i64,

    /// Soft-delete marker (ms since epoch). Zero means not deleted.
    #[serde(default)]
    pub delete_at: i64,

    /// User that created the channel
    #[serde(default)]
    pub creator_id: String,
}

impl Channel {
    /// Create an open channel with no id; the store assigns one on save.
    pub fn open(team_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(team_id, name, ChannelType::Open)
    }

    /// Create a private channel with no id; the store assigns one on save.
    pub fn private(team_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(team_id, name, ChannelType::Private)
    }

    pub fn new(
        team_id: impl Into<String>,
        name: impl Into<String>,
        channel_type: ChannelType,
    ) -> Self {
        let name = name.into();
        Self {
            id: String::new(),
            team_id: team_id.into(),
            channel_type,
            display_name: name.clone(),
            name,
            purpose: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
            creator_id: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_creator(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = creator_id.into();
        self
    }

    pub fn with_delete_at(mut self, delete_at: i64) -> Self {
        self.delete_at = delete_at;
        self
    }

    /// Whether the channel may appear in engine-backed indexes.
    pub fn is_globally_discoverable(&self) -> bool {
        self.channel_type == ChannelType::Open
    }

    /// Whether the channel carries a soft-delete marker.
    pub fn is_deleted(&self) -> bool {
        self.delete_at > 0
    }

    /// Deterministic name for the direct channel between two users.
    pub fn direct_channel_name(user_id: &str, other_user_id: &str) -> String {
        if user_id < other_user_id {
            format!("{}__{}", user_id, other_user_id)
        } else {
            format!("{}__{}", other_user_id, user_id)
        }
    }
}

/// Ordered list of channels returned by queries.
pub type ChannelList = Vec<Channel>;

/// Association between a channel and a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,

    /// Space separated role names
    #[serde(default)]
    pub roles: String,

    /// Last time the member viewed the channel (ms since epoch)
    #[serde(default)]
    pub last_viewed_at: i64,
}

impl ChannelMember {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            roles: "channel_user".to_string(),
            last_viewed_at: 0,
        }
    }
}

/// Post-filter options for channel queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutocompleteOptions {
    /// Keep soft-deleted channels in the result
    pub include_deleted: bool,
}

impl AutocompleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_deleted(mut self, include_deleted: bool) -> Self {
        self.include_deleted = include_deleted;
        self
    }

    /// Whether a channel passes the filters.
    pub fn accepts(&self, channel: &Channel) -> bool {
        self.include_deleted || !channel.is_deleted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_open_channels_are_discoverable() {
        assert!(Channel::open("team-1", "town-square").is_globally_discoverable());
        assert!(!Channel::private("team-1", "secret").is_globally_discoverable());
        assert!(!Channel::new("", "a__b", ChannelType::Direct).is_globally_discoverable());
        assert!(!Channel::new("", "group", ChannelType::Group).is_globally_discoverable());
    }

    #[test]
    fn test_direct_channel_name_is_order_independent() {
        assert_eq!(
            Channel::direct_channel_name("user-b", "user-a"),
            Channel::direct_channel_name("user-a", "user-b")
        );
        assert_eq!(Channel::direct_channel_name("a", "b"), "a__b");
    }

    #[test]
    fn test_autocomplete_options_filter_deleted() {
        let live = Channel::open("team-1", "live");
        let gone = Channel::open("team-1", "gone").with_delete_at(1_706_540_400_000);

        let default_opts = AutocompleteOptions::new();
        assert!(default_opts.accepts(&live));
        assert!(!default_opts.accepts(&gone));

        let opts = AutocompleteOptions::new().with_include_deleted(true);
        assert!(opts.accepts(&gone));
    }

    #[test]
    fn test_channel_type_serde() {
        let json = serde_json::to_string(&ChannelType::Open).unwrap();
        assert_eq!(json, "\"open\"");
        let decoded: ChannelType = serde_json::from_str("\"direct\"").unwrap();
        assert_eq!(decoded, ChannelType::Direct);
    }
}
