//! Primary store contract.
//!
//! The store is the source of truth for channels, members and users. The
//! search layer wraps a [`ChannelStore`] and exposes the same trait, so it
//! can be dropped in wherever the plain store is used.

use async_trait::async_trait;

use channel_types::{Channel, ChannelList, ChannelMember, User};

use crate::error::StoreError;

/// Channel and membership persistence.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Persist a new channel. `max_channels_per_team` of 0 disables the limit.
    async fn save(&self, channel: Channel, max_channels_per_team: i64)
        -> Result<Channel, StoreError>;

    /// Replace an existing channel.
    async fn update(&self, channel: Channel) -> Result<Channel, StoreError>;

    /// Fetch one channel, including soft-deleted ones.
    async fn get(&self, channel_id: &str, allow_from_cache: bool) -> Result<Channel, StoreError>;

    /// Fetch many channels in one call. Unknown ids are skipped.
    async fn get_channels_by_ids(&self, channel_ids: &[String]) -> Result<Vec<Channel>, StoreError>;

    async fn save_member(&self, member: ChannelMember) -> Result<ChannelMember, StoreError>;

    async fn remove_member(&self, channel_id: &str, user_id: &str) -> Result<(), StoreError>;

    async fn get_members(&self, channel_id: &str) -> Result<Vec<ChannelMember>, StoreError>;

    /// Ids of every channel the user belongs to.
    async fn get_channel_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    /// Create the direct channel between two users, with both as members.
    async fn create_direct_channel(&self, user: &User, other_user: &User)
        -> Result<Channel, StoreError>;

    /// Native (non-indexed) autocomplete over open channels of a team.
    async fn autocomplete_in_team(
        &self,
        team_id: &str,
        term: &str,
        include_deleted: bool,
    ) -> Result<ChannelList, StoreError>;

    /// Remove every membership of a channel.
    async fn permanent_delete_members_by_channel(&self, channel_id: &str)
        -> Result<(), StoreError>;

    /// Remove a channel record for good.
    async fn permanent_delete(&self, channel_id: &str) -> Result<(), StoreError>;
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn save_user(&self, user: User) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<User, StoreError>;

    /// Profiles of every member of a channel.
    async fn get_all_profiles_in_channel(
        &self,
        channel_id: &str,
        allow_from_cache: bool,
    ) -> Result<Vec<User>, StoreError>;
}
