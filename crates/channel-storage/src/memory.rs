//! In-memory primary store.
//!
//! Backs the CLI and the test suites. Besides the store contract it can
//! count calls per operation and inject failures, so callers can assert
//! exactly what reached the store.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use channel_types::{now_millis, Channel, ChannelList, ChannelMember, ChannelType, User};

use crate::error::StoreError;
use crate::traits::{ChannelStore, UserStore};

/// Maximum channels returned by native autocomplete.
const AUTOCOMPLETE_LIMIT: usize = 50;

/// DashMap-backed implementation of [`ChannelStore`] and [`UserStore`].
#[derive(Default)]
pub struct MemoryStore {
    channels: DashMap<String, Channel>,
    users: DashMap<String, User>,
    /// Keyed by (channel_id, user_id)
    members: DashMap<(String, String), ChannelMember>,
    calls: DashMap<&'static str, usize>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to `operation` fail with [`StoreError::Internal`].
    ///
    /// Operation names are the trait method names, e.g. `"get_channels_by_ids"`.
    pub fn fail_operation(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(operation);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    /// Number of times `operation` was called.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.get(operation).map(|c| *c).unwrap_or(0)
    }

    /// Number of stored channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn enter(&self, operation: &'static str) -> Result<(), StoreError> {
        *self.calls.entry(operation).or_insert(0) += 1;
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(operation))
            .unwrap_or(false);
        if failing {
            debug!(operation, "Injected store failure");
            return Err(StoreError::Internal(format!("{} failed", operation)));
        }
        Ok(())
    }

    fn name_taken(&self, team_id: &str, name: &str) -> bool {
        self.channels
            .iter()
            .any(|c| c.team_id == team_id && c.name == name)
    }

    fn active_channels_in_team(&self, team_id: &str) -> i64 {
        self.channels
            .iter()
            .filter(|c| c.team_id == team_id && !c.is_deleted())
            .count() as i64
    }

    fn insert_member(&self, member: ChannelMember) {
        self.members
            .insert((member.channel_id.clone(), member.user_id.clone()), member);
    }
}

/// Whether any word of `text` starts with the lower-cased `term`.
fn matches_term(text: &str, term: &str) -> bool {
    let text = text.to_lowercase();
    text.starts_with(term)
        || text
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| !word.is_empty() && word.starts_with(term))
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn save(
        &self,
        mut channel: Channel,
        max_channels_per_team: i64,
    ) -> Result<Channel, StoreError> {
        self.enter("save")?;

        if channel.name.trim().is_empty() {
            return Err(StoreError::InvalidInput("channel name is required".into()));
        }
        if !channel.id.is_empty() && self.channels.contains_key(&channel.id) {
            return Err(StoreError::AlreadyExists(format!("channel {}", channel.id)));
        }
        if self.name_taken(&channel.team_id, &channel.name) {
            return Err(StoreError::AlreadyExists(format!(
                "channel name {} in team {}",
                channel.name, channel.team_id
            )));
        }
        if max_channels_per_team > 0
            && self.active_channels_in_team(&channel.team_id) >= max_channels_per_team
        {
            return Err(StoreError::LimitExceeded(format!(
                "team {} already has {} channels",
                channel.team_id, max_channels_per_team
            )));
        }

        if channel.id.is_empty() {
            channel.id = ulid::Ulid::new().to_string();
        }
        let now = now_millis();
        channel.create_at = now;
        channel.update_at = now;

        self.channels.insert(channel.id.clone(), channel.clone());
        debug!(channel_id = %channel.id, "Saved channel");
        Ok(channel)
    }

    async fn update(&self, mut channel: Channel) -> Result<Channel, StoreError> {
        self.enter("update")?;

        let create_at = self
            .channels
            .get(&channel.id)
            .map(|existing| existing.create_at)
            .ok_or_else(|| StoreError::NotFound(format!("channel {}", channel.id)))?;

        channel.create_at = create_at;
        channel.update_at = now_millis();
        self.channels.insert(channel.id.clone(), channel.clone());
        Ok(channel)
    }

    async fn get(&self, channel_id: &str, _allow_from_cache: bool) -> Result<Channel, StoreError> {
        self.enter("get")?;
        self.channels
            .get(channel_id)
            .map(|c| c.clone())
            .ok_or_else(|| StoreError::NotFound(format!("channel {}", channel_id)))
    }

    async fn get_channels_by_ids(&self, channel_ids: &[String]) -> Result<Vec<Channel>, StoreError> {
        self.enter("get_channels_by_ids")?;
        Ok(channel_ids
            .iter()
            .filter_map(|id| self.channels.get(id).map(|c| c.clone()))
            .collect())
    }

    async fn save_member(&self, member: ChannelMember) -> Result<ChannelMember, StoreError> {
        self.enter("save_member")?;

        if !self.channels.contains_key(&member.channel_id) {
            return Err(StoreError::NotFound(format!(
                "channel {}",
                member.channel_id
            )));
        }
        let key = (member.channel_id.clone(), member.user_id.clone());
        if self.members.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!(
                "member {} of channel {}",
                member.user_id, member.channel_id
            )));
        }
        self.members.insert(key, member.clone());
        Ok(member)
    }

    async fn remove_member(&self, channel_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.enter("remove_member")?;

        if !self.channels.contains_key(channel_id) {
            return Err(StoreError::NotFound(format!("channel {}", channel_id)));
        }
        self.members
            .remove(&(channel_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn get_members(&self, channel_id: &str) -> Result<Vec<ChannelMember>, StoreError> {
        self.enter("get_members")?;
        let mut members: Vec<ChannelMember> = self
            .members
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.value().clone())
            .collect();
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(members)
    }

    async fn get_channel_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.enter("get_channel_ids_for_user")?;
        let mut ids: Vec<String> = self
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.channel_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn create_direct_channel(
        &self,
        user: &User,
        other_user: &User,
    ) -> Result<Channel, StoreError> {
        self.enter("create_direct_channel")?;

        let name = Channel::direct_channel_name(&user.id, &other_user.id);
        if self.name_taken("", &name) {
            return Err(StoreError::AlreadyExists(format!("direct channel {}", name)));
        }

        let now = now_millis();
        let mut channel = Channel::new("", name, ChannelType::Direct)
            .with_id(ulid::Ulid::new().to_string())
            .with_creator(user.id.clone());
        channel.create_at = now;
        channel.update_at = now;

        self.channels.insert(channel.id.clone(), channel.clone());
        self.insert_member(ChannelMember::new(channel.id.clone(), user.id.clone()));
        if other_user.id != user.id {
            self.insert_member(ChannelMember::new(
                channel.id.clone(),
                other_user.id.clone(),
            ));
        }
        Ok(channel)
    }

    async fn autocomplete_in_team(
        &self,
        team_id: &str,
        term: &str,
        include_deleted: bool,
    ) -> Result<ChannelList, StoreError> {
        self.enter("autocomplete_in_team")?;

        let term = term.trim().to_lowercase();
        let mut channels: ChannelList = self
            .channels
            .iter()
            .filter(|c| c.team_id == team_id && c.channel_type == ChannelType::Open)
            .filter(|c| include_deleted || !c.is_deleted())
            .filter(|c| {
                term.is_empty() || matches_term(&c.name, &term) || matches_term(&c.display_name, &term)
            })
            .map(|c| c.value().clone())
            .collect();

        channels.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        channels.truncate(AUTOCOMPLETE_LIMIT);
        Ok(channels)
    }

    async fn permanent_delete_members_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<(), StoreError> {
        self.enter("permanent_delete_members_by_channel")?;
        self.members.retain(|(cid, _), _| cid != channel_id);
        Ok(())
    }

    async fn permanent_delete(&self, channel_id: &str) -> Result<(), StoreError> {
        self.enter("permanent_delete")?;
        self.channels
            .remove(channel_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("channel {}", channel_id)))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn save_user(&self, user: User) -> Result<User, StoreError> {
        self.enter("save_user")?;
        if user.id.is_empty() || user.username.is_empty() {
            return Err(StoreError::InvalidInput(
                "user id and username are required".into(),
            ));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<User, StoreError> {
        self.enter("get_user")?;
        self.users
            .get(user_id)
            .map(|u| u.clone())
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn get_all_profiles_in_channel(
        &self,
        channel_id: &str,
        _allow_from_cache: bool,
    ) -> Result<Vec<User>, StoreError> {
        self.enter("get_all_profiles_in_channel")?;
        let member_ids: Vec<String> = self
            .members
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.user_id.clone())
            .collect();

        let mut profiles: Vec<User> = member_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }
}
