//! User (participant) type.

use serde::{Deserialize, Serialize};

/// A user profile.
///
/// Users are indexed for people-search together with the ids of the
/// channels they belong to, so membership changes re-index the user
/// rather than the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,

    #[serde(default)]
    pub nickname: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    /// Soft-delete marker (ms since epoch). Zero means active.
    #[serde(default)]
    pub delete_at: i64,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            nickname: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            delete_at: 0,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    /// Full name, or empty when neither part is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
