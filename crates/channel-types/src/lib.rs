//! # channel-types
//!
//! Shared domain types for the channel search layer.
//!
//! This crate defines the data structures used throughout the system:
//! - Channels: primary records, optionally indexed when globally discoverable
//! - Channel members: associations between channels and users
//! - Users: participants, indexed for people-search
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use channel_types::{Channel, ChannelType};
//!
//! let channel = Channel::open("team-1", "town-square");
//! assert_eq!(channel.channel_type, ChannelType::Open);
//! assert!(channel.is_globally_discoverable());
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod user;

pub use channel::{AutocompleteOptions, Channel, ChannelList, ChannelMember, ChannelType};
pub use config::{EngineKind, EngineSettings, PropagationSettings, Settings};
pub use error::ConfigError;
pub use user::User;

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
