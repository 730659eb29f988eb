//! Command implementations for the channel search binary.
//!
//! Handles:
//! - engines: print configured engines and capability flags
//! - autocomplete: seed fixtures through the search layer, then query

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use channel_layer::SearchLayer;
use channel_search::{EngineHandle, SearchEngineRegistry, TantivyChannelEngine};
use channel_storage::{ChannelStore, MemoryStore, UserStore};
use channel_types::{Channel, ChannelList, ChannelMember, EngineKind, Settings, User};

/// Load configuration and apply the CLI log level override.
pub fn load_settings(config_path: Option<&str>, log_level_override: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Open every configured engine, in configured order.
pub fn build_registry(settings: &Settings) -> Result<SearchEngineRegistry> {
    let mut engines: Vec<EngineHandle> = Vec::with_capacity(settings.engines.len());
    for engine in &settings.engines {
        let handle: EngineHandle = match engine.kind {
            EngineKind::Tantivy => Arc::new(
                TantivyChannelEngine::open(engine)
                    .with_context(|| format!("Failed to open engine {}", engine.name))?,
            ),
        };
        engines.push(handle);
    }
    Ok(SearchEngineRegistry::with_engines(engines))
}

/// Users, channels and memberships to seed the store with.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub members: Vec<ChannelMember>,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid fixtures {:?}", path))
    }

    /// Write fixtures through the search layer so indexing fires.
    pub async fn seed(
        &self,
        layer: &SearchLayer,
        users: &dyn UserStore,
        max_channels_per_team: i64,
    ) -> Result<()> {
        let channels = layer.channel();

        for user in &self.users {
            users
                .save_user(user.clone())
                .await
                .with_context(|| format!("Failed to save user {}", user.id))?;
            layer.index_user(user).await;
        }
        for channel in &self.channels {
            channels
                .save(channel.clone(), max_channels_per_team)
                .await
                .with_context(|| format!("Failed to save channel {}", channel.id))?;
        }
        for member in &self.members {
            channels.save_member(member.clone()).await.with_context(|| {
                format!(
                    "Failed to add {} to channel {}",
                    member.user_id, member.channel_id
                )
            })?;
        }

        info!(
            users = self.users.len(),
            channels = self.channels.len(),
            members = self.members.len(),
            "Seeded fixtures"
        );
        Ok(())
    }
}

/// Seed `fixtures` into a fresh in-memory store, wait for indexing and
/// run one autocomplete against the search layer.
pub async fn autocomplete_with_fixtures(
    settings: &Settings,
    fixtures: &Fixtures,
    team_id: &str,
    term: &str,
    include_deleted: bool,
) -> Result<ChannelList> {
    let registry = Arc::new(build_registry(settings)?);
    info!(engines = ?registry.status(), "Opened search engines");
    let store = Arc::new(MemoryStore::new());
    let layer = SearchLayer::new(store.clone(), store.clone(), registry, &settings.propagation);

    fixtures
        .seed(&layer, store.as_ref(), settings.max_channels_per_team)
        .await?;
    layer.drain().await;
    info!(metrics = ?layer.metrics(), "Index propagation drained");

    let channels = layer
        .channel()
        .autocomplete_in_team(team_id, term, include_deleted)
        .await
        .context("Autocomplete failed")?;
    Ok(channels)
}

/// `engines` command.
pub fn show_engines(config_path: Option<&str>, log_level: Option<&str>) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    if settings.engines.is_empty() {
        println!("No engines configured; autocomplete uses the store directly.");
        return Ok(());
    }

    println!("{:<16} {:<8} {:<9} {:<13} INDEX PATH", "NAME", "KIND", "INDEXING", "AUTOCOMPLETE");
    for engine in &settings.engines {
        println!(
            "{:<16} {:<8} {:<9} {:<13} {}",
            engine.name,
            engine.kind.to_string(),
            engine.indexing_enabled,
            engine.autocomplete_enabled,
            engine.expanded_index_path().display()
        );
    }
    Ok(())
}

/// `autocomplete` command.
pub async fn run_autocomplete(
    config_path: Option<&str>,
    log_level: Option<&str>,
    fixtures_path: &Path,
    team_id: &str,
    term: &str,
    include_deleted: bool,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    let fixtures = Fixtures::load(fixtures_path)?;
    let channels =
        autocomplete_with_fixtures(&settings, &fixtures, team_id, term, include_deleted).await?;

    println!("{}", serde_json::to_string_pretty(&channels)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_types::EngineSettings;
    use tempfile::TempDir;

    fn fixtures() -> Fixtures {
        serde_json::from_str(
            r#"{
                "users": [{"id": "u1", "username": "alice"}],
                "channels": [
                    {"id": "c1", "team_id": "team-1", "channel_type": "open", "name": "town-square", "display_name": "Town Square"},
                    {"id": "c2", "team_id": "team-1", "channel_type": "open", "name": "off-topic", "display_name": "Off-Topic"},
                    {"id": "c3", "team_id": "team-1", "channel_type": "private", "name": "town-council", "display_name": "Town Council"},
                    {"id": "c4", "team_id": "team-1", "channel_type": "open", "name": "town-archive", "display_name": "Town Archive", "delete_at": 1700000000000}
                ],
                "members": [{"channel_id": "c3", "user_id": "u1"}]
            }"#,
        )
        .unwrap()
    }

    fn settings(engines: Vec<EngineSettings>) -> Settings {
        Settings {
            engines,
            ..Settings::default()
        }
    }

    fn ids(channels: &ChannelList) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_fixtures_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fixtures.json");
        fs::write(&path, serde_json::to_string(&fixtures()).unwrap()).unwrap();

        let loaded = Fixtures::load(&path).unwrap();
        assert_eq!(loaded.users.len(), 1);
        assert_eq!(loaded.channels.len(), 4);
        assert_eq!(loaded.members[0].roles, "");
    }

    #[test]
    fn test_fixtures_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Fixtures::load(&dir.path().join("missing.json")).is_err());
    }

    #[tokio::test]
    async fn test_autocomplete_through_tantivy() {
        let dir = TempDir::new().unwrap();
        let engine = EngineSettings::tantivy("primary", dir.path().join("idx").to_string_lossy());
        let settings = settings(vec![engine]);

        let channels = autocomplete_with_fixtures(&settings, &fixtures(), "team-1", "town", false)
            .await
            .unwrap();
        assert_eq!(ids(&channels), vec!["c1"]);

        let channels = autocomplete_with_fixtures(&settings, &fixtures(), "team-1", "town", true)
            .await
            .unwrap();
        let mut found = ids(&channels);
        found.sort();
        assert_eq!(found, vec!["c1", "c4"]);
    }

    #[tokio::test]
    async fn test_autocomplete_without_engines_uses_store() {
        let settings = settings(vec![]);

        let channels = autocomplete_with_fixtures(&settings, &fixtures(), "team-1", "off", false)
            .await
            .unwrap();
        assert_eq!(ids(&channels), vec!["c2"]);
    }

    #[test]
    fn test_build_registry_keeps_order() {
        let dir = TempDir::new().unwrap();
        let settings = settings(vec![
            EngineSettings::tantivy("first", dir.path().join("a").to_string_lossy()),
            EngineSettings::tantivy("second", dir.path().join("b").to_string_lossy())
                .with_indexing(false),
        ]);

        let registry = build_registry(&settings).unwrap();
        let names: Vec<String> = registry
            .active_engines()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(!registry.get("second").unwrap().is_indexing_enabled());
    }
}
