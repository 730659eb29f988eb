//! Tantivy schema for the channel index.
//!
//! Indexes two document types:
//! - Channels: team, name prefixes, display name
//! - Users: name prefixes and channel associations for people-search

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::error::EngineError;

/// Document types stored in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Channel,
    User,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Channel => "channel",
            DocType::User => "user",
        }
    }

    /// Key that is unique across document types.
    pub fn key(&self, id: &str) -> String {
        format!("{}:{}", self.as_str(), id)
    }
}

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct ChannelSchema {
    schema: Schema,
    /// "channel" or "user" (STRING | STORED)
    pub doc_type: Field,
    /// Primary key: channel id or user id (STRING | STORED)
    pub doc_id: Field,
    /// Type-qualified key used for replace and delete (STRING)
    pub doc_key: Field,
    /// Owning team of a channel (STRING)
    pub team_id: Field,
    /// Lower-cased word prefixes, one value per prefix (STRING)
    pub prefix: Field,
    /// Channel ids a user belongs to, one value per id (STRING)
    pub channel_ids: Field,
    /// Display name or username (TEXT | STORED)
    pub display_name: Field,
}

impl ChannelSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a ChannelSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, EngineError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| EngineError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            doc_type: field("doc_type")?,
            doc_id: field("doc_id")?,
            doc_key: field("doc_key")?,
            team_id: field("team_id")?,
            prefix: field("prefix")?,
            channel_ids: field("channel_ids")?,
            display_name: field("display_name")?,
            schema,
        })
    }
}

/// Build the channel index schema.
pub fn build_channel_schema() -> ChannelSchema {
    let mut schema_builder = Schema::builder();

    let doc_type = schema_builder.add_text_field("doc_type", STRING | STORED);
    let doc_id = schema_builder.add_text_field("doc_id", STRING | STORED);
    let doc_key = schema_builder.add_text_field("doc_key", STRING);
    let team_id = schema_builder.add_text_field("team_id", STRING);
    let prefix = schema_builder.add_text_field("prefix", STRING);
    let channel_ids = schema_builder.add_text_field("channel_ids", STRING);
    let display_name = schema_builder.add_text_field("display_name", TEXT | STORED);

    ChannelSchema {
        schema: schema_builder.build(),
        doc_type,
        doc_id,
        doc_key,
        team_id,
        prefix,
        channel_ids,
        display_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_schema() {
        let schema = build_channel_schema();
        assert!(schema.schema().get_field("doc_type").is_ok());
        assert!(schema.schema().get_field("prefix").is_ok());
        assert!(schema.schema().get_field("channel_ids").is_ok());
    }

    #[test]
    fn test_doc_type_conversion() {
        assert_eq!(DocType::Channel.as_str(), "channel");
        assert_eq!(DocType::User.as_str(), "user");
        assert_eq!(DocType::Channel.key("ch-1"), "channel:ch-1");
    }

    #[test]
    fn test_from_schema() {
        let original = build_channel_schema();
        let rebuilt = ChannelSchema::from_schema(original.schema().clone()).unwrap();
        assert_eq!(rebuilt.doc_id, original.doc_id);
        assert_eq!(rebuilt.prefix, original.prefix);
    }

    #[test]
    fn test_from_schema_rejects_foreign_schema() {
        let mut builder = Schema::builder();
        builder.add_text_field("doc_id", STRING);
        let err = ChannelSchema::from_schema(builder.build()).unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch(_)));
    }
}
