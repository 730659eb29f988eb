//! Document mapping from domain types to Tantivy documents.

use std::collections::BTreeSet;

use tantivy::doc;
use tantivy::TantivyDocument;

use channel_types::{Channel, User};

use crate::schema::{ChannelSchema, DocType};

/// Longest prefix indexed per token, in characters.
const MAX_PREFIX_CHARS: usize = 32;

/// Lower-cased prefixes of every word of `texts`, plus prefixes of each
/// whole text so multi-word terms ("town sq") still match.
pub fn autocomplete_prefixes<'a>(texts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut prefixes = BTreeSet::new();
    for text in texts {
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            continue;
        }
        add_prefixes(&lowered, &mut prefixes);
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            add_prefixes(word, &mut prefixes);
        }
    }
    prefixes
}

/// Normalize a search term to the form prefixes are indexed in.
///
/// Terms longer than the indexed prefixes are cut to the longest indexed
/// prefix, so the search returns a superset instead of nothing.
pub fn query_prefix(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .chars()
        .take(MAX_PREFIX_CHARS)
        .collect()
}

fn add_prefixes(token: &str, out: &mut BTreeSet<String>) {
    for (end, ch) in token.char_indices().take(MAX_PREFIX_CHARS) {
        out.insert(token[..end + ch.len_utf8()].to_string());
    }
}

/// Convert a channel to a Tantivy document.
pub fn channel_to_doc(schema: &ChannelSchema, channel: &Channel) -> TantivyDocument {
    let mut doc = doc!(
        schema.doc_type => DocType::Channel.as_str(),
        schema.doc_id => channel.id.clone(),
        schema.doc_key => DocType::Channel.key(&channel.id),
        schema.team_id => channel.team_id.clone(),
        schema.display_name => channel.display_name.clone()
    );
    for prefix in autocomplete_prefixes([channel.name.as_str(), channel.display_name.as_str()]) {
        doc.add_text(schema.prefix, prefix);
    }
    doc
}

/// Convert a user and their channel associations to a Tantivy document.
pub fn user_to_doc(schema: &ChannelSchema, user: &User, channel_ids: &[String]) -> TantivyDocument {
    let full_name = user.full_name();
    let mut doc = doc!(
        schema.doc_type => DocType::User.as_str(),
        schema.doc_id => user.id.clone(),
        schema.doc_key => DocType::User.key(&user.id),
        schema.display_name => user.username.clone()
    );
    for prefix in autocomplete_prefixes([
        user.username.as_str(),
        user.nickname.as_str(),
        full_name.as_str(),
    ]) {
        doc.add_text(schema.prefix, prefix);
    }
    for channel_id in channel_ids {
        doc.add_text(schema.channel_ids, channel_id);
    }
    doc
}
