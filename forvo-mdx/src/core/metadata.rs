//! Forvo metadata records (one JSON object per line of `metadata.jsonl`).

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer};

/// A single pronunciation record from the metadata dump.
///
/// Every field is optional in the dump; missing or `null` values fall back to
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(deserialize_with = "null_as_default")]
    pub headword: String,
    pub query_word: Option<String>,
    /// `[username, gender, country]`, occasionally shorter.
    #[serde(deserialize_with = "null_as_default")]
    pub origin: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub votes: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub download_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Speaker attribution extracted from `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub username: String,
    pub gender: String,
    pub country: String,
}

impl MetadataEntry {
    pub fn parse_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }

    /// Gender and country (trimmed) when the origin is complete.
    pub fn gender_and_country(&self) -> Option<(&str, &str)> {
        match self.origin.as_slice() {
            [_, gender, country, ..] => Some((gender.trim(), country.trim())),
            _ => None,
        }
    }

    /// Speaker attribution with defaults for a truncated origin.
    pub fn origin(&self) -> Origin {
        let field = |idx: usize| self.origin.get(idx).cloned();
        Origin {
            username: field(0).unwrap_or_else(|| "unknown".to_string()),
            gender: field(1).unwrap_or_default(),
            country: field(2).unwrap_or_default(),
        }
    }

    /// The headword as shown in the dictionary.
    ///
    /// When `query_word` differs from `headword`, the percent-decoded query
    /// word wins (the dump stores the URL form there).
    pub fn display_headword(&self) -> Cow<'_, str> {
        match self.query_word.as_deref() {
            Some(query) if query != self.headword => percent_decode_str(query).decode_utf8_lossy(),
            _ => Cow::Borrowed(self.headword.as_str()),
        }
    }
}
