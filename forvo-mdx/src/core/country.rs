//! Country name normalization and ISO code mapping.
//!
//! The reference dataset is the `countries.json` published by
//! mledoze/countries: one object per country with `cca2`/`cca3` codes, common
//! and official names, alternative spellings and per-language translations.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Error recorded for a country with no match in the dataset.
pub const NOT_FOUND: &str = "Country not found in mapping";

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    pub cca2: Option<String>,
    pub cca3: Option<String>,
    pub name: CountryName,
    #[serde(default, rename = "altSpellings")]
    pub alt_spellings: Vec<String>,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryName {
    pub common: String,
    pub official: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Translation {
    pub common: String,
    pub official: String,
}

impl CountryRecord {
    fn code(&self) -> Option<&str> {
        self.cca2.as_deref().or(self.cca3.as_deref())
    }
}

/// Result of mapping one speaker country (persisted in `country_mappings.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMapping {
    pub original_name: String,
    pub normalized_name: String,
    pub iso_code: Option<String>,
    pub flag_file: Option<String>,
    pub error: Option<String>,
}

impl CountryMapping {
    /// Map `name` through `index`. A mapped country still has to get its flag.
    pub fn lookup(name: &str, index: &HashMap<String, String>) -> Self {
        let normalized_name = normalize_country_name(name);
        let iso_code = index.get(&normalized_name).cloned();
        let error = iso_code.is_none().then(|| NOT_FOUND.to_string());
        Self {
            original_name: name.to_string(),
            normalized_name,
            iso_code,
            flag_file: None,
            error,
        }
    }
}

/// Flag file name for an ISO code, inside the flags directory.
pub fn flag_file_name(iso_code: &str) -> String {
    format!("{iso_code}.svg")
}

/// Lowercase, decompose (NFKD) and drop everything outside ASCII.
pub fn normalize_country_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .nfkd()
        .filter(char::is_ascii)
        .collect()
}

/// Normalized name -> country code, over every known spelling.
///
/// Later records overwrite earlier ones when two countries share a spelling.
pub fn build_country_index(records: &[CountryRecord]) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for record in records {
        let Some(code) = record.code() else {
            continue;
        };
        let mut insert = |name: &str| {
            let normalized = normalize_country_name(name);
            if !normalized.is_empty() {
                index.insert(normalized, code.to_string());
            }
        };
        insert(&record.name.common);
        insert(&record.name.official);
        for alt in &record.alt_spellings {
            insert(alt);
        }
        for translation in record.translations.values() {
            insert(&translation.common);
            insert(&translation.official);
        }
    }
    index
}

/// Lowercased original name -> mapping, the lookup used by icons and entries.
pub fn mappings_by_name(mappings: &[CountryMapping]) -> HashMap<String, &CountryMapping> {
    mappings
        .iter()
        .map(|m| (m.original_name.to_lowercase(), m))
        .collect()
}
