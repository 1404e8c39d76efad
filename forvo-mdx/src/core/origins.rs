//! Per-locale speaker origin statistics.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::metadata::MetadataEntry;

/// Distinct genders, countries and (gender, country) pairs for one locale.
///
/// All lists are sorted and deduplicated, so the serialized form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginStats {
    pub unique_genders_origin: Vec<String>,
    pub unique_countries_origin: Vec<String>,
    pub unique_combinations: Vec<(String, String)>,
}

/// Streaming accumulator for [`OriginStats`].
#[derive(Debug, Default)]
pub struct OriginCollector {
    language: String,
    genders: BTreeSet<String>,
    countries: BTreeSet<String>,
    combinations: BTreeSet<(String, String)>,
    matched: usize,
}

impl OriginCollector {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Self::default()
        }
    }

    /// Record `entry` if it belongs to the locale and has a complete origin.
    ///
    /// Returns whether the entry was counted.
    pub fn observe(&mut self, entry: &MetadataEntry) -> bool {
        if entry.language != self.language {
            return false;
        }
        let Some((gender, country)) = entry.gender_and_country() else {
            return false;
        };
        self.genders.insert(gender.to_string());
        self.countries.insert(country.to_string());
        self.combinations
            .insert((gender.to_string(), country.to_string()));
        self.matched += 1;
        true
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn finish(self) -> OriginStats {
        OriginStats {
            unique_genders_origin: self.genders.into_iter().collect(),
            unique_countries_origin: self.countries.into_iter().collect(),
            unique_combinations: self.combinations.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(language: &str, origin: &[&str]) -> MetadataEntry {
        MetadataEntry {
            language: language.to_string(),
            origin: origin.iter().map(|s| s.to_string()).collect(),
            ..MetadataEntry::default()
        }
    }

    #[test]
    fn collects_sorted_unique_values_for_locale() {
        let mut collector = OriginCollector::new("es");
        assert!(collector.observe(&entry("es", &["a", "Male", "Spain"])));
        assert!(collector.observe(&entry("es", &["b", "Female", " Mexico "])));
        assert!(collector.observe(&entry("es", &["c", "Male", "Spain"])));
        assert!(!collector.observe(&entry("en", &["d", "Male", "Canada"])));
        assert!(!collector.observe(&entry("es", &["e", "Male"])));
        assert_eq!(collector.matched(), 3);

        let stats = collector.finish();
        assert_eq!(stats.unique_genders_origin, vec!["Female", "Male"]);
        assert_eq!(stats.unique_countries_origin, vec!["Mexico", "Spain"]);
        assert_eq!(
            stats.unique_combinations,
            vec![
                ("Female".to_string(), "Mexico".to_string()),
                ("Male".to_string(), "Spain".to_string()),
            ]
        );
    }

    #[test]
    fn serializes_combinations_as_pairs() {
        let mut collector = OriginCollector::new("en");
        collector.observe(&entry("en", &["a", "Male", "Ireland"]));
        let json = serde_json::to_value(collector.finish()).expect("serialize");
        assert_eq!(json["unique_combinations"][0][0], "Male");
        assert_eq!(json["unique_combinations"][0][1], "Ireland");
    }
}
