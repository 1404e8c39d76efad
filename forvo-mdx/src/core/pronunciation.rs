//! Dictionary entry HTML for a headword's pronunciations.

use std::cmp::Reverse;

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

const ENTRY_TEMPLATE: &str = include_str!("templates/pronunciations.html.j2");

/// One recorded pronunciation of a headword, with its resolved audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pronunciation {
    pub username: String,
    pub gender: String,
    pub country: String,
    pub votes: i64,
    /// Audio path relative to the package root (`<code>/<user>/<word>.<ext>`).
    pub file_path: String,
    pub download_url: String,
    pub audio_id: i64,
}

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    username: &'a str,
    title: String,
    votes: i64,
    file_path: &'a str,
    icon_path: String,
}

/// Renders the `paraphrase` HTML stored for each dictionary entry.
pub struct EntryRenderer {
    env: Environment<'static>,
}

impl Default for EntryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Named without `.html` so autoescape stays off: `sound://` links must
        // reach the dictionary reader verbatim.
        env.add_template("pronunciations", ENTRY_TEMPLATE)
            .expect("pronunciations template should be valid");
        Self { env }
    }

    /// Render pronunciations ordered by votes (highest first, ties keep input
    /// order). Pronunciations for which `icon_for` finds no icon are omitted.
    pub fn render<F>(&self, pronunciations: &[Pronunciation], icon_for: F) -> Result<String>
    where
        F: Fn(&Pronunciation) -> Option<String>,
    {
        let mut ordered: Vec<&Pronunciation> = pronunciations.iter().collect();
        ordered.sort_by_key(|p| Reverse(p.votes));

        let items: Vec<ItemView<'_>> = ordered
            .into_iter()
            .filter_map(|p| {
                let icon_path = icon_for(p)?;
                Some(ItemView {
                    username: &p.username,
                    title: item_title(p),
                    votes: p.votes,
                    file_path: &p.file_path,
                    icon_path,
                })
            })
            .collect();

        let template = self.env.get_template("pronunciations")?;
        Ok(template.render(context! { items => items })?)
    }
}

fn item_title(p: &Pronunciation) -> String {
    let mut title = format!("{} ({})", p.username, p.country);
    if p.votes > 0 {
        title.push_str(&format!(" - {} votes", p.votes));
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pronunciation(username: &str, country: &str, votes: i64) -> Pronunciation {
        Pronunciation {
            username: username.to_string(),
            gender: "Male".to_string(),
            country: country.to_string(),
            votes,
            file_path: format!("en/{username}/hello.mp3"),
            download_url: String::new(),
            audio_id: 0,
        }
    }

    #[test]
    fn orders_by_votes_and_links_sound_files() {
        let renderer = EntryRenderer::new();
        let html = renderer
            .render(
                &[
                    pronunciation("low", "Canada", 0),
                    pronunciation("high", "Ireland", 4),
                ],
                |p| Some(format!("icons/male_{}.svg", &p.country[..2].to_uppercase())),
            )
            .expect("render");

        let high = html.find("sound://en/high/hello.mp3").expect("high link");
        let low = html.find("sound://en/low/hello.mp3").expect("low link");
        assert!(high < low);
        assert!(html.starts_with(r#"<div class="audio-pronunciations"><div class="pronunciation-item">"#));
        assert!(html.contains(r#"title="high (Ireland) - 4 votes""#));
        assert!(html.contains(r#"title="low (Canada)""#));
        assert!(html.contains(r#"<img src="icons/male_IR.svg" alt="high""#));
        assert!(html.contains(r#"<span class="vote-count">(4)</span>"#));
        assert_eq!(html.matches("vote-count\">").count(), 1);
        assert!(html.contains("<style>"));
        assert!(html.ends_with("</style></div>"));
    }

    #[test]
    fn pronunciations_without_icons_are_omitted() {
        let renderer = EntryRenderer::new();
        let html = renderer
            .render(&[pronunciation("a", "Nowhere", 1)], |_| None)
            .expect("render");
        assert_eq!(html, r#"<div class="audio-pronunciations"></div>"#);
    }
}
