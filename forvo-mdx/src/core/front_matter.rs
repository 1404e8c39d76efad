//! Dictionary title and description.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const BUILTIN_LANGUAGES: &str = include_str!("../../assets/languages.json");

/// Language code -> display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTable(BTreeMap<String, String>);

impl LanguageTable {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_LANGUAGES).context("parse built-in language table")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let map: BTreeMap<String, String> =
            serde_json::from_str(raw).context("parse language table")?;
        Ok(Self(map))
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }
}

/// Rendered `title.html` / `description.html` contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub description: String,
}

/// Render both templates with `language` (display name) and `code` in scope.
pub fn render_front_matter(
    title_template: &str,
    description_template: &str,
    code: &str,
    language: &str,
) -> Result<FrontMatter> {
    let env = Environment::new();
    let ctx = context! { language => language, code => code };
    let title = env
        .render_str(title_template, &ctx)
        .context("render title template")?;
    let description = env
        .render_str(description_template, &ctx)
        .context("render description template")?;
    Ok(FrontMatter { title, description })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_knows_common_codes() {
        let table = LanguageTable::builtin().expect("builtin");
        assert_eq!(table.name("en"), Some("English"));
        assert_eq!(table.name("yue"), Some("Cantonese"));
        assert_eq!(table.name("zz"), None);
    }

    #[test]
    fn renders_language_into_templates() {
        let fm = render_front_matter(
            "Forvo {{ language }}",
            "All Forvo {{ language }} audios.<br>Code: {{ code }}",
            "de",
            "German",
        )
        .expect("render");
        assert_eq!(fm.title, "Forvo German");
        assert_eq!(fm.description, "All Forvo German audios.<br>Code: de");
    }

    #[test]
    fn custom_table_overrides_builtin() {
        let table = LanguageTable::from_json(r#"{"xx": "Test Language"}"#).expect("table");
        assert_eq!(table.name("xx"), Some("Test Language"));
        assert!(LanguageTable::from_json("[]").is_err());
    }
}
