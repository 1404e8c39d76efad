//! Built-in assets with optional on-disk overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::front_matter::LanguageTable;
use crate::core::svg::{GenderMark, Glyph};
use crate::io::config::AssetsConfig;

const VENUS_SVG: &str = include_str!("../../assets/venus.svg");
const MARS_SVG: &str = include_str!("../../assets/mars.svg");

/// The recolored glyphs drawn on icons.
#[derive(Debug, Clone)]
pub struct Glyphs {
    pub venus: Glyph,
    pub mars: Glyph,
}

impl Glyphs {
    pub fn get(&self, mark: GenderMark) -> &Glyph {
        match mark {
            GenderMark::Venus => &self.venus,
            GenderMark::Mars => &self.mars,
        }
    }
}

/// Load both glyphs; configured paths are relative to `root`.
pub fn load_glyphs(assets: &AssetsConfig, root: &Path) -> Result<Glyphs> {
    let load = |mark: GenderMark, custom: Option<&Path>, builtin: &str| -> Result<Glyph> {
        match custom {
            Some(rel) => {
                let path = root.join(rel);
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("read glyph {}", path.display()))?;
                Glyph::from_svg(&raw, mark.color())
                    .with_context(|| format!("load glyph {}", path.display()))
            }
            None => Glyph::from_svg(builtin, mark.color()),
        }
    };
    Ok(Glyphs {
        venus: load(GenderMark::Venus, assets.venus_icon.as_deref(), VENUS_SVG)?,
        mars: load(GenderMark::Mars, assets.mars_icon.as_deref(), MARS_SVG)?,
    })
}

/// The configured language table, or the built-in one.
pub fn load_language_table(assets: &AssetsConfig, root: &Path) -> Result<LanguageTable> {
    match &assets.languages_file {
        Some(rel) => {
            let path = root.join(rel);
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            LanguageTable::from_json(&raw).with_context(|| format!("load {}", path.display()))
        }
        None => LanguageTable::builtin(),
    }
}
