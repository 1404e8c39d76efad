//! Word and entry databases built from the dump and the audio directory.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::country::{CountryMapping, mappings_by_name};
use crate::core::pronunciation::{EntryRenderer, Pronunciation};
use crate::core::svg::icon_candidates;
use crate::io::artifacts::read_json;
use crate::io::database::{DictionaryStore, WordRecord};
use crate::io::dump::scan_metadata;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "database";

/// Audio extensions tried in order.
const AUDIO_EXTENSIONS: [&str; 3] = ["opus", "mp3", "ogg"];

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!(
            "build {} and {}",
            paths.display(&paths.database),
            paths.display(&paths.simple_database)
        ),
    )
    .outputs([&paths.database, &paths.simple_database])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    let paths = ctx.paths;
    let code = ctx.locale.as_str();
    let words = collect_words(paths, code)?;
    info!(words = words.len(), "writing dictionary entries");

    let mappings: Vec<CountryMapping> = if paths.country_mappings.is_file() {
        read_json(&paths.country_mappings)?
    } else {
        Vec::new()
    };
    let by_name = mappings_by_name(&mappings);
    let icon_for = |p: &Pronunciation| {
        let mapping = by_name.get(&p.country.to_lowercase())?;
        let iso_code = mapping.iso_code.as_deref()?;
        icon_candidates(&p.gender, iso_code)
            .into_iter()
            .find(|name| paths.icons_dir.join(name).is_file())
            .map(|name| format!("icons/{name}"))
    };

    let renderer = EntryRenderer::new();
    let mut store = DictionaryStore::create(&paths.database, &paths.simple_database)?;
    for (headword, pronunciations) in &words {
        let html = renderer.render(pronunciations, &icon_for)?;
        store.insert_word(&WordRecord {
            language: code,
            headword,
            html: &html,
            pronunciations,
        })?;
    }
    let totals = store.finish()?;

    info!(words = totals.words, audio_files = totals.audio_files, "databases written");
    println!(
        "  {} words, {} audio files",
        totals.words, totals.audio_files
    );
    Ok(())
}

/// Locale records that have an audio file, grouped by display headword.
fn collect_words(
    paths: &ArtifactPaths,
    code: &str,
) -> Result<BTreeMap<String, Vec<Pronunciation>>> {
    let mut words: BTreeMap<String, Vec<Pronunciation>> = BTreeMap::new();
    let mut missing_audio = 0usize;
    let totals = scan_metadata(&paths.metadata, |entry| {
        if entry.language != code || entry.headword.is_empty() {
            return Ok(());
        }
        let headword = entry.display_headword().into_owned();
        let origin = entry.origin();
        let Some(file_path) = find_audio(&paths.root, code, &origin.username, &headword) else {
            debug!(user = %origin.username, headword = %headword, "audio file not found");
            missing_audio += 1;
            return Ok(());
        };
        words.entry(headword).or_default().push(Pronunciation {
            username: origin.username,
            gender: origin.gender,
            country: origin.country,
            votes: entry.votes,
            file_path,
            download_url: entry.download_url,
            audio_id: entry.id,
        });
        Ok(())
    })?;
    info!(
        lines = totals.lines,
        invalid = totals.invalid,
        missing_audio,
        words = words.len(),
        "metadata grouped"
    );
    Ok(words)
}

/// `<code>/<user>/<headword>.<ext>` relative to `root`, for the first extension present.
fn find_audio(root: &Path, code: &str, username: &str, headword: &str) -> Option<String> {
    AUDIO_EXTENSIONS.iter().find_map(|ext| {
        let rel = format!("{code}/{username}/{headword}.{ext}");
        root.join(&rel).is_file().then_some(rel)
    })
}
