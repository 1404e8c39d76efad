//! Country -> ISO code mapping and circle flag downloads.

use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::country::{CountryMapping, CountryRecord, build_country_index, flag_file_name};
use crate::core::origins::OriginStats;
use crate::io::artifacts::{read_json, write_json};
use crate::io::fetch::fetch_to;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "flags";

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!(
            "map speaker countries to ISO codes and download flags into {}/",
            paths.display(&paths.flags_dir)
        ),
    )
    .outputs([&paths.country_mappings, &paths.flags_dir])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    let paths = ctx.paths;
    let stats: OriginStats = read_json(&paths.origin_stats)?;
    let records: Vec<CountryRecord> = read_json(&paths.countries)?;
    let index = build_country_index(&records);
    fs::create_dir_all(&paths.flags_dir)
        .with_context(|| format!("create {}", paths.flags_dir.display()))?;

    let mut mappings = Vec::with_capacity(stats.unique_countries_origin.len());
    for country in &stats.unique_countries_origin {
        let mut mapping = CountryMapping::lookup(country, &index);
        if let Some(code) = mapping.iso_code.clone() {
            attach_flag(ctx, &mut mapping, &code);
        } else {
            warn!(country = %country, "country not found in dataset");
        }
        mappings.push(mapping);
    }
    write_json(&paths.country_mappings, &mappings)?;

    let mapped = mappings.iter().filter(|m| m.iso_code.is_some()).count();
    let flagged = mappings.iter().filter(|m| m.flag_file.is_some()).count();
    info!(countries = mappings.len(), mapped, flagged, "country mapping finished");
    println!(
        "  {} countries, {mapped} mapped, {flagged} with flags",
        mappings.len()
    );
    Ok(())
}

/// Reuse or download the flag for `code`; a failed download is recorded, not raised.
fn attach_flag(ctx: &BuildContext<'_>, mapping: &mut CountryMapping, code: &str) {
    let file_name = flag_file_name(code);
    let dest = ctx.paths.flags_dir.join(&file_name);
    if dest.is_file() {
        mapping.flag_file = Some(file_name);
        return;
    }
    let url = ctx.config.flag_url(code);
    match fetch_to(ctx.runner(), ctx.config, &ctx.paths.root, &url, &dest) {
        Ok(()) => mapping.flag_file = Some(file_name),
        Err(err) => {
            warn!(code, error = %format!("{err:#}"), "flag download failed");
            mapping.error = Some(format!("{err:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::country::NOT_FOUND;
    use crate::test_support::{COUNTRIES_JSON, Harness};

    fn harness_with_inputs(root: &std::path::Path) -> Harness {
        let harness = Harness::new(root, "es", &[]).expect("harness");
        fs::write(&harness.paths.countries, COUNTRIES_JSON).expect("countries");
        write_json(
            &harness.paths.origin_stats,
            &OriginStats {
                unique_genders_origin: vec!["Female".into()],
                unique_countries_origin: vec!["Atlantis".into(), "España".into(), "Mexico".into()],
                unique_combinations: Vec::new(),
            },
        )
        .expect("stats");
        harness
    }

    #[test]
    fn maps_countries_and_downloads_flags() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = harness_with_inputs(temp.path());

        run(&harness.context(false)).expect("run");

        let mappings: Vec<CountryMapping> =
            read_json(&harness.paths.country_mappings).expect("mappings");
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings[0].error.as_deref(), Some(NOT_FOUND));
        assert_eq!(mappings[1].iso_code.as_deref(), Some("ES"));
        assert_eq!(mappings[1].flag_file.as_deref(), Some("ES.svg"));
        assert_eq!(mappings[2].flag_file.as_deref(), Some("MX.svg"));
        assert!(harness.paths.flags_dir.join("ES.svg").is_file());
        assert!(harness.paths.flags_dir.join("MX.svg").is_file());

        let urls: Vec<String> = harness
            .runner
            .calls()
            .iter()
            .filter_map(|c| c.args.last().map(|a| a.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://hatscripts.github.io/circle-flags/flags/es.svg",
                "https://hatscripts.github.io/circle-flags/flags/mx.svg",
            ]
        );
    }

    #[test]
    fn existing_flags_are_reused() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = harness_with_inputs(temp.path());
        fs::create_dir_all(&harness.paths.flags_dir).expect("mkdir");
        fs::write(harness.paths.flags_dir.join("ES.svg"), "<svg/>").expect("flag");

        run(&harness.context(false)).expect("run");

        assert_eq!(harness.runner.calls().len(), 1, "only MX is downloaded");
        assert_eq!(
            fs::read_to_string(harness.paths.flags_dir.join("ES.svg")).expect("read"),
            "<svg/>"
        );
    }

    #[test]
    fn failed_flag_download_is_recorded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut harness = harness_with_inputs(temp.path());
        harness.runner = harness.runner.fail_urls_containing("/mx.svg");

        run(&harness.context(false)).expect("run");

        let mappings: Vec<CountryMapping> =
            read_json(&harness.paths.country_mappings).expect("mappings");
        let mexico = &mappings[2];
        assert_eq!(mexico.iso_code.as_deref(), Some("MX"));
        assert_eq!(mexico.flag_file, None);
        assert!(mexico.error.as_deref().is_some_and(|e| e.contains("404")));
    }
}
