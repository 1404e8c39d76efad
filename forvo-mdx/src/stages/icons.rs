//! Speaker icons: a flag per country with a gender glyph in the corner.

use std::fs;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::core::country::{CountryMapping, mappings_by_name};
use crate::core::origins::OriginStats;
use crate::core::svg::{GenderMark, compose_icon, icon_file_name};
use crate::io::artifacts::read_json;
use crate::io::assets::load_glyphs;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "icons";

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!(
            "compose gender/flag icons into {}/",
            paths.display(&paths.icons_dir)
        ),
    )
    .outputs([&paths.icons_dir])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    let paths = ctx.paths;
    let stats: OriginStats = read_json(&paths.origin_stats)?;
    let mappings: Vec<CountryMapping> = read_json(&paths.country_mappings)?;
    let by_name = mappings_by_name(&mappings);
    let glyphs = load_glyphs(&ctx.config.assets, &paths.root)?;

    let mut created = 0usize;
    let mut icons = Vec::new();
    for (gender, country) in &stats.unique_combinations {
        let Some(mapping) = by_name.get(&country.to_lowercase()) else {
            debug!(country = %country, "country not mapped, skipping icon");
            continue;
        };
        let (Some(iso_code), Some(flag_file)) = (&mapping.iso_code, &mapping.flag_file) else {
            debug!(country = %country, "no flag for country, skipping icon");
            continue;
        };
        let flag_path = paths.flags_dir.join(flag_file);
        if !flag_path.is_file() {
            warn!(flag = %flag_path.display(), "flag file missing, skipping icon");
            continue;
        }

        let file_name = icon_file_name(gender, iso_code);
        let glyph = GenderMark::from_gender(gender).map(|mark| glyphs.get(mark));
        let composed = fs::read_to_string(&flag_path)
            .with_context(|| format!("read {}", flag_path.display()))
            .and_then(|flag| compose_icon(&flag, glyph));
        match composed {
            Ok(svg) => {
                icons.push((file_name, svg));
                created += 1;
            }
            Err(err) => warn!(icon = %file_name, error = %format!("{err:#}"), "icon not created"),
        }
    }

    fs::create_dir_all(&paths.icons_dir)
        .with_context(|| format!("create {}", paths.icons_dir.display()))?;
    for (file_name, svg) in &icons {
        let dest = paths.icons_dir.join(file_name);
        fs::write(&dest, svg).with_context(|| format!("write {}", dest.display()))?;
    }

    let total = stats.unique_combinations.len();
    info!(created, total, "icons composed");
    println!("  {created} of {total} icons created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::artifacts::write_json;
    use crate::test_support::{FLAG_SVG, Harness};

    fn mapping(name: &str, iso: Option<&str>, flag: Option<&str>) -> CountryMapping {
        CountryMapping {
            original_name: name.to_string(),
            normalized_name: name.to_lowercase(),
            iso_code: iso.map(String::from),
            flag_file: flag.map(String::from),
            error: None,
        }
    }

    fn pair(gender: &str, country: &str) -> (String, String) {
        (gender.to_string(), country.to_string())
    }

    #[test]
    fn composes_one_icon_per_mapped_combination() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(temp.path(), "es", &[]).expect("harness");
        let paths = &harness.paths;
        write_json(
            &paths.origin_stats,
            &OriginStats {
                unique_combinations: vec![
                    pair("Female", "Spain"),
                    pair("Male", "spain"),
                    pair("", "Spain"),
                    pair("Female", "Atlantis"),
                    pair("Female", "Mexico"),
                    pair("Male", "Chile"),
                ],
                ..OriginStats::default()
            },
        )
        .expect("stats");
        write_json(
            &paths.country_mappings,
            &vec![
                mapping("Spain", Some("ES"), Some("ES.svg")),
                mapping("Atlantis", None, None),
                mapping("Mexico", Some("MX"), None),
                mapping("Chile", Some("CL"), Some("CL.svg")),
            ],
        )
        .expect("mappings");
        fs::create_dir_all(&paths.flags_dir).expect("mkdir");
        fs::write(paths.flags_dir.join("ES.svg"), FLAG_SVG).expect("flag");

        run(&harness.context(false)).expect("run");

        let mut names: Vec<String> = fs::read_dir(&paths.icons_dir)
            .expect("icons")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["_ES.svg", "female_ES.svg", "male_ES.svg"]);

        let female = fs::read_to_string(paths.icons_dir.join("female_ES.svg")).expect("read");
        assert!(female.contains("#FF69B4"));
        assert!(female.contains(r#"<g transform="translate(379, 379) scale(0.25)">"#), "{female}");
        let plain = fs::read_to_string(paths.icons_dir.join("_ES.svg")).expect("read");
        assert!(!plain.contains("<g transform"));
    }

    #[test]
    fn broken_flag_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(temp.path(), "es", &[]).expect("harness");
        let paths = &harness.paths;
        write_json(
            &paths.origin_stats,
            &OriginStats {
                unique_combinations: vec![pair("Male", "Spain")],
                ..OriginStats::default()
            },
        )
        .expect("stats");
        write_json(
            &paths.country_mappings,
            &vec![mapping("Spain", Some("ES"), Some("ES.svg"))],
        )
        .expect("mappings");
        fs::create_dir_all(&paths.flags_dir).expect("mkdir");
        fs::write(paths.flags_dir.join("ES.svg"), "<html/>").expect("flag");

        run(&harness.context(false)).expect("run");
        assert!(paths.icons_dir.is_dir());
        assert!(!paths.icons_dir.join("male_ES.svg").exists());
    }
}
