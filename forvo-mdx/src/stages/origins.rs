//! Origin statistics for the locale.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::core::locale::LocaleCode;
use crate::core::origins::{OriginCollector, OriginStats};
use crate::io::artifacts::write_json;
use crate::io::dump::scan_metadata;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "origins";

/// Matching records between progress messages.
const PROGRESS_EVERY: usize = 100_000;

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!(
            "collect speaker genders and countries into {}",
            paths.display(&paths.origin_stats)
        ),
    )
    .outputs([&paths.origin_stats])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    let stats = collect_origins(&ctx.paths.metadata, ctx.locale)?;
    write_json(&ctx.paths.origin_stats, &stats)?;
    println!(
        "  {} genders, {} countries, {} combinations",
        stats.unique_genders_origin.len(),
        stats.unique_countries_origin.len(),
        stats.unique_combinations.len()
    );
    Ok(())
}

/// Stream the dump once and gather origin statistics for `locale`.
pub fn collect_origins(metadata: &Path, locale: &LocaleCode) -> Result<OriginStats> {
    let mut collector = OriginCollector::new(locale.as_str());
    let totals = scan_metadata(metadata, |entry| {
        if collector.observe(&entry) && collector.matched() % PROGRESS_EVERY == 0 {
            info!(matched = collector.matched(), "collecting origins");
        }
        Ok(())
    })?;
    info!(
        lines = totals.lines,
        invalid = totals.invalid,
        matched = collector.matched(),
        "origins collected"
    );
    Ok(collector.finish())
}
