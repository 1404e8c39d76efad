//! Reference country dataset.

use anyhow::Result;

use crate::io::fetch::fetch_to;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "countries";

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!("download the country dataset to {}", paths.display(&paths.countries)),
    )
    .outputs([&paths.countries])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    fetch_to(
        ctx.runner(),
        ctx.config,
        &ctx.paths.root,
        &ctx.config.sources.countries_url,
        &ctx.paths.countries,
    )
}
