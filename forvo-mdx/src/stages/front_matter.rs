//! Dictionary title and description pages.

use anyhow::{Result, anyhow};

use crate::core::front_matter::render_front_matter;
use crate::io::artifacts::write_text;
use crate::io::assets::load_language_table;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "front-matter";

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!(
            "write {} and {}",
            paths.display(&paths.title),
            paths.display(&paths.description)
        ),
    )
    .outputs([&paths.title, &paths.description])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    let code = ctx.locale.as_str();
    let table = load_language_table(&ctx.config.assets, &ctx.paths.root)?;
    let language = table
        .name(code)
        .ok_or_else(|| anyhow!("language code '{code}' not found in the language table"))?;
    let templates = &ctx.config.front_matter;
    let rendered = render_front_matter(
        &templates.title_template,
        &templates.description_template,
        code,
        language,
    )?;
    write_text(&ctx.paths.title, &rendered.title)?;
    write_text(&ctx.paths.description, &rendered.description)?;
    println!("  title: {}", rendered.title);
    Ok(())
}
