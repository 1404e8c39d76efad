//! Packaging with the external dictionary compiler.

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::info;

use crate::io::compiler::{compile, install_compiler};
use crate::io::paths::ArtifactPaths;
use crate::io::prompt::confirm;
use crate::io::toolchain::locate_compiler;
use crate::pipeline::{BuildContext, Stage};

pub const NAME: &str = "compile";

pub fn stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        NAME,
        format!(
            "compile {} and {}",
            paths.display(&paths.mdx),
            paths.display(&paths.mdd)
        ),
    )
    .outputs([&paths.mdx, &paths.mdd])
    .action(run)
}

fn run(ctx: &BuildContext<'_>) -> Result<()> {
    let compiler = resolve_compiler(ctx)?;
    info!(compiler = %compiler.display(), "compiling dictionary");
    compile(ctx.runner(), &compiler, ctx.config, ctx.paths, ctx.locale)?;
    println!(
        "  {} and {} ready",
        ctx.paths.display(&ctx.paths.mdx),
        ctx.paths.display(&ctx.paths.mdd)
    );
    Ok(())
}

/// Find the compiler, offering to install it into the isolated environment.
fn resolve_compiler(ctx: &BuildContext<'_>) -> Result<PathBuf> {
    let tools = &ctx.config.tools;
    if let Some(found) = locate_compiler(ctx.locator(), tools, &ctx.paths.compiler_env) {
        return Ok(found);
    }
    let question = format!(
        "`{}` not found. Install {} into {}?",
        tools.compiler,
        tools.compiler_package,
        ctx.paths.display(&ctx.paths.compiler_env)
    );
    if !confirm(ctx.prompter(), &question)? {
        bail!(
            "the dictionary compiler `{}` is required: install {} and make sure `{}` is on PATH",
            tools.compiler,
            tools.compiler_package,
            tools.compiler
        );
    }
    install_compiler(ctx.runner(), ctx.config, ctx.paths)
}
