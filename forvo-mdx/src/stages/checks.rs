//! Check-only stages guarding the inputs and the interpreter.

use anyhow::{Context, Result, bail};

use crate::io::config::BuildConfig;
use crate::io::paths::ArtifactPaths;
use crate::io::process::{CommandSpec, run_checked};
use crate::pipeline::{BuildContext, Stage};

pub const METADATA: &str = "metadata";
pub const INTERPRETER: &str = "interpreter";
pub const AUDIO: &str = "audio";

/// Module the compiler needs from the interpreter to read the entry store.
const REQUIRED_MODULE: &str = "sqlite3";

pub fn metadata_stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        METADATA,
        format!("metadata dump {} is present", paths.display(&paths.metadata)),
    )
    .precondition(|ctx| {
        let path = &ctx.paths.metadata;
        if !path.is_file() {
            bail!(
                "metadata file {} not found: {}",
                path.display(),
                ctx.config.sources.metadata_hint
            );
        }
        Ok(())
    })
}

/// Runs the interpreter, so it is an action and never spawned in dry run.
pub fn interpreter_stage(config: &BuildConfig) -> Stage {
    Stage::new(
        INTERPRETER,
        format!(
            "check that `{}` can import {REQUIRED_MODULE}",
            config.tools.python
        ),
    )
    .action(check_interpreter)
}

fn check_interpreter(ctx: &BuildContext<'_>) -> Result<()> {
    let spec = CommandSpec::new(
        &ctx.config.tools.python,
        &ctx.paths.root,
        ctx.config.command_timeout(),
    )
    .arg("-c")
    .arg(format!("import {REQUIRED_MODULE}"));
    run_checked(ctx.runner(), &spec).with_context(|| {
        format!(
            "`{}` cannot import {REQUIRED_MODULE}; install a Python build with SQLite support",
            ctx.config.tools.python
        )
    })?;
    Ok(())
}

pub fn audio_stage(paths: &ArtifactPaths) -> Stage {
    Stage::new(
        AUDIO,
        format!("audio directory {}/ is present", paths.display(&paths.audio_dir)),
    )
    .precondition(|ctx| {
        let dir = &ctx.paths.audio_dir;
        if !dir.is_dir() {
            bail!(
                "audio directory {} not found: {}",
                dir.display(),
                ctx.config.sources.metadata_hint
            );
        }
        Ok(())
    })
}
