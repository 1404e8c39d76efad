//! Locating external tools without spawning them.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::debug;

use crate::io::config::ToolsConfig;

/// Resolves executable names to paths.
pub trait ToolLocator {
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Looks tools up on `PATH`.
pub struct PathLocator;

impl ToolLocator for PathLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Fail with an install hint unless the interpreter and fetch utility are on `PATH`.
///
/// The compiler is resolved later by the compile stage, which can install it.
pub fn verify_toolchain(locator: &dyn ToolLocator, tools: &ToolsConfig) -> Result<()> {
    for (role, program) in [("interpreter", &tools.python), ("fetch utility", &tools.fetcher)] {
        match locator.locate(program) {
            Some(path) => debug!(role, path = %path.display(), "found tool"),
            None => bail!(
                "missing required {role} `{program}`: install it and make sure it is on PATH"
            ),
        }
    }
    Ok(())
}

/// `bin/` (or `Scripts\` on Windows) inside a virtual environment.
pub fn venv_bin_dir(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        env_dir.join("Scripts")
    } else {
        env_dir.join("bin")
    }
}

/// Path of `program` inside a virtual environment.
pub fn venv_executable(env_dir: &Path, program: &str) -> PathBuf {
    let name = if cfg!(windows) {
        format!("{program}.exe")
    } else {
        program.to_string()
    };
    venv_bin_dir(env_dir).join(name)
}

/// The compiler from `PATH`, or from the isolated environment if installed there.
pub fn locate_compiler(
    locator: &dyn ToolLocator,
    tools: &ToolsConfig,
    env_dir: &Path,
) -> Option<PathBuf> {
    locator.locate(&tools.compiler).or_else(|| {
        let candidate = venv_executable(env_dir, &tools.compiler);
        candidate.is_file().then_some(candidate)
    })
}
