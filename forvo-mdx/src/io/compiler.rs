//! Dictionary compiler invocations and its isolated install.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::info;

use crate::core::locale::LocaleCode;
use crate::io::config::BuildConfig;
use crate::io::paths::ArtifactPaths;
use crate::io::process::{CommandRunner, CommandSpec, run_checked};
use crate::io::toolchain::venv_executable;

/// Create the compiler environment and install the compiler package into it.
///
/// Returns the path of the installed compiler executable.
pub fn install_compiler(
    runner: &dyn CommandRunner,
    config: &BuildConfig,
    paths: &ArtifactPaths,
) -> Result<PathBuf> {
    let env_dir = &paths.compiler_env;
    let timeout = config.command_timeout();

    info!(env = %env_dir.display(), "creating compiler environment");
    let venv = CommandSpec::new(&config.tools.python, &paths.root, timeout)
        .arg("-m")
        .arg("venv")
        .arg(env_dir);
    run_checked(runner, &venv)?;

    info!(package = %config.tools.compiler_package, "installing compiler package");
    let pip = CommandSpec::new(venv_executable(env_dir, "python"), &paths.root, timeout)
        .arg("-m")
        .arg("pip")
        .arg("install")
        .arg(&config.tools.compiler_package);
    run_checked(runner, &pip)?;

    let compiler = venv_executable(env_dir, &config.tools.compiler);
    if !compiler.is_file() {
        bail!(
            "installing {} did not provide `{}` at {}",
            config.tools.compiler_package,
            config.tools.compiler,
            compiler.display()
        );
    }
    Ok(compiler)
}

/// The two compiler runs that produce the package: entries, then resources.
///
/// Paths are passed relative to the working directory, which the compiler
/// uses as the root of resource names inside the `.mdd`.
pub fn compile_commands(
    compiler: &Path,
    config: &BuildConfig,
    paths: &ArtifactPaths,
    locale: &LocaleCode,
) -> [CommandSpec; 2] {
    let timeout = config.command_timeout();
    let rel = |path: &Path| paths.relative(path).to_path_buf();

    let mdx = CommandSpec::new(compiler, &paths.root, timeout)
        .arg("--title")
        .arg(rel(&paths.title))
        .arg("--description")
        .arg(rel(&paths.description))
        .arg("-a")
        .arg(rel(&paths.simple_database))
        .arg(rel(&paths.mdx));
    let mdd = CommandSpec::new(compiler, &paths.root, timeout)
        .arg("-a")
        .arg(locale.as_str())
        .arg("-a")
        .arg(rel(&paths.icons_dir))
        .arg(rel(&paths.mdd));
    [mdx, mdd]
}

/// Run both compiler invocations in order.
pub fn compile(
    runner: &dyn CommandRunner,
    compiler: &Path,
    config: &BuildConfig,
    paths: &ArtifactPaths,
    locale: &LocaleCode,
) -> Result<()> {
    for spec in compile_commands(compiler, config, paths, locale) {
        run_checked(runner, &spec)?;
    }
    Ok(())
}
