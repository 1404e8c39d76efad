//! Orchestration for `forvo-mdx build` and `forvo-mdx clean`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::cleanup::{CleanupOutcome, offer_cleanup};
use crate::core::locale::LocaleCode;
use crate::io::config::{BuildConfig, CONFIG_FILE, load_config};
use crate::io::paths::ArtifactPaths;
use crate::io::prompt::{Prompter, prompt_locale};
use crate::io::toolchain::verify_toolchain;
use crate::pipeline::{BuildContext, PipelineReport, Services, run_pipeline};
use crate::stages::build_stages;

/// Command-line inputs shared by both commands.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Directory holding the dump; every artifact is written here.
    pub workdir: PathBuf,
    /// Config file; defaults to `<workdir>/forvo.toml`.
    pub config_path: Option<PathBuf>,
    /// Locale code; prompted for when absent.
    pub lang: Option<String>,
    pub dry_run: bool,
}

impl BuildOptions {
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| self.workdir.join(CONFIG_FILE))
    }
}

/// Result of a completed build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub locale: LocaleCode,
    pub report: PipelineReport,
    pub cleanup: CleanupOutcome,
}

/// Load the config named by `options` (defaults when the file is absent).
pub fn load_build_config(options: &BuildOptions) -> Result<BuildConfig> {
    load_config(&options.config_path())
}

/// Verify the toolchain, settle the locale, run every stage, then offer cleanup.
#[instrument(skip_all, fields(workdir = %options.workdir.display(), dry_run = options.dry_run))]
pub fn run_build(
    options: &BuildOptions,
    config: &BuildConfig,
    services: Services<'_>,
) -> Result<BuildSummary> {
    verify_toolchain(services.locator, &config.tools)?;
    let locale = resolve_locale(options.lang.as_deref(), services.prompter)?;
    info!(locale = %locale, "building dictionary");

    let paths = ArtifactPaths::new(&options.workdir, &locale, config);
    let ctx = context(config, &paths, &locale, options.dry_run, services);
    let stages = build_stages(config, &paths);
    let report = run_pipeline(&ctx, &stages)?;
    let cleanup = offer_cleanup(&ctx)?;

    Ok(BuildSummary {
        locale,
        report,
        cleanup,
    })
}

/// Cleanup on its own: no toolchain check and no stages.
#[instrument(skip_all, fields(workdir = %options.workdir.display(), dry_run = options.dry_run))]
pub fn run_clean(
    options: &BuildOptions,
    config: &BuildConfig,
    services: Services<'_>,
) -> Result<CleanupOutcome> {
    let locale = resolve_locale(options.lang.as_deref(), services.prompter)?;
    let paths = ArtifactPaths::new(&options.workdir, &locale, config);
    let ctx = context(config, &paths, &locale, options.dry_run, services);
    offer_cleanup(&ctx)
}

/// `--lang` wins; without it the user is asked until a valid code is given.
pub fn resolve_locale(lang: Option<&str>, prompter: &dyn Prompter) -> Result<LocaleCode> {
    match lang {
        Some(raw) => LocaleCode::parse(raw).context("--lang"),
        None => prompt_locale(prompter),
    }
}

fn context<'a>(
    config: &'a BuildConfig,
    paths: &'a ArtifactPaths,
    locale: &'a LocaleCode,
    dry_run: bool,
    services: Services<'a>,
) -> BuildContext<'a> {
    BuildContext {
        config,
        paths,
        locale,
        dry_run,
        services,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedPrompter;

    #[test]
    fn flag_locale_skips_the_prompt() {
        let prompter = ScriptedPrompter::new(&[]);
        let locale = resolve_locale(Some(" de "), &prompter).expect("locale");
        assert_eq!(locale.as_str(), "de");
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn invalid_flag_locale_is_an_error() {
        let prompter = ScriptedPrompter::new(&["en"]);
        let err = resolve_locale(Some("english"), &prompter).unwrap_err();
        assert!(format!("{err:#}").starts_with("--lang: invalid language code"));
    }

    #[test]
    fn config_defaults_to_workdir_file() {
        let options = BuildOptions {
            workdir: PathBuf::from("/data"),
            ..BuildOptions::default()
        };
        assert_eq!(options.config_path(), PathBuf::from("/data/forvo.toml"));
    }
}
