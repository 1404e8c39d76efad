//! Downloads through the external fetch utility.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::io::config::BuildConfig;
use crate::io::process::{CommandRunner, CommandSpec, run_checked};

/// Download `url` to `dest`.
///
/// The body lands in `<dest>.part` first and is renamed into place only after
/// the fetch succeeded, so an interrupted download never looks complete.
pub fn fetch_to(
    runner: &dyn CommandRunner,
    config: &BuildConfig,
    workdir: &Path,
    url: &str,
    dest: &Path,
) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let partial = partial_path(dest);
    let spec = CommandSpec::new(&config.tools.fetcher, workdir, config.fetch_timeout())
        .arg("-fsSL")
        .arg("-o")
        .arg(&partial)
        .arg(url);

    if let Err(err) = run_checked(runner, &spec) {
        discard_partial(&partial);
        return Err(err).with_context(|| format!("download {url}"));
    }
    fs::rename(&partial, dest)
        .with_context(|| format!("move {} into place", partial.display()))?;
    info!(url, dest = %dest.display(), "downloaded");
    Ok(())
}

fn discard_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => debug!(path = %partial.display(), "removed partial download"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            path = %partial.display(),
            error = %err,
            "could not remove partial download"
        ),
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCommandRunner;

    #[test]
    fn downloads_through_partial_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = FakeCommandRunner::new();
        let dest = temp.path().join("flags").join("ES.svg");

        fetch_to(
            &runner,
            &BuildConfig::default(),
            temp.path(),
            "https://hatscripts.github.io/circle-flags/flags/es.svg",
            &dest,
        )
        .expect("fetch");

        assert!(dest.is_file());
        assert!(!temp.path().join("flags").join("ES.svg.part").exists());
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program_name(), "curl");
        assert_eq!(
            calls[0].arg_after("-o"),
            Some(temp.path().join("flags").join("ES.svg.part").as_os_str())
        );
    }

    #[test]
    fn failed_download_leaves_nothing_behind() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = FakeCommandRunner::new().fail_urls_containing("/zz.svg");
        let dest = temp.path().join("ZZ.svg");

        let err = fetch_to(
            &runner,
            &BuildConfig::default(),
            temp.path(),
            "https://hatscripts.github.io/circle-flags/flags/zz.svg",
            &dest,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("download https://"), "{err:#}");
        assert!(!dest.exists());
        assert!(!temp.path().join("ZZ.svg.part").exists());
    }

    #[test]
    fn stuck_partial_does_not_mask_the_download_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = FakeCommandRunner::new().fail_urls_containing("/zz.svg");
        let dest = temp.path().join("ZZ.svg");
        fs::create_dir(temp.path().join("ZZ.svg.part")).expect("mkdir");

        let err = fetch_to(
            &runner,
            &BuildConfig::default(),
            temp.path(),
            "https://hatscripts.github.io/circle-flags/flags/zz.svg",
            &dest,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("status 22"), "{err:#}");
        assert!(!dest.exists());
    }
}
