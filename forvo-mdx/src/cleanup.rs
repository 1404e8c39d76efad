//! Optional removal of intermediate artifacts after a build.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::io::artifacts::remove_artifact;
use crate::io::prompt::confirm;
use crate::pipeline::BuildContext;

/// What the cleanup step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No intermediate artifact exists.
    NothingToRemove,
    /// Dry run: these would have been offered for removal.
    Planned(Vec<PathBuf>),
    Declined,
    Removed(Vec<PathBuf>),
}

/// Offer to remove the intermediates that exist; only `y`/`yes` removes them.
///
/// Inputs, the compiled package and the compiler environment are never touched.
pub fn offer_cleanup(ctx: &BuildContext<'_>) -> Result<CleanupOutcome> {
    let paths = ctx.paths;
    let present: Vec<PathBuf> = paths
        .intermediates()
        .into_iter()
        .filter(|path| path.exists())
        .map(PathBuf::from)
        .collect();
    if present.is_empty() {
        println!("cleanup: no intermediate files to remove");
        return Ok(CleanupOutcome::NothingToRemove);
    }

    let listing: Vec<String> = present
        .iter()
        .map(|path| paths.display(path).to_string())
        .collect();
    if ctx.dry_run {
        println!("dry-run: cleanup: would offer to remove {}", listing.join(", "));
        return Ok(CleanupOutcome::Planned(present));
    }

    println!("Intermediate files: {}", listing.join(", "));
    if !confirm(ctx.prompter(), "Remove intermediate files?")? {
        println!("cleanup: kept intermediate files");
        return Ok(CleanupOutcome::Declined);
    }

    let mut removed = Vec::with_capacity(present.len());
    for path in present {
        if remove_artifact(&path)? {
            info!(path = %path.display(), "removed");
            removed.push(path);
        }
    }
    println!("cleanup: removed {} intermediate artifacts", removed.len());
    Ok(CleanupOutcome::Removed(removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use std::fs;

    fn populate(harness: &Harness) {
        let paths = &harness.paths;
        fs::write(&paths.metadata, "").expect("metadata");
        fs::create_dir_all(&paths.audio_dir).expect("audio");
        fs::write(&paths.origin_stats, "{}").expect("stats");
        fs::create_dir_all(&paths.icons_dir).expect("icons");
        fs::write(paths.icons_dir.join("male_ES.svg"), "<svg/>").expect("icon");
        fs::write(&paths.title, "t").expect("title");
        fs::write(&paths.mdx, "x").expect("mdx");
        fs::write(&paths.mdd, "x").expect("mdd");
    }

    #[test]
    fn confirmed_cleanup_removes_only_intermediates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(temp.path(), "es", &["yes"]).expect("harness");
        populate(&harness);
        let paths = &harness.paths;

        let outcome = offer_cleanup(&harness.context(false)).expect("cleanup");

        assert_eq!(
            outcome,
            CleanupOutcome::Removed(vec![
                paths.origin_stats.clone(),
                paths.icons_dir.clone(),
                paths.title.clone(),
            ])
        );
        for kept in [&paths.metadata, &paths.audio_dir, &paths.mdx, &paths.mdd] {
            assert!(kept.exists(), "{} must survive", kept.display());
        }
    }

    #[test]
    fn declining_keeps_everything() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(temp.path(), "es", &["no"]).expect("harness");
        populate(&harness);

        let outcome = offer_cleanup(&harness.context(false)).expect("cleanup");

        assert_eq!(outcome, CleanupOutcome::Declined);
        assert!(harness.paths.origin_stats.exists());
    }

    #[test]
    fn dry_run_lists_without_asking() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(temp.path(), "es", &[]).expect("harness");
        populate(&harness);

        let outcome = offer_cleanup(&harness.context(true)).expect("cleanup");

        assert!(matches!(outcome, CleanupOutcome::Planned(ref paths) if paths.len() == 3));
        assert!(harness.prompter.asked().is_empty());
        assert!(harness.paths.icons_dir.exists());
    }

    #[test]
    fn nothing_to_remove_skips_the_question() {
        let temp = tempfile::tempdir().expect("tempdir");
        let harness = Harness::new(temp.path(), "es", &[]).expect("harness");

        let outcome = offer_cleanup(&harness.context(false)).expect("cleanup");
        assert_eq!(outcome, CleanupOutcome::NothingToRemove);
    }
}
