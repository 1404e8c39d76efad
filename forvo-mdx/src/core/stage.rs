//! Stage bookkeeping shared by the pipeline runner and its reports.

use std::path::{Path, PathBuf};

/// How a stage ended within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Every declared artifact already existed; nothing was evaluated.
    Skipped,
    /// A check-only stage whose precondition held.
    Checked,
    /// The action ran to completion.
    Ran,
    /// Dry run: the action was described instead of executed.
    Planned,
}

impl StageOutcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Skipped => "skip",
            Self::Checked => "ok",
            Self::Ran => "done",
            Self::Planned => "dry-run",
        }
    }
}

/// A stage is complete iff it declares outputs and every one of them exists.
///
/// Stages without outputs (checks, prompts) are never complete.
pub fn outputs_complete<F>(outputs: &[PathBuf], exists: F) -> bool
where
    F: Fn(&Path) -> bool,
{
    !outputs.is_empty() && outputs.iter().all(|path| exists(path))
}
