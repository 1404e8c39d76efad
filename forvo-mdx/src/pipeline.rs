//! Linear stage runner with existence-based idempotency.
//!
//! A [`Stage`] declares the artifacts it produces, an optional read-only
//! precondition and an optional action. [`run_pipeline`] walks the stages in
//! order:
//!
//! 1. every declared output exists: skip;
//! 2. the precondition fails: abort the run;
//! 3. dry run: print the description instead of acting;
//! 4. otherwise run the action; an error aborts the run.
//!
//! Preconditions run in dry-run mode too, so they must not mutate anything
//! or spawn processes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::locale::LocaleCode;
use crate::core::stage::{StageOutcome, outputs_complete};
use crate::io::config::BuildConfig;
use crate::io::paths::ArtifactPaths;
use crate::io::process::CommandRunner;
use crate::io::prompt::Prompter;
use crate::io::toolchain::ToolLocator;

/// Handles to the outside world, replaced by fakes in tests.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub locator: &'a dyn ToolLocator,
}

/// Everything a stage may read while it runs.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub config: &'a BuildConfig,
    pub paths: &'a ArtifactPaths,
    pub locale: &'a LocaleCode,
    pub dry_run: bool,
    pub services: Services<'a>,
}

impl<'a> BuildContext<'a> {
    pub fn runner(&self) -> &'a dyn CommandRunner {
        self.services.runner
    }

    pub fn prompter(&self) -> &'a dyn Prompter {
        self.services.prompter
    }

    pub fn locator(&self) -> &'a dyn ToolLocator {
        self.services.locator
    }
}

/// Precondition or action of a stage.
pub type StageFn = Box<dyn Fn(&BuildContext<'_>) -> Result<()>>;

/// One pipeline step.
pub struct Stage {
    pub name: &'static str,
    pub description: String,
    pub outputs: Vec<PathBuf>,
    pub precondition: Option<StageFn>,
    pub action: Option<StageFn>,
}

impl Stage {
    pub fn new(name: &'static str, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            outputs: Vec::new(),
            precondition: None,
            action: None,
        }
    }

    pub fn outputs<I, P>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.outputs = outputs
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    pub fn precondition<F>(mut self, check: F) -> Self
    where
        F: Fn(&BuildContext<'_>) -> Result<()> + 'static,
    {
        self.precondition = Some(Box::new(check));
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&BuildContext<'_>) -> Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: &'static str,
    pub outcome: StageOutcome,
}

/// Outcome of every stage reached, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn outcome(&self, name: &str) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|stage| stage.name == name)
            .map(|stage| stage.outcome)
    }

    /// Names of the stages whose action executed.
    pub fn ran(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .filter(|stage| stage.outcome == StageOutcome::Ran)
            .map(|stage| stage.name)
            .collect()
    }
}

/// Run `stages` in order; the first failing precondition or action aborts.
pub fn run_pipeline(ctx: &BuildContext<'_>, stages: &[Stage]) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();
    for stage in stages {
        let outcome = run_stage(ctx, stage)?;
        info!(stage = stage.name, outcome = outcome.label(), "stage finished");
        report.stages.push(StageReport {
            name: stage.name,
            outcome,
        });
    }
    Ok(report)
}

fn run_stage(ctx: &BuildContext<'_>, stage: &Stage) -> Result<StageOutcome> {
    if outputs_complete(&stage.outputs, Path::exists) {
        let outputs: Vec<String> = stage
            .outputs
            .iter()
            .map(|p| ctx.paths.display(p).to_string())
            .collect();
        println!("skip: {}: {} already present", stage.name, outputs.join(", "));
        return Ok(StageOutcome::Skipped);
    }

    if let Some(check) = &stage.precondition {
        debug!(stage = stage.name, "checking precondition");
        check(ctx).with_context(|| format!("{}: precondition failed", stage.name))?;
    }

    let Some(action) = &stage.action else {
        println!("ok: {}: {}", stage.name, stage.description);
        return Ok(StageOutcome::Checked);
    };

    if ctx.dry_run {
        println!("dry-run: {}: {}", stage.name, stage.description);
        return Ok(StageOutcome::Planned);
    }

    println!("run: {}: {}", stage.name, stage.description);
    action(ctx).with_context(|| format!("{} failed", stage.name))?;
    println!("done: {}", stage.name);
    Ok(StageOutcome::Ran)
}
