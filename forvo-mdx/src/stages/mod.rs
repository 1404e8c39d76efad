//! Stage descriptors for the dictionary build, one module per step.
//!
//! Each module exposes a `stage` constructor returning a [`crate::pipeline::Stage`]
//! whose outputs are the artifacts that mark the step complete.

pub mod checks;
pub mod compile;
pub mod countries;
pub mod database;
pub mod flags;
pub mod front_matter;
pub mod icons;
pub mod origins;

use crate::io::config::BuildConfig;
use crate::io::paths::ArtifactPaths;
use crate::pipeline::Stage;

/// The full build, in execution order.
pub fn build_stages(config: &BuildConfig, paths: &ArtifactPaths) -> Vec<Stage> {
    vec![
        checks::metadata_stage(paths),
        origins::stage(paths),
        countries::stage(paths),
        flags::stage(paths),
        icons::stage(paths),
        checks::interpreter_stage(config),
        checks::audio_stage(paths),
        database::stage(paths),
        front_matter::stage(paths),
        compile::stage(paths),
    ]
}
