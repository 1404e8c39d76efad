//! I/O adapters for the build stages.

pub mod artifacts;
pub mod assets;
pub mod compiler;
pub mod config;
pub mod database;
pub mod dump;
pub mod fetch;
pub mod paths;
pub mod process;
pub mod prompt;
pub mod toolchain;
