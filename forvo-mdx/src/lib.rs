//! Idempotent build pipeline turning a Forvo pronunciation dump into an
//! MDX/MDD dictionary package.
//!
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (locale codes, metadata records,
//!   country mapping, SVG composition, entry HTML). No I/O.
//! - **[`io`]**: Side-effecting operations (filesystem, SQLite, child
//!   processes, prompts). Behind traits where tests need fakes.
//!
//! [`pipeline`] runs the [`stages`] in order, skipping any whose artifacts
//! already exist; [`build`] wires configuration, locale and services together
//! for the CLI commands.

pub mod build;
pub mod cleanup;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod stages;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
