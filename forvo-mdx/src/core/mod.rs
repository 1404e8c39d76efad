//! Deterministic, pure logic shared by the pipeline stages.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod country;
pub mod front_matter;
pub mod locale;
pub mod metadata;
pub mod origins;
pub mod pronunciation;
pub mod stage;
pub mod svg;
