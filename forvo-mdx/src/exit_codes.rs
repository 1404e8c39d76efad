//! Stable exit codes for `forvo-mdx` commands.

/// Build finished (stages skipped or ran) or cleanup completed or was declined.
pub const OK: i32 = 0;
/// Missing tool or input, declined compiler install, failed stage or invalid config.
pub const FAILED: i32 = 1;
