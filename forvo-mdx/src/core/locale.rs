//! Locale code validation.

use std::fmt;

use anyhow::{Result, bail};

/// Minimum accepted locale code length, in characters.
pub const MIN_LEN: usize = 2;
/// Maximum accepted locale code length, in characters.
pub const MAX_LEN: usize = 3;

/// A user-supplied language code such as `en` or `yue`.
///
/// Validated by length (2–3 characters after trimming). The code names the
/// audio directory and the output package, so it is kept verbatim but may not
/// contain path separators or consist only of dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleCode(String);

impl LocaleCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            bail!(
                "invalid language code '{trimmed}': expected {MIN_LEN}-{MAX_LEN} characters, got {len}"
            );
        }
        if trimmed.contains(['/', '\\']) || trimmed.chars().all(|c| c == '.') {
            bail!("invalid language code '{trimmed}': must not name a path");
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
