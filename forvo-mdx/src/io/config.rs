//! Build configuration stored in `forvo.toml` at the working directory root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "forvo.toml";

/// Build configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below, so an absent file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Wall-clock limit for interpreter and compiler processes, in seconds.
    pub command_timeout_secs: u64,

    /// Wall-clock limit for a single download, in seconds.
    pub fetch_timeout_secs: u64,

    /// Keep at most this many bytes of child stdout/stderr in memory.
    pub output_limit_bytes: usize,

    pub tools: ToolsConfig,
    pub sources: SourcesConfig,
    pub assets: AssetsConfig,
    pub front_matter: FrontMatterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Interpreter used for the capability check and the compiler venv.
    pub python: String,
    /// HTTP fetch utility (curl-compatible flags).
    pub fetcher: String,
    /// Dictionary compiler executable.
    pub compiler: String,
    /// Package that provides `compiler` when installed into the venv.
    pub compiler_package: String,
    /// Virtual environment directory, relative to the working directory.
    pub compiler_env: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Metadata dump, relative to the working directory.
    pub metadata_file: PathBuf,
    /// Shown when the metadata file or audio directory is missing.
    pub metadata_hint: String,
    pub countries_url: String,
    /// Flag download URL; `{code}` is replaced by the lowercase ISO code.
    pub flag_url_template: String,
}

/// Optional overrides for the built-in assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssetsConfig {
    pub venus_icon: Option<PathBuf>,
    pub mars_icon: Option<PathBuf>,
    /// JSON object of `{ "<code>": "<language name>" }`.
    pub languages_file: Option<PathBuf>,
}

/// minijinja templates over `language` and `code`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrontMatterConfig {
    pub title_template: String,
    pub description_template: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            fetcher: "curl".to_string(),
            compiler: "mdict".to_string(),
            compiler_package: "mdict-utils".to_string(),
            compiler_env: PathBuf::from(".venv-mdict"),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            metadata_file: PathBuf::from("metadata.jsonl"),
            metadata_hint: "download the Forvo dump (metadata.jsonl and the per-language audio \
                            folders) into the working directory"
                .to_string(),
            countries_url: "https://raw.githubusercontent.com/mledoze/countries/master/countries.json"
                .to_string(),
            flag_url_template: "https://hatscripts.github.io/circle-flags/flags/{code}.svg"
                .to_string(),
        }
    }
}

impl Default for FrontMatterConfig {
    fn default() -> Self {
        Self {
            title_template: "Forvo {{ language }}".to_string(),
            description_template: "All Forvo {{ language }} audios uploaded until 2021."
                .to_string(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 60 * 60,
            fetch_timeout_secs: 120,
            output_limit_bytes: 100_000,
            tools: ToolsConfig::default(),
            sources: SourcesConfig::default(),
            assets: AssetsConfig::default(),
            front_matter: FrontMatterConfig::default(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(anyhow!("fetch_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        for (key, value) in [
            ("tools.python", &self.tools.python),
            ("tools.fetcher", &self.tools.fetcher),
            ("tools.compiler", &self.tools.compiler),
            ("tools.compiler_package", &self.tools.compiler_package),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{key} must be non-empty"));
            }
        }
        if self.tools.compiler_env.as_os_str().is_empty() {
            return Err(anyhow!("tools.compiler_env must be non-empty"));
        }
        if self.sources.metadata_file.as_os_str().is_empty() {
            return Err(anyhow!("sources.metadata_file must be non-empty"));
        }
        if !self.sources.flag_url_template.contains("{code}") {
            return Err(anyhow!(
                "sources.flag_url_template must contain a {{code}} placeholder"
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Flag URL for an ISO code.
    pub fn flag_url(&self, iso_code: &str) -> String {
        self.sources
            .flag_url_template
            .replace("{code}", &iso_code.to_lowercase())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BuildConfig::default()`.
pub fn load_config(path: &Path) -> Result<BuildConfig> {
    if !path.exists() {
        let cfg = BuildConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BuildConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
