//! Canonical artifact paths for one locale build.

use std::path::{Path, PathBuf};

use crate::core::locale::LocaleCode;
use crate::io::config::BuildConfig;

/// All artifact paths under the working directory for a locale.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub root: PathBuf,
    pub metadata: PathBuf,
    pub audio_dir: PathBuf,
    pub origin_stats: PathBuf,
    pub countries: PathBuf,
    pub country_mappings: PathBuf,
    pub flags_dir: PathBuf,
    pub icons_dir: PathBuf,
    pub database: PathBuf,
    pub simple_database: PathBuf,
    pub title: PathBuf,
    pub description: PathBuf,
    pub mdx: PathBuf,
    pub mdd: PathBuf,
    pub compiler_env: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>, locale: &LocaleCode, config: &BuildConfig) -> Self {
        let root = root.into();
        let code = locale.as_str();
        let metadata = root.join(&config.sources.metadata_file);
        let stem = metadata
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "metadata".to_string());
        Self {
            metadata,
            audio_dir: root.join(code),
            origin_stats: root.join(format!("{stem}_{code}_origin_stats.json")),
            countries: root.join("countries.json"),
            country_mappings: root.join("country_mappings.json"),
            flags_dir: root.join("flags"),
            icons_dir: root.join("icons"),
            database: root.join("forvo_database.db"),
            simple_database: root.join("forvo_simple.db"),
            title: root.join("title.html"),
            description: root.join("description.html"),
            mdx: root.join(format!("{code}.mdx")),
            mdd: root.join(format!("{code}.mdd")),
            compiler_env: root.join(&config.tools.compiler_env),
            root,
        }
    }

    /// Intermediate artifacts removed by cleanup, in pipeline order.
    ///
    /// Inputs (metadata, audio), the package itself and the compiler
    /// environment are never listed.
    pub fn intermediates(&self) -> Vec<&Path> {
        [
            &self.origin_stats,
            &self.countries,
            &self.country_mappings,
            &self.flags_dir,
            &self.icons_dir,
            &self.database,
            &self.simple_database,
            &self.title,
            &self.description,
        ]
        .into_iter()
        .map(PathBuf::as_path)
        .collect()
    }

    /// `path` relative to the working directory (unchanged if outside it).
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// `path` relative to the working directory, for messages.
    pub fn display<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        self.relative(path).display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_parameterized_by_locale() {
        let locale = LocaleCode::parse("es").expect("locale");
        let paths = ArtifactPaths::new("/work", &locale, &BuildConfig::default());
        assert_eq!(paths.metadata, Path::new("/work/metadata.jsonl"));
        assert_eq!(paths.audio_dir, Path::new("/work/es"));
        assert_eq!(
            paths.origin_stats,
            Path::new("/work/metadata_es_origin_stats.json")
        );
        assert_eq!(paths.mdx, Path::new("/work/es.mdx"));
        assert_eq!(paths.mdd, Path::new("/work/es.mdd"));
        assert_eq!(paths.compiler_env, Path::new("/work/.venv-mdict"));
    }

    #[test]
    fn intermediates_exclude_inputs_and_package() {
        let locale = LocaleCode::parse("en").expect("locale");
        let paths = ArtifactPaths::new("/work", &locale, &BuildConfig::default());
        let intermediates = paths.intermediates();
        assert_eq!(intermediates.len(), 9);
        for kept in [
            &paths.metadata,
            &paths.audio_dir,
            &paths.mdx,
            &paths.mdd,
            &paths.compiler_env,
        ] {
            assert!(!intermediates.contains(&kept.as_path()), "{}", kept.display());
        }
    }

    #[test]
    fn display_is_relative_to_root() {
        let locale = LocaleCode::parse("en").expect("locale");
        let paths = ArtifactPaths::new("/work", &locale, &BuildConfig::default());
        assert_eq!(paths.display(&paths.icons_dir).to_string(), "icons");
    }
}
