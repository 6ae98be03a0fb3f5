//! Configuration for extra extensions and file filtering.
//!
//! Configuration is stored in TOML format:
//!
//! ```toml
//! [extensions]
//! images = ["HEIC"]
//! documents = ["MD"]
//!
//! [filters]
//! skip_hidden = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part", "cache/**"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Extra extensions are merged with the built-in sets; an extension claimed by
//! two categories is rejected. Filtered files are left untouched by a run.

use crate::file_category::Category;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".sortdir.toml";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// An extension was assigned to more than one category.
    #[error("Extension '{extension}' is already mapped to {existing}, cannot map it to {requested}")]
    OverlappingExtension {
        extension: String,
        existing: &'static str,
        requested: &'static str,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    /// Extra extensions per category.
    #[serde(default)]
    pub extensions: ExtensionRules,

    /// Which files a run should leave alone.
    #[serde(default)]
    pub filters: FilterRules,
}

/// Extra extensions, merged with the built-in sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionRules {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub audio: Vec<String>,
    #[serde(default)]
    pub archives: Vec<String>,
}

impl ExtensionRules {
    /// Pairs every extension list with the category it extends.
    pub fn by_category(&self) -> [(Category, &[String]); 5] {
        [
            (Category::Images, self.images.as_slice()),
            (Category::Video, self.video.as_slice()),
            (Category::Documents, self.documents.as_slice()),
            (Category::Audio, self.audio.as_slice()),
            (Category::Archives, self.archives.as_slice()),
        ]
    }
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Leave hidden files (starting with ".") in place. Defaults to false.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude, matched against the path relative to the root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp", "log").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.sortdir.toml` in the current directory
    /// 3. Look for `~/.config/sortdir/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a file should be sorted (not excluded).
    ///
    /// `relative_path` is the file's path relative to the scan root.
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and skipped, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, relative_path) {
            return true;
        }

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, relative_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn matches_any(&self, patterns: &[Pattern], path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(exclude: ExcludeRules) -> CompiledFilters {
        SortConfig {
            filters: FilterRules {
                skip_hidden: false,
                exclude,
                include: IncludeRules::default(),
            },
            ..Default::default()
        }
        .compile_filters()
        .expect("filters should compile")
    }

    #[test]
    fn test_default_config_includes_everything() {
        let compiled = SortConfig::default().compile_filters().unwrap();

        assert!(compiled.should_include(Path::new(".bashrc")));
        assert!(compiled.should_include(Path::new("photo.png")));
        assert!(compiled.should_include(Path::new("deep/nested/file")));
    }

    #[test]
    fn test_skip_hidden() {
        let config = SortConfig::from_toml("[filters]\nskip_hidden = true\n").unwrap();
        let compiled = config.compile_filters().unwrap();

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new("sub/.hidden.txt")));
        assert!(compiled.should_include(Path::new("visible.txt")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = filters(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(!compiled.should_include(Path::new("photos/Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = filters(ExcludeRules {
            extensions: vec!["bak".to_string(), ".TMP".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(!compiled.should_include(Path::new("file.tmp")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = filters(ExcludeRules {
            patterns: vec!["*.part".to_string(), "cache/**".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("movie.mkv.part")));
        assert!(!compiled.should_include(Path::new("cache/blob.bin")));
        assert!(compiled.should_include(Path::new("movie.mkv")));
        assert!(compiled.should_include(Path::new("my_cache/blob.bin")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = filters(ExcludeRules {
            regex: vec![r"^~\$.*".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("~$report.docx")));
        assert!(compiled.should_include(Path::new("report.docx")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let config = SortConfig::from_toml(
            r#"
[filters]
skip_hidden = true

[filters.include]
patterns = [".keep*"]
"#,
        )
        .unwrap();
        let compiled = config.compile_filters().unwrap();

        assert!(compiled.should_include(Path::new(".keep.txt")));
        assert!(!compiled.should_include(Path::new(".other")));
    }

    #[test]
    fn test_invalid_patterns_return_error() {
        let bad_regex = filters_result(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        });
        assert!(matches!(bad_regex, Err(ConfigError::InvalidRegexPattern { .. })));

        let bad_glob = filters_result(ExcludeRules {
            patterns: vec!["[invalid".to_string()],
            ..Default::default()
        });
        assert!(matches!(bad_glob, Err(ConfigError::InvalidGlobPattern(_))));
    }

    fn filters_result(exclude: ExcludeRules) -> Result<CompiledFilters, ConfigError> {
        SortConfig {
            filters: FilterRules {
                exclude,
                ..Default::default()
            },
            ..Default::default()
        }
        .compile_filters()
    }

    #[test]
    fn test_parse_extensions_section() {
        let config = SortConfig::from_toml(
            r#"
[extensions]
images = ["HEIC", "webp"]
documents = ["md"]
"#,
        )
        .unwrap();

        assert_eq!(config.extensions.images, vec!["HEIC", "webp"]);
        assert_eq!(config.extensions.documents, vec!["md"]);
        assert!(config.extensions.video.is_empty());
        assert!(!config.filters.skip_hidden);
    }

    #[test]
    fn test_invalid_toml() {
        let result = SortConfig::from_toml("[extensions\nimages = 3");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_file() {
        let result = SortConfig::load(Some(Path::new("/non/existent/sortdir.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[extensions]\naudio = [\"FLAC\"]\n").expect("Failed to write config");

        let config = SortConfig::load(Some(&path)).expect("config should load");
        assert_eq!(config.extensions.audio, vec!["FLAC"]);
    }
}
