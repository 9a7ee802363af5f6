//! Run configuration and root-file exclusion rules.
//!
//! This module loads TOML configuration and turns it into the values a run needs:
//! - which text-file enumerator to use
//! - whether the loose-mention rewrite pass is enabled
//! - what to do when a text file can't be rewritten
//! - extra extension mappings and reserved file names for the classifier
//! - exclusion rules for root files (names, globs, extensions, regexes)
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! enumerator = "walk"
//! loose_mentions = true
//! on_rewrite_error = "skip"
//! skip_dirs = ["node_modules", ".git", ".vscode"]
//! reserved = ["robots.txt"]
//!
//! [organize.extensions]
//! psd = "img"
//!
//! [exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.tmp"]
//! extensions = ["bak"]
//! regex = []
//! ```

use crate::enumerator::EnumeratorKind;
use crate::file_category::{Category, Classifier};
use crate::rewriter::{ErrorPolicy, RewriteOptions};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-project configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".webtidyrc.toml";

/// Errors that can occur during configuration loading.
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
    InvalidRegexPattern { pattern: String, reason: String },
    /// An extension mapping names a folder that isn't a category.
    #[error("Unknown category '{category}' for extension '{extension}'")]
    UnknownCategory { extension: String, category: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebtidyConfig {
    #[serde(default)]
    pub organize: OrganizeSettings,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Settings for the move and rewrite phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeSettings {
    /// Which text-file enumerator feeds the rewrite phase.
    #[serde(default)]
    pub enumerator: EnumeratorKind,

    /// Whether the last-resort loose-mention pass runs. Defaults to true.
    #[serde(default = "default_loose_mentions")]
    pub loose_mentions: bool,

    /// What to do when a text file can't be read or written.
    #[serde(default)]
    pub on_rewrite_error: ErrorPolicy,

    /// Directory names never descended into when listing text files.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Extra file names that always stay at the root.
    #[serde(default)]
    pub reserved: Vec<String>,

    /// Extra extension → category folder mappings.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_loose_mentions() -> bool {
    true
}

/// Version control metadata, editor settings and the dependency cache.
pub fn default_skip_dirs() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        ".vscode".to_string(),
    ]
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            enumerator: EnumeratorKind::default(),
            loose_mentions: default_loose_mentions(),
            on_rewrite_error: ErrorPolicy::default(),
            skip_dirs: default_skip_dirs(),
            reserved: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }
}

/// Rules for keeping root files out of the move phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "log").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl WebtidyConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.webtidyrc.toml` in the project root
    /// 3. Look for `~/.config/webtidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read or parsed.
    pub fn load(config_path: Option<&Path>, project_root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = project_root.join(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("webtidy")
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

    /// Builds the classifier: standard tables plus configured extensions and reserved names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCategory`] for a mapping to an unknown folder.
    pub fn classifier(&self) -> Result<Classifier, ConfigError> {
        let mut classifier = Classifier::default();

        for (extension, folder) in &self.organize.extensions {
            let category = Category::from_dir_name(folder).ok_or_else(|| {
                ConfigError::UnknownCategory {
                    extension: extension.clone(),
                    category: folder.clone(),
                }
            })?;
            classifier.add_extension_mapping(extension, category);
        }
        for name in &self.organize.reserved {
            classifier.add_reserved_name(name);
        }

        Ok(classifier)
    }

    /// Options for the rewrite phase.
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            loose_mentions: self.organize.loose_mentions,
            on_error: self.organize.on_rewrite_error,
        }
    }

    /// Compile the exclusion rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.exclude)
    }
}

/// Exclusion rules compiled for matching.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Create compiled filters from exclusion rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
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
            exclude_filenames: rules.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a root file may be moved (is not excluded).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Exact filename match
    /// 2. File extension match (case-insensitive)
    /// 3. Glob pattern match against the file name
    /// 4. Regex pattern match against the file name
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
