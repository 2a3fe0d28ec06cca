//! Configuration loading for default rules and folder-scan filters.
//!
//! Configuration is stored in TOML format:
//!
//! ```toml
//! [rules]
//! template = "img_{n}"
//! start_number = 1
//! step_number = 1
//! case_conversion = "lower"
//!
//! [selection]
//! include_hidden = false   # defaults to true
//! extensions = ["jpg", "png"]
//! exclude_patterns = ["*.tmp"]
//! ```
//!
//! Every key is optional. Rules given on the command line override the
//! `[rules]` table field by field.

use crate::rules::RuleSet;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".batchrenrc.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern in `[selection].exclude_patterns`.
    InvalidGlobPattern(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default rule values.
    pub rules: RuleSet,
    /// Which files a folder scan picks up.
    pub selection: SelectionConfig,
}

/// Filters applied when a whole folder is added to the selection.
///
/// The default picks up every regular file, dotfiles included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Whether files starting with "." are picked up.
    pub include_hidden: bool,
    /// Only pick up these extensions (case-insensitive). Empty means all.
    pub extensions: Vec<String>,
    /// Glob patterns matched against the file name; matches are skipped.
    pub exclude_patterns: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            include_hidden: true,
            extensions: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.batchrenrc.toml` in the current directory
    /// 3. `~/.config/batchren/config.toml`
    /// 4. built-in defaults
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
                .join("batchren")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
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
}

impl SelectionConfig {
    /// Compile the filters for matching.
    pub fn compile(&self) -> Result<SelectionFilter, ConfigError> {
        let exclude_patterns = self
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SelectionFilter {
            include_hidden: self.include_hidden,
            extensions: self
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
        })
    }
}

/// Compiled folder-scan filter.
#[derive(Debug, Clone, Default)]
pub struct SelectionFilter {
    include_hidden: bool,
    extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
}

impl SelectionFilter {
    /// A filter that accepts every file, hidden ones included.
    pub fn accept_all() -> Self {
        Self {
            include_hidden: true,
            ..Default::default()
        }
    }

    /// Check whether a scanned file belongs in the selection.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if !self.extensions.is_empty() {
            let ext = file_path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !self.extensions.contains(&ext) {
                return false;
            }
        }

        !self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
    }
}
