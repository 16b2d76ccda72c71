//! Configuration management for Weave.
//!
//! Parses `weave.toml` with serde and discovers it in the current directory
//! or its parents. CLI settings passed to [`Config::load`] take precedence
//! over file values.
//!
//! ```toml
//! [source]
//! root_dir = "${WEAVE_CONTENT:-content}"
//!
//! [include]
//! max_depth = 10
//! diagnostics = false
//! directive = "include"
//! fallback = "fallback"
//! escape = "literal"
//! marker = "include-error"
//!
//! [cache]
//! enabled = true
//! ```
//!
//! `source.root_dir` supports `${VAR}` and `${VAR:-default}` expansion.

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "weave.toml";

/// Upper bound accepted for `include.max_depth`.
const MAX_DEPTH_LIMIT: usize = 64;

/// CLI settings that override configuration file values.
///
/// Only `Some` fields override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the content root directory.
    pub source_dir: Option<PathBuf>,
    /// Override the cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override diagnostics mode.
    pub diagnostics: Option<bool>,
    /// Override the nesting limit.
    pub max_depth: Option<usize>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    source: SourceConfigRaw,
    cache: CacheConfigRaw,
    /// Inclusion settings.
    pub include: IncludeConfig,

    /// Resolved project paths (set after loading).
    #[serde(skip)]
    pub project: ProjectConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    root_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
}

/// `[include]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IncludeConfig {
    /// Maximum nesting of inclusions.
    pub max_depth: usize,
    /// Leave visible markers for failed top-level directives.
    pub diagnostics: bool,
    /// Directive element name.
    pub directive: String,
    /// Fallback element name.
    pub fallback: String,
    /// Escape element name.
    pub escape: String,
    /// Marker element name.
    pub marker: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            diagnostics: false,
            directive: "include".to_owned(),
            fallback: "fallback".to_owned(),
            escape: "literal".to_owned(),
            marker: "include-error".to_owned(),
        }
    }
}

/// Resolved project paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Directory content locators are resolved against.
    pub root_dir: PathBuf,
    /// Project data directory (`.weave/`).
    pub project_dir: PathBuf,
    /// Whether cross-run caching is enabled.
    pub cache_enabled: bool,
}

impl ProjectConfig {
    /// Cache directory path (`.weave/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Explicit config file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. `source.root_dir`).
        field: String,
        /// Error message (e.g. `${WEAVE_CONTENT} not set`).
        message: String,
    },
}

fn require_tag_name(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain whitespace"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// Uses `config_path` when given, otherwise searches for `weave.toml` in
    /// the current directory and its parents, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the explicit `config_path` doesn't exist, the file
    /// cannot be parsed, or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.project.root_dir.clone_from(source_dir);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.project.cache_enabled = cache_enabled;
        }
        if let Some(diagnostics) = settings.diagnostics {
            self.include.diagnostics = diagnostics;
        }
        if let Some(max_depth) = settings.max_depth {
            self.include.max_depth = max_depth;
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            source: SourceConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            include: IncludeConfig::default(),
            project: ProjectConfig {
                root_dir: base.join("content"),
                project_dir: base.join(".weave"),
                cache_enabled: true,
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `include.max_depth` is outside
    /// `1..=64`, a tag name is empty or contains whitespace, or two tag
    /// names coincide.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let include = &self.include;

        if !(1..=MAX_DEPTH_LIMIT).contains(&include.max_depth) {
            return Err(ConfigError::Validation(format!(
                "include.max_depth must be between 1 and {MAX_DEPTH_LIMIT}"
            )));
        }

        let tags = [
            ("include.directive", include.directive.as_str()),
            ("include.fallback", include.fallback.as_str()),
            ("include.escape", include.escape.as_str()),
            ("include.marker", include.marker.as_str()),
        ];
        for (field, value) in tags {
            require_tag_name(value, field)?;
        }
        for (i, (field, value)) in tags.iter().enumerate() {
            if let Some((other, _)) = tags[..i].iter().find(|(_, v)| v == value) {
                return Err(ConfigError::Validation(format!(
                    "{field} must differ from {other}"
                )));
            }
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref root_dir) = self.source.root_dir {
            self.source.root_dir = Some(expand::expand_env(root_dir, "source.root_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.project = ProjectConfig {
            root_dir: config_dir.join(self.source.root_dir.as_deref().unwrap_or("content")),
            project_dir: config_dir.join(".weave"),
            cache_enabled: self.cache.enabled.unwrap_or(true),
        };
    }
}
