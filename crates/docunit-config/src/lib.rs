//! Configuration management for docunit.
//!
//! Parses `docunit.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `store.database_url`
//! - `source.dir`
//! - `converter.border_number_style`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override database connection URL.
    pub database_url: Option<String>,
    /// Override source document directory.
    pub source_dir: Option<PathBuf>,
    /// Override the paragraph style that marks border numbers.
    pub border_number_style: Option<String>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "docunit.toml";

/// Name of the project data directory created next to the config file.
const PROJECT_DIR: &str = ".docunit";

/// Default paragraph style name of border-number markers.
const DEFAULT_BORDER_NUMBER_STYLE: &str = "RandNummer";

const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store configuration (as parsed from TOML).
    store: StoreConfigRaw,
    /// Source configuration (paths are relative strings from TOML).
    source: SourceConfigRaw,
    /// Converter configuration.
    pub converter: ConverterConfig,

    /// Resolved store configuration (set after loading).
    #[serde(skip)]
    pub store_resolved: StoreConfig,
    /// Resolved source configuration (set after loading).
    #[serde(skip)]
    pub source_resolved: SourceConfig,
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
struct StoreConfigRaw {
    database_url: Option<String>,
    max_connections: Option<u32>,
}

/// Resolved store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// sqlx connection URL of the element database.
    pub database_url: String,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
    /// Project directory for docunit data (`.docunit/`).
    pub project_dir: PathBuf,
}

impl StoreConfig {
    fn with_project_dir(project_dir: PathBuf) -> Self {
        Self {
            database_url: default_database_url(&project_dir),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            project_dir,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_project_dir(PathBuf::from(PROJECT_DIR))
    }
}

fn default_database_url(project_dir: &Path) -> String {
    format!("sqlite://{}", project_dir.join("elements.db").display())
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    dir: Option<String>,
}

/// Resolved source configuration with absolute paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    /// Directory holding the `.docx` source files.
    pub dir: PathBuf,
}

/// Converter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Paragraph style whose paragraphs become border numbers.
    pub border_number_style: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            border_number_style: DEFAULT_BORDER_NUMBER_STYLE.to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
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
        /// Config field path (e.g., "`store.database_url`").
        field: String,
        /// Error message (e.g., "${`DATABASE_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docunit.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, so CLI
    /// arguments take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
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
        if let Some(database_url) = &settings.database_url {
            self.store_resolved.database_url.clone_from(database_url);
        }
        if let Some(source_dir) = &settings.source_dir {
            self.source_resolved.dir.clone_from(source_dir);
        }
        if let Some(style) = &settings.border_number_style {
            self.converter.border_number_style.clone_from(style);
        }
    }

    /// Search for config file in current directory and parents.
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

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            store: StoreConfigRaw::default(),
            source: SourceConfigRaw::default(),
            converter: ConverterConfig::default(),
            store_resolved: StoreConfig::with_project_dir(base.join(PROJECT_DIR)),
            source_resolved: SourceConfig {
                dir: base.join("documents"),
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
    /// Called automatically after loading from file and after applying
    /// CLI settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let store = &self.store_resolved;
        require_non_empty(&store.database_url, "store.database_url")?;
        if !store.database_url.starts_with("sqlite:") {
            return Err(ConfigError::Validation(
                "store.database_url must start with sqlite:".to_owned(),
            ));
        }
        if store.max_connections == 0 {
            return Err(ConfigError::Validation(
                "store.max_connections must be greater than 0".to_owned(),
            ));
        }
        require_non_empty(
            &self.converter.border_number_style,
            "converter.border_number_style",
        )?;
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.store.database_url {
            self.store.database_url = Some(expand::expand_env(url, "store.database_url")?);
        }
        if let Some(ref dir) = self.source.dir {
            self.source.dir = Some(expand::expand_env(dir, "source.dir")?);
        }
        self.converter.border_number_style = expand::expand_env(
            &self.converter.border_number_style,
            "converter.border_number_style",
        )?;
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let project_dir = config_dir.join(PROJECT_DIR);
        self.store_resolved = StoreConfig {
            database_url: self
                .store
                .database_url
                .clone()
                .unwrap_or_else(|| default_database_url(&project_dir)),
            max_connections: self
                .store
                .max_connections
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            project_dir,
        };
        self.source_resolved = SourceConfig {
            dir: config_dir.join(self.source.dir.as_deref().unwrap_or("documents")),
        };
    }
}
