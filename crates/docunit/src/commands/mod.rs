//! CLI command implementations.

pub(crate) mod border_numbers;
pub(crate) mod convert;
pub(crate) mod inspect;

use std::path::{Path, PathBuf};

use clap::Args;
use docunit_config::{CliSettings, Config};
use docunit_converter::{ConverterService, DirectorySource};
use docunit_elements::ParserOptions;
use docunit_store::{DocumentKey, SqliteStore};
use uuid::Uuid;

use crate::error::CliError;

pub(crate) use border_numbers::BorderNumbersCommand;
pub(crate) use convert::{ConvertArgs, ReconvertArgs};
pub(crate) use inspect::InspectArgs;

pub(crate) type Service = ConverterService<SqliteStore, DirectorySource>;

/// Configuration arguments shared by every command.
#[derive(Args)]
pub(crate) struct ProjectArgs {
    /// Path to configuration file (default: auto-discover docunit.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source document directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Element database URL (overrides config).
    #[arg(long, env = "DOCUNIT_DATABASE_URL")]
    database_url: Option<String>,

    /// Paragraph style that marks border numbers (overrides config).
    #[arg(long)]
    border_number_style: Option<String>,
}

impl ProjectArgs {
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            database_url: self.database_url.clone(),
            source_dir: self.source_dir.clone(),
            border_number_style: self.border_number_style.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// A stored document: source file plus documentation unit.
#[derive(Args)]
pub(crate) struct DocumentArgs {
    /// Source file, relative to the source directory.
    file: String,

    /// Documentation unit the converted document belongs to.
    #[arg(short, long)]
    unit: Uuid,
}

impl DocumentArgs {
    pub(crate) fn key(&self) -> DocumentKey {
        DocumentKey::new(self.unit, self.file.as_str())
    }
}

/// Parser options from the loaded configuration.
pub(crate) fn parser_options(config: &Config) -> ParserOptions {
    ParserOptions {
        border_number_style: config.converter.border_number_style.clone(),
    }
}

/// Connect the store and build the service described by `config`.
pub(crate) async fn open_service(config: &Config) -> Result<Service, CliError> {
    let store_config = &config.store_resolved;
    if let Some(dir) = database_dir(&store_config.database_url) {
        ensure_data_dir(&dir, &store_config.project_dir)?;
    }

    tracing::info!(
        database_url = %store_config.database_url,
        source_dir = %config.source_resolved.dir.display(),
        "Opening converter"
    );
    let store =
        SqliteStore::connect(&store_config.database_url, store_config.max_connections).await?;
    let source = DirectorySource::new(&config.source_resolved.dir);
    Ok(ConverterService::new(store, source).with_options(parser_options(config)))
}

/// Directory that must exist before a file-backed SQLite URL can be opened.
fn database_dir(database_url: &str) -> Option<PathBuf> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Create the database directory, with a `.gitignore` when it is the project directory.
fn ensure_data_dir(dir: &Path, project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)?;

    if dir == project_dir {
        let gitignore_path = dir.join(".gitignore");
        if !gitignore_path.exists() {
            let _ = std::fs::write(&gitignore_path, "# Automatically created by docunit\n*\n");
        }
    }

    Ok(())
}
