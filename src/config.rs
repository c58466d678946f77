use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Exporter configuration.
///
/// All fields can come from a TOML config file; the CLI flags override
/// whatever the file provides. Paths are stored as given and expanded with
/// [`expand_path`] before use.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Path to the tab-separated product export.
    pub path: Option<PathBuf>,
    /// Substring that `countries_en` must contain for a row to be kept.
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            country: default_country(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DbConfig {
    /// Path to the output SQLite database file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    /// Rows accumulated in memory before an automatic flush.
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Rows per multi-row INSERT within a flush. Each row binds 11
    /// parameters and SQLite caps a statement at 999, so this must stay
    /// at or below 90.
    #[serde(default = "default_chunk_rows")]
    pub chunk_rows: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            chunk_rows: default_chunk_rows(),
        }
    }
}

fn default_country() -> String {
    "Germany".to_string()
}
fn default_batch_size() -> usize {
    10_000
}
fn default_chunk_rows() -> usize {
    90
}

impl Config {
    /// The input path, or an error if neither config nor flags supplied one.
    pub fn require_source(&self) -> Result<&Path> {
        self.source
            .path
            .as_deref()
            .context("No input CSV path. Pass --csv or set [source] path in the config file.")
    }

    /// The output database path, or an error if none was supplied.
    pub fn require_db(&self) -> Result<&Path> {
        self.db
            .path
            .as_deref()
            .context("No SQLite path. Pass --sqlite or set [db] path in the config file.")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.batch.size == 0 {
        anyhow::bail!("batch.size must be > 0");
    }
    if config.batch.chunk_rows == 0 || config.batch.chunk_rows > 90 {
        anyhow::bail!("batch.chunk_rows must be in 1..=90 (11 bind parameters per row)");
    }
    if config.source.country.is_empty() {
        anyhow::bail!("source.country must not be empty");
    }
    Ok(())
}

/// Expand a leading `~` against `$HOME` and absolutize relative paths.
pub fn expand_path(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/") || s == "~" {
        if let Some(home) = home_dir() {
            return home.join(s.strip_prefix("~/").unwrap_or(""));
        }
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
