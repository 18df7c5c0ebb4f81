//! Configuration loading and root folder resolution
//!
//! Bootstrap values resolve in priority order:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file (`~/.config/mediarank/config.toml`)
//! 4. OS-dependent compiled default
//!
//! Search provider API keys resolve Database → ENV → TOML. A missing TOML file
//! is never an error: defaults are used and startup continues.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::db::settings;
use crate::{Error, Result};

pub const ROOT_FOLDER_ENV: &str = "MEDIARANK_ROOT_FOLDER";
pub const GAMES_BASE_URL_ENV: &str = "MEDIARANK_GAMES_API_BASE_URL";

pub const DEFAULT_PORT: u16 = 5731;
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_BOOKS_BASE_URL: &str = "https://www.googleapis.com";
pub const DEFAULT_GAMES_BASE_URL: &str = "https://api.thegamesdb.net";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "mediarank.db";

/// Built-in defaults for the current platform
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/.local/share/mediarank, ~/Library/Application Support/mediarank, %LOCALAPPDATA%\mediarank
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("mediarank"))
            .unwrap_or_else(|| PathBuf::from("./mediarank_data"));

        Self {
            root_folder,
            log_level: default_log_level(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
        }
    }
}

/// Search provider credentials and endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_base_url: Option<String>,
}

/// Contents of `config.toml`; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Parse a config file, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Default location of the user's config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mediarank").join("config.toml"))
}

/// Resolves the root folder holding the database
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self {
            cli_arg,
            config_path: default_config_path(),
        }
    }

    /// Read the TOML tier from `path` instead of the default location
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = TomlConfig::load_or_default(self.config_path.as_deref()).root_folder {
            info!("Root folder from config file: {}", path.display());
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the folder (and parents); safe to call repeatedly
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
            info!("Created root folder: {}", self.root.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }
}

/// External search provider with a configurable API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Tmdb,
    Books,
    Games,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Tmdb => "TMDB",
            Provider::Books => "Google Books",
            Provider::Games => "TheGamesDB",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Tmdb => "MEDIARANK_TMDB_API_KEY",
            Provider::Books => "MEDIARANK_BOOKS_API_KEY",
            Provider::Games => "MEDIARANK_GAMES_API_KEY",
        }
    }

    fn settings_key(&self) -> &'static str {
        match self {
            Provider::Tmdb => settings::TMDB_API_KEY,
            Provider::Books => settings::BOOKS_API_KEY,
            Provider::Games => settings::GAMES_API_KEY,
        }
    }

    fn toml_key<'a>(&self, config: &'a SearchConfig) -> Option<&'a String> {
        match self {
            Provider::Tmdb => config.tmdb_api_key.as_ref(),
            Provider::Books => config.books_api_key.as_ref(),
            Provider::Games => config.games_api_key.as_ref(),
        }
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve a provider API key: Database → ENV → TOML
///
/// `None` when no tier has a usable key; the provider is then disabled.
pub async fn resolve_api_key(
    db: &SqlitePool,
    toml_config: &TomlConfig,
    provider: Provider,
) -> Result<Option<String>> {
    let db_key = settings::get_setting::<String>(db, provider.settings_key())
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(provider.env_var())
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = provider
        .toml_key(&toml_config.search)
        .filter(|k| is_valid_key(k))
        .cloned();

    let sources: Vec<&str> = [
        db_key.as_ref().map(|_| "database"),
        env_key.as_ref().map(|_| "environment"),
        toml_key.as_ref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sources.len() > 1 {
        warn!(
            "{} API key found in multiple sources: {}. Using {} (highest priority).",
            provider.name(),
            sources.join(", "),
            sources[0]
        );
    }

    match sources.first() {
        Some(source) => info!("{} API key loaded from {}", provider.name(), source),
        None => warn!(
            "{} API key not configured; set {} or [search] in config.toml",
            provider.name(),
            provider.env_var()
        ),
    }

    Ok(db_key.or(env_key).or(toml_key))
}

/// Base URLs of the search providers
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEndpoints {
    pub tmdb: String,
    pub books: String,
    pub games: String,
}

impl SearchEndpoints {
    /// TOML values over defaults; the games URL may also come from ENV
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        let search = &toml_config.search;
        let games = std::env::var(GAMES_BASE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| search.games_base_url.clone())
            .unwrap_or_else(|| DEFAULT_GAMES_BASE_URL.to_string());

        Self {
            tmdb: search
                .tmdb_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
            books: search
                .books_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BOOKS_BASE_URL.to_string()),
            games,
        }
    }
}
