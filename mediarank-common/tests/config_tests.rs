//! Configuration resolution and graceful degradation
//!
//! Tests that touch MEDIARANK_* environment variables are marked #[serial].

use mediarank_common::config::{
    resolve_api_key, CompiledDefaults, Provider, RootFolderInitializer, RootFolderResolver,
    SearchConfig, SearchEndpoints, TomlConfig, DEFAULT_GAMES_BASE_URL, DEFAULT_PORT,
    GAMES_BASE_URL_ENV, ROOT_FOLDER_ENV,
};
use mediarank_common::db::init::open_in_memory;
use mediarank_common::db::settings::{set_setting, TMDB_API_KEY};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("mediarank") || defaults.root_folder.ends_with("mediarank_data"));
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.port, DEFAULT_PORT);
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/mediarank-from-env");

    let resolver = RootFolderResolver::new(Some(PathBuf::from("/tmp/mediarank-from-cli")))
        .with_config_path(None);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/mediarank-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_config_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "root_folder = \"/tmp/mediarank-from-toml\"\n");
    env::set_var(ROOT_FOLDER_ENV, "/tmp/mediarank-from-env");

    let resolver = RootFolderResolver::new(None).with_config_path(Some(config));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/mediarank-from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_config_file_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "root_folder = \"/tmp/mediarank-from-toml\"\n");

    let resolver = RootFolderResolver::new(None).with_config_path(Some(config));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/mediarank-from-toml"));
}

#[test]
#[serial]
fn test_missing_config_file_falls_back_to_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let dir = TempDir::new().unwrap();

    let resolver =
        RootFolderResolver::new(None).with_config_path(Some(dir.path().join("absent.toml")));
    assert_eq!(
        resolver.resolve(),
        CompiledDefaults::for_current_platform().root_folder
    );
}

#[test]
#[serial]
fn test_invalid_config_file_falls_back_to_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "root_folder = [not toml");

    let resolver = RootFolderResolver::new(None).with_config_path(Some(config));
    assert_eq!(
        resolver.resolve(),
        CompiledDefaults::for_current_platform().root_folder
    );
}

#[test]
fn test_initializer_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("level1").join("level2");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("mediarank.db"));
    assert!(!initializer.database_path().exists());
}

#[test]
fn test_toml_sections_are_optional() {
    let config: TomlConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.server.port, DEFAULT_PORT);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.search, SearchConfig::default());
    assert!(config.root_folder.is_none());
}

#[test]
fn test_toml_search_section() {
    let config: TomlConfig = toml::from_str(
        r#"
        [server]
        port = 8080

        [search]
        tmdb_api_key = "tmdb-key"
        books_base_url = "http://localhost:9000"
        "#,
    )
    .unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.search.tmdb_api_key.as_deref(), Some("tmdb-key"));

    let endpoints = SearchEndpoints::resolve(&config);
    assert_eq!(endpoints.books, "http://localhost:9000");
}

#[test]
#[serial]
fn test_games_base_url_env_override() {
    env::set_var(GAMES_BASE_URL_ENV, "http://games.local");
    let endpoints = SearchEndpoints::resolve(&TomlConfig::default());
    assert_eq!(endpoints.games, "http://games.local");

    env::remove_var(GAMES_BASE_URL_ENV);
    let endpoints = SearchEndpoints::resolve(&TomlConfig::default());
    assert_eq!(endpoints.games, DEFAULT_GAMES_BASE_URL);
}

#[tokio::test]
#[serial]
async fn test_api_key_priority_database_env_toml() {
    let pool = open_in_memory().await.unwrap();
    let mut toml_config = TomlConfig::default();
    toml_config.search.tmdb_api_key = Some("from-toml".to_string());
    env::remove_var(Provider::Tmdb.env_var());

    let key = resolve_api_key(&pool, &toml_config, Provider::Tmdb).await.unwrap();
    assert_eq!(key.as_deref(), Some("from-toml"));

    env::set_var(Provider::Tmdb.env_var(), "from-env");
    let key = resolve_api_key(&pool, &toml_config, Provider::Tmdb).await.unwrap();
    assert_eq!(key.as_deref(), Some("from-env"));

    set_setting(&pool, TMDB_API_KEY, "from-db").await.unwrap();
    let key = resolve_api_key(&pool, &toml_config, Provider::Tmdb).await.unwrap();
    assert_eq!(key.as_deref(), Some("from-db"));

    env::remove_var(Provider::Tmdb.env_var());
}

#[tokio::test]
#[serial]
async fn test_blank_api_keys_are_ignored() {
    let pool = open_in_memory().await.unwrap();
    let mut toml_config = TomlConfig::default();
    toml_config.search.books_api_key = Some("   ".to_string());
    env::remove_var(Provider::Books.env_var());

    let key = resolve_api_key(&pool, &toml_config, Provider::Books).await.unwrap();
    assert!(key.is_none());
}
