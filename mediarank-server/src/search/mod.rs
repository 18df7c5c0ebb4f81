//! External media search
//!
//! One client per provider. Each client fetches raw provider JSON and runs it
//! through a pure `normalize` function, so the mapping is testable without
//! the network. Failed calls are not retried.

use async_trait::async_trait;
use mediarank_common::config::{resolve_api_key, Provider, SearchEndpoints, TomlConfig};
use mediarank_common::models::{MediaCategory, MediaItem};
use mediarank_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub mod books;
pub mod games;
pub mod tmdb;

pub use books::BooksClient;
pub use games::GamesClient;
pub use tmdb::TmdbClient;

const USER_AGENT: &str = concat!("MediaRank/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn category(&self) -> MediaCategory;

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>>;
}

/// Shared HTTP client for all providers
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

/// GET a URL and decode the JSON body; transport failures and non-2xx
/// statuses become `Network` errors
pub(crate) async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    provider: &str,
    url: &str,
) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Network(format!("{} unreachable: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!(
            "{} returned HTTP {}",
            provider,
            status.as_u16()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Network(format!("{} sent an unreadable response: {}", provider, e)))
}

/// Case-insensitive substring match used to filter provider results
pub fn title_matches(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.to_lowercase())
}

/// Poster used when the provider has no image
pub fn placeholder_poster(title: &str) -> String {
    format!("https://placehold.co/400x600?text={}", urlencoding::encode(title))
}

/// Category → provider dispatch
#[derive(Clone, Default)]
pub struct SearchService {
    providers: Vec<Arc<dyn SearchProvider>>,
}

impl SearchService {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Build clients for every provider that has an API key
    pub async fn from_config(db: &SqlitePool, toml_config: &TomlConfig) -> Result<Self> {
        let endpoints = SearchEndpoints::resolve(toml_config);
        let client = http_client()?;
        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

        if let Some(key) = resolve_api_key(db, toml_config, Provider::Tmdb).await? {
            for category in [MediaCategory::Movie, MediaCategory::Tv] {
                providers.push(Arc::new(TmdbClient::new(
                    client.clone(),
                    endpoints.tmdb.clone(),
                    key.clone(),
                    category,
                )));
            }
        }
        if let Some(key) = resolve_api_key(db, toml_config, Provider::Books).await? {
            providers.push(Arc::new(BooksClient::new(
                client.clone(),
                endpoints.books.clone(),
                key,
            )));
        }
        if let Some(key) = resolve_api_key(db, toml_config, Provider::Games).await? {
            providers.push(Arc::new(GamesClient::new(
                client.clone(),
                endpoints.games.clone(),
                key,
            )));
        }

        info!("Search providers enabled: {}", providers.len());
        Ok(Self { providers })
    }

    pub fn is_enabled(&self, category: MediaCategory) -> bool {
        self.providers.iter().any(|p| p.category() == category)
    }

    pub async fn search(&self, category: MediaCategory, query: &str) -> Result<Vec<MediaItem>> {
        if category == MediaCategory::Music {
            return Err(Error::Validation("music search is not supported".to_string()));
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Search query is required".to_string()));
        }

        let provider = self
            .providers
            .iter()
            .find(|p| p.category() == category)
            .ok_or_else(|| Error::Config(format!("{} search is not configured", category)))?;

        let results = provider.search(query).await?;
        debug!(category = %category, query = %query, count = results.len(), "Search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(MediaCategory);

    #[async_trait]
    impl SearchProvider for Fixed {
        fn category(&self) -> MediaCategory {
            self.0
        }

        async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
            Ok(vec![MediaItem::new("1", self.0, query)])
        }
    }

    #[test]
    fn test_title_matches_ignores_case() {
        assert!(title_matches("The Matrix", "matrix"));
        assert!(!title_matches("Heat", "matrix"));
    }

    #[test]
    fn test_placeholder_encodes_title() {
        assert_eq!(
            placeholder_poster("Half Life"),
            "https://placehold.co/400x600?text=Half%20Life"
        );
    }

    #[tokio::test]
    async fn test_dispatch_by_category() {
        let service = SearchService::new(vec![Arc::new(Fixed(MediaCategory::Book))]);
        let found = service.search(MediaCategory::Book, " dune ").await.unwrap();
        assert_eq!(found[0].title, "dune");
        assert!(service.is_enabled(MediaCategory::Book));
    }

    #[tokio::test]
    async fn test_music_and_unconfigured_categories() {
        let service = SearchService::default();
        assert!(matches!(
            service.search(MediaCategory::Music, "abba").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.search(MediaCategory::Game, "zork").await,
            Err(Error::Config(_))
        ));
    }
}
