//! TheGamesDB search

use async_trait::async_trait;
use mediarank_common::models::{MediaCategory, MediaItem};
use mediarank_common::Result;
use serde::Deserialize;
use std::collections::HashMap;

use super::{fetch_json, placeholder_poster, title_matches, SearchProvider};

#[derive(Debug, Deserialize)]
pub struct GamesResponse {
    pub data: GamesData,
    #[serde(default)]
    pub include: Option<GamesInclude>,
}

#[derive(Debug, Deserialize)]
pub struct GamesData {
    #[serde(default)]
    pub games: Vec<Game>,
}

#[derive(Debug, Deserialize)]
pub struct Game {
    pub id: i64,
    pub game_title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GamesInclude {
    #[serde(default)]
    pub boxart: Option<Boxart>,
}

#[derive(Debug, Deserialize)]
pub struct Boxart {
    #[serde(default)]
    pub base_url: Option<BoxartBaseUrl>,
    /// Keyed by game id as a string
    #[serde(default)]
    pub data: HashMap<String, Vec<BoxartImage>>,
}

#[derive(Debug, Deserialize)]
pub struct BoxartBaseUrl {
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BoxartImage {
    pub filename: String,
}

/// Medium boxart URL for a game: base URL plus the first listed image
fn boxart_url(boxart: Option<&Boxart>, game_id: i64) -> Option<String> {
    let boxart = boxart?;
    let base = boxart.base_url.as_ref()?.medium.as_ref()?;
    let first = boxart.data.get(&game_id.to_string())?.first()?;
    Some(format!("{}{}", base, first.filename))
}

pub fn normalize(response: GamesResponse, query: &str) -> Vec<MediaItem> {
    let boxart = response.include.and_then(|i| i.boxart);

    response
        .data
        .games
        .into_iter()
        .filter(|g| title_matches(&g.game_title, query))
        .map(|g| {
            let poster = boxart_url(boxart.as_ref(), g.id)
                .unwrap_or_else(|| placeholder_poster(&g.game_title));
            let mut item = MediaItem::new(g.id.to_string(), MediaCategory::Game, g.game_title);
            item.poster = Some(poster);
            item.release_date = g.release_date;
            item.overview = g.overview;
            item
        })
        .collect()
}

pub struct GamesClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GamesClient {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/v1/Games/ByGameName?apikey={}&name={}&fields=overview&include=boxart",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl SearchProvider for GamesClient {
    fn category(&self) -> MediaCategory {
        MediaCategory::Game
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        tracing::debug!(query = %query, "Querying TheGamesDB");
        let response: GamesResponse =
            fetch_json(&self.http_client, "TheGamesDB", &self.search_url(query)).await?;
        Ok(normalize(response, query))
    }
}
