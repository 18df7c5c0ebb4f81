//! TMDB movie and TV search

use async_trait::async_trait;
use mediarank_common::models::{MediaCategory, MediaItem};
use mediarank_common::Result;
use serde::Deserialize;

use super::{fetch_json, placeholder_poster, title_matches, SearchProvider};

const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w400";

#[derive(Debug, Deserialize)]
pub struct TmdbResponse {
    #[serde(default)]
    pub results: Vec<TmdbResult>,
}

/// One movie or show; movies carry `title`/`release_date`, shows
/// `name`/`first_air_date`
#[derive(Debug, Deserialize)]
pub struct TmdbResult {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

/// Keep English-language results whose title contains the query
pub fn normalize(response: TmdbResponse, category: MediaCategory, query: &str) -> Vec<MediaItem> {
    response
        .results
        .into_iter()
        .filter_map(|r| {
            let (title, date) = match category {
                MediaCategory::Tv => (r.name?, r.first_air_date),
                _ => (r.title?, r.release_date),
            };
            let english = r
                .original_language
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case("en"));
            if !english || !title_matches(&title, query) {
                return None;
            }

            let poster = match r.poster_path.filter(|p| !p.is_empty()) {
                Some(path) => format!("{}{}", POSTER_BASE_URL, path),
                None => placeholder_poster(&title),
            };

            let mut item = MediaItem::new(r.id.to_string(), category, title);
            item.poster = Some(poster);
            item.rating = r.vote_average.filter(|v| *v > 0.0);
            item.release_date = date.filter(|d| !d.is_empty());
            item.overview = r.overview;
            Some(item)
        })
        .collect()
}

pub struct TmdbClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    category: MediaCategory,
}

impl TmdbClient {
    /// `category` selects the endpoint: `Tv` searches shows, anything else movies
    pub fn new(
        http_client: reqwest::Client,
        base_url: String,
        api_key: String,
        category: MediaCategory,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            category,
        }
    }

    fn search_url(&self, query: &str) -> String {
        let kind = match self.category {
            MediaCategory::Tv => "tv",
            _ => "movie",
        };
        format!(
            "{}/search/{}?api_key={}&query={}&region=US",
            self.base_url,
            kind,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl SearchProvider for TmdbClient {
    fn category(&self) -> MediaCategory {
        self.category
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        tracing::debug!(category = %self.category, query = %query, "Querying TMDB");
        let response: TmdbResponse =
            fetch_json(&self.http_client, "TMDB", &self.search_url(query)).await?;
        Ok(normalize(response, self.category, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movies() -> TmdbResponse {
        serde_json::from_value(json!({
            "page": 1,
            "results": [
                {
                    "id": 603,
                    "title": "The Matrix",
                    "original_language": "en",
                    "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
                    "vote_average": 8.2,
                    "release_date": "1999-03-30",
                    "overview": "A hacker learns the truth."
                },
                {
                    "id": 604,
                    "title": "Matrix (dub)",
                    "original_language": "fr",
                    "vote_average": 5.0
                },
                {
                    "id": 605,
                    "title": "The Animatrix",
                    "original_language": "EN",
                    "poster_path": null,
                    "vote_average": 0
                },
                {
                    "id": 606,
                    "title": "Heat",
                    "original_language": "en"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_movie_normalization() {
        let items = normalize(movies(), MediaCategory::Movie, "matrix");
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["603", "605"]);

        let matrix = &items[0];
        assert_eq!(matrix.category, MediaCategory::Movie);
        assert_eq!(
            matrix.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w400/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg")
        );
        assert_eq!(matrix.rating, Some(8.2));
        assert_eq!(matrix.release_date.as_deref(), Some("1999-03-30"));

        let animatrix = &items[1];
        assert_eq!(
            animatrix.poster.as_deref(),
            Some("https://placehold.co/400x600?text=The%20Animatrix")
        );
        assert_eq!(animatrix.rating, None);
    }

    #[test]
    fn test_tv_uses_name_and_first_air_date() {
        let response: TmdbResponse = serde_json::from_value(json!({
            "results": [
                { "id": 1399, "name": "Game of Thrones", "original_language": "en", "first_air_date": "2011-04-17" },
                { "id": 1400, "title": "Not a show", "original_language": "en" }
            ]
        }))
        .unwrap();

        let items = normalize(response, MediaCategory::Tv, "game");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Game of Thrones");
        assert_eq!(items[0].category, MediaCategory::Tv);
        assert_eq!(items[0].release_date.as_deref(), Some("2011-04-17"));
    }

    #[test]
    fn test_search_url() {
        let client = TmdbClient::new(
            reqwest::Client::new(),
            "https://api.themoviedb.org/3/".to_string(),
            "k".to_string(),
            MediaCategory::Tv,
        );
        assert_eq!(
            client.search_url("doctor who"),
            "https://api.themoviedb.org/3/search/tv?api_key=k&query=doctor%20who&region=US"
        );
    }
}
