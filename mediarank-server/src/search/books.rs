//! Google Books search

use async_trait::async_trait;
use mediarank_common::models::{MediaCategory, MediaItem};
use mediarank_common::Result;
use serde::Deserialize;

use super::{fetch_json, placeholder_poster, title_matches, SearchProvider};

#[derive(Debug, Deserialize)]
pub struct VolumesResponse {
    /// Absent when nothing matched
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    pub volume_info: VolumeInfo,
    #[serde(default)]
    pub search_info: Option<SearchInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub small_thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInfo {
    #[serde(default)]
    pub text_snippet: Option<String>,
}

pub fn normalize(response: VolumesResponse, query: &str) -> Vec<MediaItem> {
    response
        .items
        .into_iter()
        .filter(|v| title_matches(&v.volume_info.title, query))
        .map(|v| {
            let info = v.volume_info;
            let links = info.image_links.unwrap_or(ImageLinks {
                small_thumbnail: None,
                thumbnail: None,
            });
            let poster = links
                .thumbnail
                .or(links.small_thumbnail)
                .unwrap_or_else(|| placeholder_poster(&info.title));
            let overview = info
                .description
                .or_else(|| v.search_info.and_then(|s| s.text_snippet))
                .unwrap_or_default();

            let mut item = MediaItem::new(v.id, MediaCategory::Book, info.title);
            item.poster = Some(poster);
            item.rating = info.average_rating;
            item.overview = Some(overview);
            item.release_date = info.published_date;
            item
        })
        .collect()
}

pub struct BooksClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BooksClient {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/books/v1/volumes?q={}&key={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl SearchProvider for BooksClient {
    fn category(&self) -> MediaCategory {
        MediaCategory::Book
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        tracing::debug!(query = %query, "Querying Google Books");
        let response: VolumesResponse =
            fetch_json(&self.http_client, "Google Books", &self.search_url(query)).await?;
        Ok(normalize(response, query))
    }
}
