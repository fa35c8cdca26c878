// src/fetch/providers/youtube.rs
//! Video search provider over the YouTube Data API. One fetch issues the
//! primary (localized) query plus an optional secondary-locale query and
//! merges the item lists, so both language communities surface in one page.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::content::{ContentItem, SearchPage, SourceType};
use crate::fetch::SearchProvider;

pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Extra query run alongside the caller's query, e.g. the English anchor
/// term next to the localized portal query.
#[derive(Debug, Clone)]
pub struct SecondaryQuery {
    pub query: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(default, rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(default, rename = "channelTitle")]
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

pub struct YoutubeSearchProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    primary_language: String,
    secondary: Option<SecondaryQuery>,
    max_results: usize,
}

impl YoutubeSearchProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        primary_language: impl Into<String>,
        secondary: Option<SecondaryQuery>,
        max_results: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            primary_language: primary_language.into(),
            secondary,
            max_results: max_results.max(1),
        }
    }

    async fn search_once(
        &self,
        key: &str,
        query: &str,
        count: usize,
        language: &str,
    ) -> Result<Vec<ContentItem>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let max_results = count.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", key),
                ("q", query),
                ("part", "snippet"),
                ("maxResults", max_results.as_str()),
                ("type", "video"),
                ("videoEmbeddable", "true"),
                ("relevanceLanguage", language),
            ])
            .send()
            .await
            .context("calling video search")?
            .error_for_status()
            .context("video search returned an error status")?;

        let payload: SearchResponse = response
            .json()
            .await
            .context("decoding video search response")?;

        let items = payload
            .items
            .into_iter()
            // Non-video hits carry no videoId; skip them rather than fail.
            .filter_map(|it| {
                let video_id = it.id.video_id?;
                Some(ContentItem {
                    title: it.snippet.title,
                    description: it.snippet.description,
                    link: format!("https://www.youtube.com/watch?v={video_id}"),
                    source_type: SourceType::Video,
                    blog_name: None,
                    channel_name: it.snippet.channel_title,
                    published_at: it.snippet.published_at,
                    thumbnail: it.snippet.thumbnails.medium.map(|t| t.url),
                })
            })
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl SearchProvider for YoutubeSearchProvider {
    async fn fetch(&self, query: &str, count: usize) -> Result<SearchPage> {
        let Some(key) = self.api_key.as_deref() else {
            bail!("video search API key not configured");
        };

        let mut plan: Vec<(&str, &str)> = vec![(query, self.primary_language.as_str())];
        if let Some(sec) = &self.secondary {
            plan.push((sec.query.as_str(), sec.language.as_str()));
        }

        let mut items: Vec<ContentItem> = Vec::new();
        let mut first_err: Option<anyhow::Error> = None;
        for (q, lang) in plan {
            match self.search_once(key, q, count, lang).await {
                Ok(mut batch) => items.append(&mut batch),
                Err(e) => {
                    warn!(query = q, language = lang, error = %format!("{e:#}"), "video locale query failed");
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        // One locale failing is tolerable as long as the other delivered.
        if items.is_empty() {
            if let Some(e) = first_err {
                return Err(e);
            }
        }
        Ok(SearchPage::from_items(items))
    }

    fn source_type(&self) -> SourceType {
        SourceType::Video
    }

    fn name(&self) -> &'static str {
        "youtube"
    }

    fn default_count(&self) -> usize {
        self.max_results
    }
}
