// src/fetch/providers/naver.rs
//! Portal search provider: the blog, web-document, and news verticals of the
//! Naver open search API share one request/response shape, so a single
//! provider struct covers all three, parameterized by vertical.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::content::{ContentItem, SearchPage, SourceType};
use crate::fetch::SearchProvider;

pub const DEFAULT_NAVER_API_BASE: &str = "https://openapi.naver.com/v1/search";

#[derive(Debug, Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaverVertical {
    Blog,
    Web,
    News,
}

impl NaverVertical {
    fn path(self) -> &'static str {
        match self {
            NaverVertical::Blog => "blog.json",
            NaverVertical::Web => "webkr.json",
            NaverVertical::News => "news.json",
        }
    }

    fn source_type(self) -> SourceType {
        match self {
            NaverVertical::Blog => SourceType::Blog,
            NaverVertical::Web => SourceType::WebDocument,
            NaverVertical::News => SourceType::News,
        }
    }
}

// Native response shape. Titles/descriptions arrive with <b> highlight
// wrappers; they are carried into the item untouched and stripped by the
// scorer/display layer.
#[derive(Debug, Deserialize)]
struct NaverResponse {
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    items: Vec<NaverItem>,
}

#[derive(Debug, Deserialize)]
struct NaverItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    bloggername: Option<String>,
    #[serde(default)]
    postdate: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
}

pub struct NaverSearchProvider {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<NaverCredentials>,
    vertical: NaverVertical,
    display: usize,
}

impl NaverSearchProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Option<NaverCredentials>,
        vertical: NaverVertical,
        display: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
            vertical,
            display: display.max(1),
        }
    }
}

#[async_trait]
impl SearchProvider for NaverSearchProvider {
    async fn fetch(&self, query: &str, count: usize) -> Result<SearchPage> {
        let Some(creds) = &self.credentials else {
            bail!("portal search credentials not configured");
        };

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), self.vertical.path());
        let display = count.to_string();
        let response = self
            .client
            .get(&url)
            .header("X-Naver-Client-Id", &creds.client_id)
            .header("X-Naver-Client-Secret", &creds.client_secret)
            .query(&[
                ("query", query),
                ("display", display.as_str()),
                ("sort", "sim"),
            ])
            .send()
            .await
            .with_context(|| format!("calling {} search", self.name()))?
            .error_for_status()
            .with_context(|| format!("{} search returned an error status", self.name()))?;

        let payload: NaverResponse = response
            .json()
            .await
            .with_context(|| format!("decoding {} search response", self.name()))?;

        let source_type = self.vertical.source_type();
        let items: Vec<ContentItem> = payload
            .items
            .into_iter()
            .filter(|it| !it.link.is_empty())
            .map(|it| ContentItem {
                title: it.title,
                description: it.description,
                link: it.link,
                source_type,
                blog_name: it.bloggername,
                channel_name: None,
                published_at: it.postdate.or(it.pub_date),
                thumbnail: None,
            })
            .collect();

        let total = payload.total.unwrap_or(items.len());
        Ok(SearchPage { items, total })
    }

    fn source_type(&self) -> SourceType {
        self.vertical.source_type()
    }

    fn name(&self) -> &'static str {
        match self.vertical {
            NaverVertical::Blog => "naver_blog",
            NaverVertical::Web => "naver_web",
            NaverVertical::News => "naver_news",
        }
    }

    fn default_count(&self) -> usize {
        self.display
    }
}
