// src/curator.rs
//! The pipeline entry point: fetch every source in parallel, score and
//! select, and guarantee a non-empty material list via a fixed fallback set.
//!
//! All collaborators (cache, providers, scoring handle) are constructed
//! explicitly and injected here; there is no ambient global state.

use anyhow::Context;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::content::{ContentItem, SourceType, Topic};
use crate::fetch::providers::{
    NaverCredentials, NaverSearchProvider, NaverVertical, SecondaryQuery, YoutubeSearchProvider,
};
use crate::fetch::{self, SearchProvider};
use crate::scoring::ScoringHandle;

// Per-source result counts, mirroring what each backend is worth asking for.
const BLOG_RESULTS: usize = 8;
const WEB_RESULTS: usize = 8;
const NEWS_RESULTS: usize = 5;
const VIDEO_RESULTS_PER_LOCALE: usize = 4;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curator_fallback_total",
            "Requests answered with the static fallback material set."
        );
        describe_counter!("curator_requests_total", "Material selection requests.");
    });
}

pub struct Curator {
    providers: Vec<Arc<dyn SearchProvider>>,
    cache: Arc<ResponseCache>,
    scoring: ScoringHandle,
    query: String,
}

impl Curator {
    /// Wire providers/cache from process config; search terms come from the
    /// scoring config so they can be tuned alongside the keyword tables.
    pub fn from_config(cfg: &AppConfig, scoring: ScoringHandle) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("building HTTP client")?;

        let credentials = match (&cfg.naver.client_id, &cfg.naver.client_secret) {
            (Some(id), Some(secret)) => Some(NaverCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        };

        let terms = scoring.search_terms();
        let secondary = terms.secondary_video_query.as_ref().map(|q| SecondaryQuery {
            query: q.clone(),
            language: terms.secondary_video_language.clone(),
        });

        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(NaverSearchProvider::new(
                client.clone(),
                cfg.naver.base_url.clone(),
                credentials.clone(),
                NaverVertical::Blog,
                BLOG_RESULTS,
            )),
            Arc::new(NaverSearchProvider::new(
                client.clone(),
                cfg.naver.base_url.clone(),
                credentials.clone(),
                NaverVertical::Web,
                WEB_RESULTS,
            )),
            Arc::new(NaverSearchProvider::new(
                client.clone(),
                cfg.naver.base_url.clone(),
                credentials,
                NaverVertical::News,
                NEWS_RESULTS,
            )),
            Arc::new(YoutubeSearchProvider::new(
                client,
                cfg.youtube.base_url.clone(),
                cfg.youtube.api_key.clone(),
                terms.primary_video_language.clone(),
                secondary,
                VIDEO_RESULTS_PER_LOCALE,
            )),
        ];

        Ok(Self {
            providers,
            cache: Arc::new(ResponseCache::new(Duration::from_secs(cfg.cache_ttl_secs))),
            scoring,
            query: terms.query,
        })
    }

    /// Assembly for tests and embedders that bring their own providers.
    pub fn new(
        providers: Vec<Arc<dyn SearchProvider>>,
        cache: Arc<ResponseCache>,
        scoring: ScoringHandle,
        query: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            cache,
            scoring,
            query: query.into(),
        }
    }

    /// The one operation the surrounding application calls: never errors,
    /// never returns an empty list. Real results and the static fallback are
    /// distinguished in logs and metrics only.
    pub async fn best_materials(&self, topic: &Topic) -> Vec<ContentItem> {
        ensure_metrics_described();
        counter!("curator_requests_total").increment(1);

        // One shared query per run: the cache line is deliberately reused
        // across topics, scoring does the per-topic differentiation.
        let results = fetch::fetch_all(&self.query, &self.providers, &self.cache).await;
        let picked = self.scoring.select(&results, Some(&topic.name), None);

        if picked.is_empty() {
            warn!(
                topic = %topic.name,
                localized = %topic.localized_name,
                "no materials survived selection; substituting the fallback set"
            );
            counter!("curator_fallback_total").increment(1);
            return fallback_materials();
        }

        info!(
            topic = %topic.name,
            localized = %topic.localized_name,
            picked = picked.len(),
            "materials selected"
        );
        picked
    }

    /// Convenience loop for a whole curriculum page, keyed by topic name.
    pub async fn best_materials_for_topics(
        &self,
        topics: &[Topic],
    ) -> HashMap<String, Vec<ContentItem>> {
        let mut out = HashMap::with_capacity(topics.len());
        for topic in topics {
            let materials = self.best_materials(topic).await;
            out.insert(topic.name.clone(), materials);
        }
        out
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}

/// Hardcoded starter materials used when every source errored or nothing
/// cleared selection. Downstream newsletter assembly always has something
/// to cite.
pub fn fallback_materials() -> Vec<ContentItem> {
    vec![
        ContentItem {
            title: "스트림릿(Streamlit) 기초: 데이터 앱 쉽게 만들기".to_string(),
            description: "파이썬으로 데이터 애플리케이션을 만드는 Streamlit의 기본 사용법. 설치부터 첫 앱 실행까지 단계별로 설명합니다.".to_string(),
            link: "https://docs.streamlit.io/get-started".to_string(),
            source_type: SourceType::Blog,
            blog_name: Some("파이썬 개발자 블로그".to_string()),
            channel_name: None,
            published_at: None,
            thumbnail: None,
        },
        ContentItem {
            title: "Streamlit Tutorial: Creating Interactive Web Apps".to_string(),
            description: "Learn how to build interactive web applications with Streamlit in Python. Covers widgets, layouts, and data visualization.".to_string(),
            link: "https://www.youtube.com/watch?v=B2iAodr0fOo".to_string(),
            source_type: SourceType::Video,
            blog_name: None,
            channel_name: Some("Streamlit Official".to_string()),
            published_at: None,
            thumbnail: None,
        },
        ContentItem {
            title: "Streamlit API reference".to_string(),
            description: "The official reference for every Streamlit element, from st.write to session state, with runnable snippets.".to_string(),
            link: "https://docs.streamlit.io/develop/api-reference".to_string(),
            source_type: SourceType::WebDocument,
            blog_name: None,
            channel_name: None,
            published_at: None,
            thumbnail: None,
        },
    ]
}
