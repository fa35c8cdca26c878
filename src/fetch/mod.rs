// src/fetch/mod.rs
pub mod providers;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::warn;

use crate::cache::ResponseCache;
use crate::content::{SearchPage, SourceOutcome, SourceType};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("search_fetch_total", "Source fetches attempted.");
        describe_counter!(
            "search_cache_hits_total",
            "Fetches answered from the response cache."
        );
        describe_counter!(
            "search_provider_errors_total",
            "Provider fetch/decode errors."
        );
        describe_counter!("search_items_total", "Items returned by providers.");
        describe_histogram!("search_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// One external content backend, normalized.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Call the backend and map its native response into a `SearchPage`.
    /// Network and payload faults come back as `Err`; the fetcher turns them
    /// into error outcomes, so implementations never panic on backend data.
    async fn fetch(&self, query: &str, count: usize) -> anyhow::Result<SearchPage>;

    fn source_type(&self) -> SourceType;

    fn name(&self) -> &'static str;

    /// How many results this source is asked for per call.
    fn default_count(&self) -> usize {
        5
    }
}

/// Fetch every source concurrently (one task per provider, nothing more)
/// and aggregate all outcomes. One source failing never hides another
/// source's results; if every source fails the caller sees an all-error
/// mapping and decides on fallback behavior.
///
/// The cache is consulted before any network call and populated after a
/// successful one. Failed calls are not cached, so transient backend errors
/// are retried on the next request instead of remembered.
pub async fn fetch_all(
    query: &str,
    providers: &[Arc<dyn SearchProvider>],
    cache: &Arc<ResponseCache>,
) -> HashMap<SourceType, SourceOutcome> {
    ensure_metrics_described();

    let mut set = JoinSet::new();
    for provider in providers {
        let provider = Arc::clone(provider);
        let query = query.to_string();
        let cache = Arc::clone(cache);
        set.spawn(async move {
            let outcome = fetch_one(provider.as_ref(), &query, &cache).await;
            (provider.source_type(), outcome)
        });
    }

    let mut out = HashMap::with_capacity(providers.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((source, outcome)) => {
                if let SourceOutcome::Error(e) = &outcome {
                    warn!(source = %source, error = %e, "source fetch failed");
                }
                out.insert(source, outcome);
            }
            Err(e) => {
                // A panicked fetch task loses only its own source slot.
                warn!(error = ?e, "search task aborted");
                counter!("search_provider_errors_total").increment(1);
            }
        }
    }
    out
}

async fn fetch_one(
    provider: &dyn SearchProvider,
    query: &str,
    cache: &ResponseCache,
) -> SourceOutcome {
    let source = provider.source_type();
    counter!("search_fetch_total").increment(1);

    if let Some(page) = cache.get(query, source.as_str()) {
        counter!("search_cache_hits_total").increment(1);
        return SourceOutcome::Page(page);
    }

    let t0 = Instant::now();
    match provider.fetch(query, provider.default_count()).await {
        Ok(page) => {
            let ms = t0.elapsed().as_secs_f64() * 1_000.0;
            histogram!("search_fetch_ms").record(ms);
            counter!("search_items_total").increment(page.items.len() as u64);
            cache.put(query, source.as_str(), page.clone());
            SourceOutcome::Page(page)
        }
        Err(e) => {
            counter!("search_provider_errors_total").increment(1);
            // `{:#}` keeps the context chain in one line.
            SourceOutcome::Error(format!("{e:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticProvider {
        source: SourceType,
        items: Vec<ContentItem>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SearchProvider for StaticProvider {
        async fn fetch(&self, _query: &str, _count: usize) -> anyhow::Result<SearchPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchPage::from_items(self.items.clone()))
        }
        fn source_type(&self) -> SourceType {
            self.source
        }
        fn name(&self) -> &'static str {
            "static"
        }
    }

    struct FailingProvider {
        source: SourceType,
    }

    #[async_trait::async_trait]
    impl SearchProvider for FailingProvider {
        async fn fetch(&self, _query: &str, _count: usize) -> anyhow::Result<SearchPage> {
            anyhow::bail!("connection refused")
        }
        fn source_type(&self) -> SourceType {
            self.source
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn item(link: &str, source: SourceType) -> ContentItem {
        ContentItem::new("t", "d", link, source)
    }

    #[tokio::test]
    async fn partial_failure_keeps_successful_sources() {
        let ok = Arc::new(StaticProvider {
            source: SourceType::Blog,
            items: vec![item("https://b/1", SourceType::Blog)],
            calls: AtomicUsize::new(0),
        });
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            ok.clone(),
            Arc::new(FailingProvider {
                source: SourceType::News,
            }),
        ];
        let cache = Arc::new(ResponseCache::with_default_ttl());
        let out = fetch_all("streamlit", &providers, &cache).await;

        assert_eq!(out.len(), 2);
        assert!(out[&SourceType::News].is_error());
        let page = out[&SourceType::Blog].page().unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn successes_are_cached_and_errors_are_not() {
        let ok = Arc::new(StaticProvider {
            source: SourceType::Blog,
            items: vec![item("https://b/1", SourceType::Blog)],
            calls: AtomicUsize::new(0),
        });
        let providers: Vec<Arc<dyn SearchProvider>> = vec![ok.clone()];
        let cache = Arc::new(ResponseCache::with_default_ttl());

        let _ = fetch_all("streamlit", &providers, &cache).await;
        let _ = fetch_all("streamlit", &providers, &cache).await;
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1, "second call hits cache");

        // Failed fetches leave no cache line behind.
        let failing: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(FailingProvider {
            source: SourceType::News,
        })];
        let _ = fetch_all("streamlit", &failing, &cache).await;
        assert!(cache
            .get("streamlit", SourceType::News.as_str())
            .is_none());
    }

    #[tokio::test]
    async fn all_sources_failing_yields_an_all_error_mapping() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(FailingProvider {
                source: SourceType::Blog,
            }),
            Arc::new(FailingProvider {
                source: SourceType::Video,
            }),
        ];
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let out = fetch_all("streamlit", &providers, &cache).await;
        assert_eq!(out.len(), 2);
        assert!(out.values().all(SourceOutcome::is_error));
    }
}
