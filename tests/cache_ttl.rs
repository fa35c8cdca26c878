// tests/cache_ttl.rs
// TTL behavior of the response cache, driven by an explicit clock so the
// tests never sleep.

use std::time::Duration;

use learning_material_curator::cache::{ResponseCache, DEFAULT_TTL_SECS};
use learning_material_curator::content::{ContentItem, SearchPage, SourceType};

fn page(link: &str) -> SearchPage {
    SearchPage::from_items(vec![ContentItem::new(
        "Streamlit tutorial",
        "desc",
        link,
        SourceType::Blog,
    )])
}

#[test]
fn default_ttl_is_24_hours() {
    assert_eq!(DEFAULT_TTL_SECS, 24 * 60 * 60);
}

#[test]
fn entry_stored_25_hours_ago_reads_as_a_miss() {
    let cache = ResponseCache::new(Duration::from_secs(DEFAULT_TTL_SECS));
    let stored_at = 1_700_000_000;
    cache.put_at(stored_at, "스트림릿", "blog", page("https://b/1"));

    let hit = cache.get_at(stored_at + 23 * 60 * 60, "스트림릿", "blog");
    assert!(hit.is_some(), "23h-old entry is still fresh");

    let miss = cache.get_at(stored_at + 25 * 60 * 60, "스트림릿", "blog");
    assert!(miss.is_none(), "25h-old entry must not be returned");
}

#[test]
fn overwrite_resets_the_clock() {
    let cache = ResponseCache::new(Duration::from_secs(100));
    cache.put_at(0, "q", "blog", page("https://b/old"));
    cache.put_at(90, "q", "blog", page("https://b/new"));

    let got = cache.get_at(150, "q", "blog").expect("rewritten entry fresh");
    assert_eq!(got.items[0].link, "https://b/new");
}

#[test]
fn key_ignores_call_order_and_query_shape() {
    let cache = ResponseCache::with_default_ttl();
    cache.put_at(10, "Streamlit  Basics", "video", page("https://v/1"));
    // Same query modulo case/spacing, same source → same line.
    assert!(cache.get_at(11, "streamlit basics", "video").is_some());
    // Same query, other source → independent line.
    assert!(cache.get_at(11, "streamlit basics", "news").is_none());
}
