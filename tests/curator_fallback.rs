// tests/curator_fallback.rs
// Entry-point guarantees: never empty, fallback on total failure, real
// results preferred when any source delivers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use learning_material_curator::cache::ResponseCache;
use learning_material_curator::content::{SourceType, Topic};
use learning_material_curator::curator::{fallback_materials, Curator};
use learning_material_curator::fetch::providers::{
    NaverCredentials, NaverSearchProvider, NaverVertical, SecondaryQuery, YoutubeSearchProvider,
};
use learning_material_curator::fetch::SearchProvider;
use learning_material_curator::scoring::{ScoringEngine, ScoringHandle};

fn scoring() -> ScoringHandle {
    ScoringHandle::new(ScoringEngine::default_seed())
}

fn naver(server: &MockServer, vertical: NaverVertical) -> Arc<dyn SearchProvider> {
    Arc::new(NaverSearchProvider::new(
        reqwest::Client::new(),
        server.uri(),
        Some(NaverCredentials {
            client_id: "test-id".into(),
            client_secret: "test-secret".into(),
        }),
        vertical,
        8,
    ))
}

fn youtube(server: &MockServer) -> Arc<dyn SearchProvider> {
    Arc::new(YoutubeSearchProvider::new(
        reqwest::Client::new(),
        server.uri(),
        Some("test-key".into()),
        "ko",
        Some(SecondaryQuery {
            query: "streamlit".into(),
            language: "en".into(),
        }),
        4,
    ))
}

fn curator(providers: Vec<Arc<dyn SearchProvider>>) -> Curator {
    Curator::new(
        providers,
        Arc::new(ResponseCache::new(Duration::from_secs(60))),
        scoring(),
        "스트림릿",
    )
}

#[tokio::test]
async fn all_sources_failing_yields_the_fixed_fallback_set() {
    let server = MockServer::start().await;
    for p in ["/blog.json", "/webkr.json", "/news.json", "/search"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }

    let c = curator(vec![
        naver(&server, NaverVertical::Blog),
        naver(&server, NaverVertical::Web),
        naver(&server, NaverVertical::News),
        youtube(&server),
    ]);

    let got = c.best_materials(&Topic::new("Introduction", "기본 소개")).await;
    assert!(!got.is_empty());
    assert_eq!(got, fallback_materials());
}

#[tokio::test]
async fn a_single_succeeding_source_beats_the_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "items": [
                {
                    "title": "스트림릿 튜토리얼: 처음 시작하기",
                    "description": "설치부터 첫 앱까지, 스트림릿 기본 사용법을 예제와 함께 차근차근 설명합니다.",
                    "link": "https://blog.example/start"
                },
                {
                    "title": "Streamlit tutorial for beginners",
                    "description": "A step by step guide covering install, widgets and layout in depth.",
                    "link": "https://blog.example/en-start"
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let c = curator(vec![
        naver(&server, NaverVertical::Blog),
        youtube(&server),
    ]);

    let got = c.best_materials(&Topic::new("Introduction", "기본 소개")).await;
    assert!(!got.is_empty());
    assert_ne!(got, fallback_materials());
    assert!(got.iter().all(|i| i.source_type == SourceType::Blog));
    assert!(got.len() <= 4);
}

#[tokio::test]
async fn multi_topic_lookup_reuses_the_same_cache_line() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "items": [{
                "title": "스트림릿 튜토리얼",
                "description": "기초 가이드와 예제 모음, 위젯과 레이아웃까지 자세히 다룹니다.",
                "link": "https://blog.example/1"
            }]
        })))
        .expect(1) // the second topic must be answered from the cache
        .mount(&server)
        .await;

    let c = curator(vec![naver(&server, NaverVertical::Blog)]);
    let topics = [
        Topic::new("Introduction", "기본 소개"),
        Topic::new("Widgets", "위젯"),
    ];
    let all = c.best_materials_for_topics(&topics).await;
    assert_eq!(all.len(), 2);
    assert!(all.values().all(|v| !v.is_empty()));
}
