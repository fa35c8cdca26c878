// src/api.rs
//! HTTP integration layer over the curation core. The pipeline itself owns
//! no wire protocol; this router is what a newsletter UI host talks to.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::content::{ContentItem, Topic};
use crate::curator::Curator;
use crate::scoring::{self, ScoringHandle};

#[derive(Clone)]
pub struct AppState {
    curator: Arc<Curator>,
    scoring: ScoringHandle,
}

pub fn create_router(curator: Arc<Curator>, scoring: ScoringHandle) -> Router {
    let state = AppState { curator, scoring };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/materials", get(materials))
        .route("/score", post(score))
        .route("/admin/reload-scoring", get(admin_reload_scoring))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Build the full app router from the environment, the same way `main` does.
/// Integration tests drive this in-process via `tower::ServiceExt::oneshot`.
pub fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::from_env();
    let scoring = scoring::bootstrap();
    let curator = Arc::new(Curator::from_config(&cfg, scoring.clone())?);
    Ok(create_router(curator, scoring))
}

#[derive(Deserialize)]
struct MaterialsQuery {
    topic: String,
    #[serde(default)]
    localized: Option<String>,
}

async fn materials(
    State(state): State<AppState>,
    Query(q): Query<MaterialsQuery>,
) -> Json<Vec<ContentItem>> {
    let localized = q.localized.unwrap_or_else(|| q.topic.clone());
    let topic = Topic::new(q.topic, localized);
    Json(state.curator.best_materials(&topic).await)
}

#[derive(Deserialize)]
struct ScoreReq {
    #[serde(flatten)]
    item: ContentItem,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Serialize)]
struct ScoreResp {
    score: f32,
}

async fn score(State(state): State<AppState>, Json(body): Json<ScoreReq>) -> Json<ScoreResp> {
    let score = state.scoring.score(&body.item, body.topic.as_deref());
    Json(ScoreResp { score })
}

#[derive(Serialize)]
struct ReloadResp {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn admin_reload_scoring(State(state): State<AppState>) -> Json<ReloadResp> {
    match state.scoring.reload_from(&scoring::config_path()) {
        Ok(()) => Json(ReloadResp {
            ok: true,
            error: None,
        }),
        Err(e) => Json(ReloadResp {
            ok: false,
            error: Some(format!("{e:#}")),
        }),
    }
}
