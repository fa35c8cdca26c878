// src/scoring.rs
//! Educational-relevance scoring: config types, TOML loading, the scoring
//! engine, and a thread-safe handle with dev-gated hot reload.
//!
//! `ScoringEngine::score` is a pure function: no I/O, no clock, identical
//! inputs give identical output. All constants live in `config/scoring.toml`
//! (compiled in as the default seed) so they can be tuned without a rebuild.

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use crate::content::{ContentItem, SourceType};
use crate::text::{normalize_key, strip_markup};

// --- env defaults & names ---
pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";
pub const ENV_SCORE_FLOOR: &str = "SCORE_FLOOR";

/// Compiled-in copy of the shipped config; used whenever the file is absent
/// or unreadable so the pipeline always has a working scorer.
const DEFAULT_SCORING_TOML: &str = include_str!("../config/scoring.toml");

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringRoot {
    pub scoring: ScoringSection,
    pub search: SearchTerms,
    pub tiers: TierWords,
    pub tier_bonus: TierBonus,
    #[serde(default)]
    pub source_weights: SourceWeights,
    #[serde(default)]
    pub topic_keywords: HashMap<String, Vec<String>>,
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSection {
    pub base_score: f32,
    pub anchor_title_bonus: f32,
    pub anchor_description_bonus: f32,
    pub topic_exact_bonus: f32,
    pub topic_keyword_bonus: f32,
    pub trouble_penalty: f32,
    pub short_description_len: usize,
    pub short_description_penalty: f32,
    pub long_description_len: usize,
    pub long_description_bonus: f32,
    #[serde(default)]
    pub anchors: Vec<String>,
    #[serde(default)]
    pub trouble_patterns: Vec<String>,
}

/// Query plan shared by the curator and the video provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTerms {
    pub query: String,
    #[serde(default)]
    pub secondary_video_query: Option<String>,
    #[serde(default = "default_primary_video_language")]
    pub primary_video_language: String,
    #[serde(default = "default_secondary_video_language")]
    pub secondary_video_language: String,
}

fn default_primary_video_language() -> String {
    "ko".to_string()
}

fn default_secondary_video_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TierWords {
    #[serde(default)]
    pub strong: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub weak: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierBonus {
    pub strong_title: f32,
    pub strong_text: f32,
    pub medium_title: f32,
    pub medium_text: f32,
    pub weak_title: f32,
    pub weak_text: f32,
}

/// Multiplicative weight per source type, with a neutral default for
/// anything not listed.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceWeights {
    #[serde(default = "default_source_weight")]
    pub default_weight: f32,
    #[serde(default)]
    pub weights: HashMap<String, f32>,
}

fn default_source_weight() -> f32 {
    1.0
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            default_weight: default_source_weight(),
            weights: HashMap::new(),
        }
    }
}

impl SourceWeights {
    pub fn weight_for(&self, source: SourceType) -> f32 {
        self.weights
            .get(source.as_str())
            .copied()
            .unwrap_or(self.default_weight)
    }
}

/// Selection policy consumed by `select::select_best`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_max_total")]
    pub max_total: usize,
    #[serde(default = "default_score_floor")]
    pub score_floor: f32,
    #[serde(default = "default_min_keep")]
    pub min_keep: usize,
    #[serde(default)]
    pub caps: HashMap<String, usize>,
}

fn default_max_total() -> usize {
    4
}

fn default_score_floor() -> f32 {
    5.0
}

fn default_min_keep() -> usize {
    2
}

impl SelectionConfig {
    /// A type without a configured cap contributes nothing to the selection.
    pub fn cap_for(&self, source: SourceType) -> usize {
        self.caps.get(source.as_str()).copied().unwrap_or(0)
    }
}

// parse optional float env and clamp to a sane floor range
fn parse_floor_env(raw: Option<String>) -> Option<f32> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .map(|v| v.clamp(-100.0, 100.0))
}

/* ----------------------------
Compiled engine
---------------------------- */

#[derive(Debug)]
struct Tier {
    words: Vec<String>, // lowercased
    title_bonus: f32,
    text_bonus: f32,
}

/// Holds the parsed config plus lowercased word lists and compiled regexes.
#[derive(Debug)]
pub struct ScoringEngine {
    cfg: ScoringRoot,
    tiers: Vec<Tier>,
    anchors: Vec<String>,
    trouble: Vec<Regex>,
    topic_table: Vec<(String, Vec<String>)>,
}

impl ScoringEngine {
    /// Load from a TOML file. Applies the `SCORE_FLOOR` env override.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config at {}", path.display()))?;
        let mut eng = Self::from_toml_str(&content)?;
        if let Some(floor) = parse_floor_env(std::env::var(ENV_SCORE_FLOOR).ok()) {
            eng.cfg.selection.score_floor = floor;
        }
        Ok(eng)
    }

    /// Load from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: ScoringRoot = toml::from_str(toml_str).context("parsing scoring config")?;

        let tiers = vec![
            Tier {
                words: lower_all(&cfg.tiers.strong),
                title_bonus: cfg.tier_bonus.strong_title,
                text_bonus: cfg.tier_bonus.strong_text,
            },
            Tier {
                words: lower_all(&cfg.tiers.medium),
                title_bonus: cfg.tier_bonus.medium_title,
                text_bonus: cfg.tier_bonus.medium_text,
            },
            Tier {
                words: lower_all(&cfg.tiers.weak),
                title_bonus: cfg.tier_bonus.weak_title,
                text_bonus: cfg.tier_bonus.weak_text,
            },
        ];

        let anchors = lower_all(&cfg.scoring.anchors);

        let trouble = cfg
            .scoring
            .trouble_patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}"))
                    .map_err(|e| anyhow::anyhow!("trouble pattern `{}` regex error: {}", p, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let topic_table = cfg
            .topic_keywords
            .iter()
            .map(|(k, v)| (normalize_key(k), lower_all(v)))
            .collect();

        Ok(Self {
            cfg,
            tiers,
            anchors,
            trouble,
            topic_table,
        })
    }

    /// Engine built from the compiled-in config. The shipped TOML is part of
    /// the crate, so this cannot fail at runtime.
    pub fn default_seed() -> Self {
        Self::from_toml_str(DEFAULT_SCORING_TOML).expect("built-in scoring config is valid")
    }

    pub fn selection(&self) -> &SelectionConfig {
        &self.cfg.selection
    }

    pub fn search(&self) -> &SearchTerms {
        &self.cfg.search
    }

    pub fn source_weights(&self) -> &SourceWeights {
        &self.cfg.source_weights
    }

    /// Educational-relevance score for one item. Pure and deterministic;
    /// may go negative, never clamped here.
    ///
    /// Order matters: keyword/topic/anchor bonuses accumulate additively,
    /// the source weight scales that subtotal, and the trouble/length
    /// adjustments land after the scaling, unweighted.
    pub fn score(&self, item: &ContentItem, topic: Option<&str>) -> f32 {
        let title = strip_markup(&item.title).to_lowercase();
        let description = strip_markup(&item.description).to_lowercase();
        let full_text = format!("{title} {description}");

        let mut score = self.cfg.scoring.base_score;

        // 1) Instructional-intent keyword tiers. A title hit outranks a
        //    description-only hit in every tier.
        for tier in &self.tiers {
            for word in &tier.words {
                if title.contains(word.as_str()) {
                    score += tier.title_bonus;
                } else if full_text.contains(word.as_str()) {
                    score += tier.text_bonus;
                }
            }
        }

        // 2) Topic signals: verbatim topic mention plus the topic's keyword
        //    list from the table (matched by normalized substring in either
        //    direction, so "Basic Introduction" still finds "introduction").
        if let Some(topic_raw) = topic {
            let topic_norm = normalize_key(topic_raw);
            if !topic_norm.is_empty() {
                if full_text.contains(&topic_norm) {
                    score += self.cfg.scoring.topic_exact_bonus;
                }
                for (key, words) in &self.topic_table {
                    if !(key.contains(&topic_norm) || topic_norm.contains(key.as_str())) {
                        continue;
                    }
                    for word in words {
                        if full_text.contains(word.as_str()) {
                            score += self.cfg.scoring.topic_keyword_bonus;
                        }
                    }
                }
            }
        }

        // 3) Anchor term. Mandatory signal, independent of topic: generic
        //    tutorial language about some other subject stays down.
        for anchor in &self.anchors {
            if title.contains(anchor.as_str()) {
                score += self.cfg.scoring.anchor_title_bonus;
            } else if description.contains(anchor.as_str()) {
                score += self.cfg.scoring.anchor_description_bonus;
            }
        }

        // 4) Source-type weight scales the accumulated subtotal.
        score *= self.cfg.source_weights.weight_for(item.source_type);

        // 5) Support-question markers in the title, per occurrence.
        for re in &self.trouble {
            let hits = re.find_iter(&title).count();
            if hits > 0 {
                score -= self.cfg.scoring.trouble_penalty * hits as f32;
            }
        }

        // 6) Description length as a depth proxy.
        let desc_len = description.chars().count();
        if desc_len < self.cfg.scoring.short_description_len {
            score -= self.cfg.scoring.short_description_penalty;
        } else if desc_len > self.cfg.scoring.long_description_len {
            score += self.cfg.scoring.long_description_bonus;
        }

        score
    }
}

fn lower_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// Clone-cheap handle sharing one engine across the router, the curator,
/// and the reload paths. A poisoned lock degrades to neutral output rather
/// than panicking a request task.
#[derive(Clone)]
pub struct ScoringHandle {
    inner: Arc<RwLock<ScoringEngine>>,
}

impl ScoringHandle {
    pub fn new(engine: ScoringEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn score(&self, item: &ContentItem, topic: Option<&str>) -> f32 {
        if let Ok(eng) = self.inner.read() {
            eng.score(item, topic)
        } else {
            0.0
        }
    }

    /// Run the full selection over a fetch result mapping.
    /// `max_total` falls back to the configured default when `None`.
    pub fn select(
        &self,
        results: &HashMap<SourceType, crate::content::SourceOutcome>,
        topic: Option<&str>,
        max_total: Option<usize>,
    ) -> Vec<ContentItem> {
        if let Ok(eng) = self.inner.read() {
            let cap = max_total.unwrap_or(eng.selection().max_total);
            crate::select::select_best(&eng, results, topic, cap)
        } else {
            Vec::new()
        }
    }

    pub fn search_terms(&self) -> SearchTerms {
        if let Ok(eng) = self.inner.read() {
            eng.search().clone()
        } else {
            ScoringEngine::default_seed().search().clone()
        }
    }

    pub fn replace(&self, engine: ScoringEngine) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = engine;
        }
    }

    /// Reload from a file and swap atomically. Used by the admin endpoint.
    pub fn reload_from(&self, path: &Path) -> anyhow::Result<()> {
        let engine = ScoringEngine::from_toml_file(path)?;
        self.replace(engine);
        Ok(())
    }
}

/// Resolve the scoring config path: env override, then the shipped default.
pub fn config_path() -> PathBuf {
    std::env::var(ENV_SCORING_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCORING_CONFIG_PATH))
}

/// Build the shared handle: file config when present, seed otherwise.
/// Never fails; a broken file is logged and the seed takes over.
pub fn bootstrap() -> ScoringHandle {
    let path = config_path();
    let engine = match ScoringEngine::from_toml_file(&path) {
        Ok(eng) => {
            info!(path = %path.display(), "scoring config loaded");
            eng
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "scoring config unavailable; using built-in seed");
            ScoringEngine::default_seed()
        }
    };
    ScoringHandle::new(engine)
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var("SCORING_HOT_RELOAD")
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("APP_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Start a simple polling watcher on `path` to hot-reload into `handle`.
/// Polls mtime every 2s. Uses only std, no external deps.
pub fn start_hot_reload_thread(handle: ScoringHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let changed = match last_mtime {
                        None => {
                            last_mtime = Some(mtime);
                            false
                        }
                        Some(prev) => mtime > prev,
                    };
                    if changed {
                        if let Ok(content) = fs::read_to_string(&path) {
                            match ScoringEngine::from_toml_str(&content) {
                                Ok(new_engine) => handle.replace(new_engine),
                                Err(e) => warn!(error = %e, "hot reload skipped: bad config"),
                            }
                        }
                        last_mtime = Some(mtime);
                    }
                }
                Err(_) => {
                    // File missing or unreadable; keep trying.
                }
            }
            thread::sleep(poll);
        }
    });
}

/* ----------------------------
Tests
---------------------------- */
