// src/select.rs
//! Diversified selection: pure ranking logic over fetched result mappings.
//! No I/O, suitable for unit tests and offline tuning runs.
//!
//! Policy: global score ranking with per-source-type caps and a score floor;
//! when the floored walk keeps too few items, a relaxation pass refills up to
//! the minimum while still honoring caps, the total bound, and link dedup.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::content::{ContentItem, SourceOutcome, SourceType};
use crate::scoring::ScoringEngine;

/// Rank all non-error results and pick a bounded, diversified subset.
///
/// Ties keep enumeration order (sources in `SourceType::ALL` order, items in
/// backend order within a source); the stable sort has no secondary key.
pub fn select_best(
    engine: &ScoringEngine,
    results: &HashMap<SourceType, SourceOutcome>,
    topic: Option<&str>,
    max_total: usize,
) -> Vec<ContentItem> {
    // 1) Flatten non-error outcomes into (score, item) pairs.
    let mut scored: Vec<(f32, &ContentItem)> = Vec::new();
    for source in SourceType::ALL {
        let Some(outcome) = results.get(&source) else {
            continue;
        };
        match outcome {
            SourceOutcome::Error(e) => {
                warn!(source = %source, error = %e, "skipping errored source");
            }
            SourceOutcome::Page(page) if page.items.is_empty() => {
                warn!(source = %source, "skipping source with empty result set");
            }
            SourceOutcome::Page(page) => {
                for item in &page.items {
                    let score = engine.score(item, topic);
                    debug!(source = %source, score, title = %item.title, "scored candidate");
                    scored.push((score, item));
                }
            }
        }
    }

    if scored.is_empty() {
        return Vec::new();
    }

    // 2) Stable sort by score descending; equal scores keep their order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let policy = engine.selection();
    let floor = policy.score_floor;

    // 3) Capped, floored walk with dedup-by-link from the start.
    let mut selected: Vec<ContentItem> = Vec::new();
    let mut seen_links: HashSet<&str> = HashSet::new();
    let mut per_source: HashMap<SourceType, usize> = HashMap::new();

    for (score, item) in &scored {
        if selected.len() >= max_total {
            break;
        }
        if seen_links.contains(item.link.as_str()) {
            continue;
        }
        let used = per_source.get(&item.source_type).copied().unwrap_or(0);
        if used >= policy.cap_for(item.source_type) {
            continue;
        }
        if *score < floor {
            debug!(score, title = %item.title, "below score floor, skipped");
            continue;
        }
        seen_links.insert(item.link.as_str());
        *per_source.entry(item.source_type).or_insert(0) += 1;
        selected.push((*item).clone());
    }

    // 4) Relaxation: too few survivors → refill ignoring the floor only.
    //    Caps, the total bound, and dedup still hold.
    if selected.len() < policy.min_keep {
        for (_score, item) in &scored {
            if selected.len() >= policy.min_keep || selected.len() >= max_total {
                break;
            }
            if seen_links.contains(item.link.as_str()) {
                continue;
            }
            let used = per_source.get(&item.source_type).copied().unwrap_or(0);
            if used >= policy.cap_for(item.source_type) {
                continue;
            }
            seen_links.insert(item.link.as_str());
            *per_source.entry(item.source_type).or_insert(0) += 1;
            selected.push((*item).clone());
        }
        if selected.len() < policy.min_keep {
            debug!(
                kept = selected.len(),
                "relaxation exhausted candidates before reaching the minimum"
            );
        }
    }

    selected
}
