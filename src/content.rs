// src/content.rs
//! Normalized shapes shared across the fetch → score → select pipeline.
//!
//! Every backend response is mapped into `ContentItem` by its provider, so
//! the scorer and selector never see backend-specific payloads.

use serde::{Deserialize, Serialize};

/// Closed set of content backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Blog,
    WebDocument,
    News,
    Video,
}

impl SourceType {
    /// Fixed enumeration order; also the tie-break order the selector walks.
    pub const ALL: [SourceType; 4] = [
        SourceType::Blog,
        SourceType::WebDocument,
        SourceType::News,
        SourceType::Video,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Blog => "blog",
            SourceType::WebDocument => "web_document",
            SourceType::News => "news",
            SourceType::Video => "video",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized search/video/news result.
///
/// `title` and `description` may still carry backend highlight markup
/// (e.g. `<b>` wrappers); it is stripped before scoring and display.
/// `link` doubles as the identity used for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub source_type: SourceType,
    // Provenance, display-only. Never scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ContentItem {
    /// Bare item with only the scored fields set; provenance stays empty.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            source_type,
            blog_name: None,
            channel_name: None,
            published_at: None,
            thumbnail: None,
        }
    }
}

/// Successful adapter response: the mapped items plus the backend's total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<ContentItem>,
    pub total: usize,
}

impl SearchPage {
    pub fn from_items(items: Vec<ContentItem>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Outcome of one source fetch. Errors are values, not panics, so a failed
/// source travels through the result mapping next to successful ones.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Page(SearchPage),
    Error(String),
}

impl SourceOutcome {
    pub fn page(&self) -> Option<&SearchPage> {
        match self {
            SourceOutcome::Page(p) => Some(p),
            SourceOutcome::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SourceOutcome::Error(_))
    }
}

/// A named unit of instructional content materials are gathered for.
/// Supplied by the caller; never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub localized_name: String,
    #[serde(default)]
    pub description: String,
}

impl Topic {
    pub fn new(name: impl Into<String>, localized_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            localized_name: localized_name.into(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_serde_names_are_snake_case() {
        let s = serde_json::to_string(&SourceType::WebDocument).unwrap();
        assert_eq!(s, "\"web_document\"");
        let back: SourceType = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(back, SourceType::Video);
    }

    #[test]
    fn content_item_roundtrips_without_empty_provenance() {
        let item = ContentItem::new("t", "d", "https://example.com/a", SourceType::Blog);
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("channel_name"));
        let back: ContentItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn outcome_accessors() {
        let ok = SourceOutcome::Page(SearchPage::from_items(vec![]));
        assert!(ok.page().is_some());
        assert!(!ok.is_error());
        let err = SourceOutcome::Error("backend down".into());
        assert!(err.page().is_none());
        assert!(err.is_error());
    }
}
