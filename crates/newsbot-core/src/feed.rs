//! Feed source boundary + the per-feed adapter.
//!
//! `FeedParser` is the black box that turns a URL into loosely structured
//! entries (implemented over HTTP + feed-rs in `newsbot-feeds`). `FeedSource`
//! resolves those entries into `ArticleRecord`s once, at this boundary.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tracing::debug;

use crate::{
    categories::FeedSpec,
    domain::ArticleRecord,
    formatting::{format_display_time, strip_tags, truncate_with_ellipsis},
    store::SeenStore,
    Result,
};

/// Only the newest entries of each feed are considered per cycle.
pub const DEFAULT_MAX_ENTRIES: usize = 10;
/// Display length (in characters) of a stored summary, ellipsis included.
pub const SUMMARY_MAX_CHARS: usize = 150;

const UNKNOWN_SOURCE: &str = "Unknown Source";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// One raw feed entry; every field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FeedParser: Send + Sync {
    async fn parse(&self, url: &str) -> Result<ParsedFeed>;
}

/// Adapter around one `FeedParser` call.
pub struct FeedSource {
    parser: Arc<dyn FeedParser>,
    store: Arc<dyn SeenStore>,
    max_entries: usize,
}

impl FeedSource {
    pub fn new(parser: Arc<dyn FeedParser>, store: Arc<dyn SeenStore>) -> Self {
        Self {
            parser,
            store,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Fetch one feed and return its unseen articles in feed order.
    ///
    /// Errors are returned as values; the aggregator turns them into an empty
    /// contribution for this source.
    pub async fn fetch(&self, spec: &FeedSpec) -> Result<Vec<ArticleRecord>> {
        let feed = self.parser.parse(&spec.url).await?;
        let source = source_alias(feed.title.as_deref().unwrap_or(UNKNOWN_SOURCE));

        let mut out = Vec::new();
        for entry in feed.entries.into_iter().take(self.max_entries) {
            let Some(link) = entry.link.clone().and_then(non_blank) else {
                debug!(feed = %spec.url, "skipping entry without link");
                continue;
            };

            if self.store.is_seen(&link).await? {
                continue;
            }

            out.push(build_record(link, entry, &source, &spec.category));
        }

        debug!(feed = %spec.url, new = out.len(), "feed parsed");
        Ok(out)
    }
}

fn build_record(link: String, entry: FeedEntry, source: &str, category: &str) -> ArticleRecord {
    let title = entry
        .title
        .and_then(non_blank)
        .map(|t| strip_tags(&t))
        .unwrap_or_else(|| "Untitled".to_string());

    // summary, else description, else nothing
    let raw_summary = entry
        .summary
        .and_then(non_blank)
        .or_else(|| entry.description.and_then(non_blank))
        .unwrap_or_default();
    let summary = truncate_with_ellipsis(&strip_tags(&raw_summary), SUMMARY_MAX_CHARS);

    let published_display = entry
        .published_at
        .or(entry.updated_at)
        .map(|dt| format_display_time(&dt.with_timezone(&Local)))
        .unwrap_or_default();

    ArticleRecord {
        link,
        title,
        summary,
        source: source.to_string(),
        category: category.to_string(),
        published: entry.published.unwrap_or_default(),
        published_display,
    }
}

/// Short display names for feeds whose titles are long.
pub fn source_alias(feed_title: &str) -> String {
    const ALIASES: &[(&str, &str)] = &[
        ("Wired", "Wired"),
        ("Technology Review", "MIT Tech Review"),
        ("TechCrunch", "TechCrunch"),
        ("New York Times", "NYT"),
    ];

    ALIASES
        .iter()
        .find(|(needle, _)| feed_title.contains(needle))
        .map(|(_, alias)| alias.to_string())
        .unwrap_or_else(|| feed_title.to_string())
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::Error, store::MemorySeenStore};

    struct StaticParser(ParsedFeed);

    #[async_trait]
    impl FeedParser for StaticParser {
        async fn parse(&self, _url: &str) -> Result<ParsedFeed> {
            Ok(self.0.clone())
        }
    }

    struct FailingParser;

    #[async_trait]
    impl FeedParser for FailingParser {
        async fn parse(&self, url: &str) -> Result<ParsedFeed> {
            Err(Error::feed(url, "connection refused"))
        }
    }

    fn entry(link: &str) -> FeedEntry {
        FeedEntry {
            link: Some(link.to_string()),
            title: Some(format!("title of {link}")),
            ..FeedEntry::default()
        }
    }

    fn spec() -> FeedSpec {
        FeedSpec {
            category: "Research".to_string(),
            url: "https://feed.example/rss".to_string(),
        }
    }

    #[tokio::test]
    async fn skips_seen_entries_and_caps_entry_count() {
        let entries = (0..15).map(|i| entry(&format!("https://a.example/{i}"))).collect();
        let parser = Arc::new(StaticParser(ParsedFeed {
            title: Some("Example".to_string()),
            entries,
        }));
        let store = Arc::new(MemorySeenStore::with_links(["https://a.example/1"]));

        let out = FeedSource::new(parser, store).fetch(&spec()).await.unwrap();

        // 10 newest considered, one of them already seen.
        assert_eq!(out.len(), 9);
        assert!(out.iter().all(|a| a.link != "https://a.example/1"));
        assert!(out.iter().all(|a| a.link != "https://a.example/12"));
        assert_eq!(out[0].link, "https://a.example/0");
        assert_eq!(out[0].category, "Research");
        assert_eq!(out[0].source, "Example");
    }

    #[tokio::test]
    async fn summary_prefers_summary_then_description() {
        let mut with_summary = entry("https://a.example/s");
        with_summary.summary = Some("<p>Primary</p>".to_string());
        with_summary.description = Some("Secondary".to_string());

        let mut with_description = entry("https://a.example/d");
        with_description.summary = Some("   ".to_string());
        with_description.description = Some("<i>Secondary</i>".to_string());

        let mut long = entry("https://a.example/l");
        long.summary = Some("x".repeat(400));

        let bare = FeedEntry {
            link: Some("https://a.example/bare".to_string()),
            ..FeedEntry::default()
        };

        let parser = Arc::new(StaticParser(ParsedFeed {
            title: None,
            entries: vec![with_summary, with_description, long, bare],
        }));
        let out = FeedSource::new(parser, Arc::new(MemorySeenStore::new()))
            .fetch(&spec())
            .await
            .unwrap();

        assert_eq!(out[0].summary, "Primary");
        assert_eq!(out[1].summary, "Secondary");
        assert_eq!(out[2].summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(out[2].summary.ends_with("..."));
        assert_eq!(out[3].summary, "");
        assert_eq!(out[3].title, "Untitled");
        assert_eq!(out[3].published_display, "");
        assert_eq!(out[3].source, UNKNOWN_SOURCE);
    }

    #[tokio::test]
    async fn timestamp_falls_back_to_updated() {
        let mut e = entry("https://a.example/t");
        e.updated_at = Some(Utc::now());
        let parser = Arc::new(StaticParser(ParsedFeed {
            title: None,
            entries: vec![e],
        }));
        let out = FeedSource::new(parser, Arc::new(MemorySeenStore::new()))
            .fetch(&spec())
            .await
            .unwrap();
        assert!(!out[0].published_display.is_empty());
        assert_eq!(out[0].published, "");
    }

    #[tokio::test]
    async fn entries_without_link_are_skipped() {
        let parser = Arc::new(StaticParser(ParsedFeed {
            title: None,
            entries: vec![
                FeedEntry {
                    title: Some("no link".to_string()),
                    ..FeedEntry::default()
                },
                entry("https://a.example/ok"),
            ],
        }));
        let out = FeedSource::new(parser, Arc::new(MemorySeenStore::new()))
            .fetch(&spec())
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn parser_errors_are_returned_not_panicked() {
        let src = FeedSource::new(Arc::new(FailingParser), Arc::new(MemorySeenStore::new()));
        let err = src.fetch(&spec()).await.unwrap_err();
        assert!(matches!(err, Error::Feed { .. }));
    }

    #[test]
    fn aliases_long_source_names() {
        assert_eq!(source_alias("AI | MIT Technology Review"), "MIT Tech Review");
        assert_eq!(source_alias("AI Latest | Wired"), "Wired");
        assert_eq!(source_alias("AI News | TechCrunch"), "TechCrunch");
        assert_eq!(source_alias("Artificial Intelligence - The New York Times"), "NYT");
        assert_eq!(source_alias("Ars Technica"), "Ars Technica");
    }
}
