//! Concurrent fan-out over every configured feed, fan-in, dedupe.

use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::{sync::Semaphore, time::timeout};
use tracing::{info, warn};

use crate::{
    categories::{CategoryConfig, FeedSpec},
    domain::ArticleRecord,
    feed::FeedSource,
};

pub const DEFAULT_MAX_CONCURRENT: usize = 10;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// A source that contributed nothing this cycle, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFailure {
    pub category: String,
    pub url: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default)]
pub struct FetchBatch {
    /// New articles, deduplicated, in (category, feed, entry) order.
    pub articles: Vec<ArticleRecord>,
    pub failures: Vec<SourceFailure>,
    pub sources: usize,
}

pub struct Aggregator {
    source: Arc<FeedSource>,
    max_concurrent: usize,
    source_timeout: Duration,
}

impl Aggregator {
    pub fn new(source: Arc<FeedSource>) -> Self {
        Self {
            source,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_limits(mut self, max_concurrent: usize, source_timeout: Duration) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self.source_timeout = source_timeout;
        self
    }

    /// Fetch every (category, feed) pair and wait for all of them.
    ///
    /// At most `max_concurrent` fetches are in flight. A failing or slow source
    /// is recorded in `failures` and contributes no articles.
    pub async fn fetch_all(&self, categories: &CategoryConfig) -> FetchBatch {
        let specs = categories.feed_specs();
        let semaphore = Semaphore::new(self.max_concurrent);

        let jobs = specs.iter().map(|spec| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Err("worker pool closed".to_string());
                };
                match timeout(self.source_timeout, self.source.fetch(spec)).await {
                    Ok(Ok(articles)) => Ok(articles),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!(
                        "timed out after {}s",
                        self.source_timeout.as_secs_f32()
                    )),
                }
            }
        });

        // join_all yields results in input order regardless of completion order.
        let results = join_all(jobs).await;

        let mut per_source = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (spec, res) in specs.iter().zip(results) {
            match res {
                Ok(articles) => per_source.push(articles),
                Err(reason) => {
                    warn!(feed = %spec.url, category = %spec.category, "feed failed: {reason}");
                    failures.push(failure(spec, reason));
                }
            }
        }

        let articles = flatten_unique(per_source);
        info!(
            sources = specs.len(),
            failed = failures.len(),
            articles = articles.len(),
            "feeds aggregated"
        );

        FetchBatch {
            articles,
            failures,
            sources: specs.len(),
        }
    }
}

fn failure(spec: &FeedSpec, reason: String) -> SourceFailure {
    SourceFailure {
        category: spec.category.clone(),
        url: spec.url.clone(),
        reason,
    }
}

/// Flatten per-source results, keeping the first record of every link.
pub fn flatten_unique(per_source: Vec<Vec<ArticleRecord>>) -> Vec<ArticleRecord> {
    let mut seen = HashSet::new();
    per_source
        .into_iter()
        .flatten()
        .filter(|a| seen.insert(a.link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        categories::Category,
        errors::Error,
        feed::{FeedEntry, FeedParser, ParsedFeed},
        store::MemorySeenStore,
        Result,
    };
    use async_trait::async_trait;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    /// Serves canned feeds by URL; unknown URLs fail.
    #[derive(Default)]
    struct FakeParser {
        feeds: HashMap<String, Vec<String>>,
        delay: Duration,
        slow_url: Option<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeParser {
        fn with_feed(mut self, url: &str, links: &[&str]) -> Self {
            self.feeds
                .insert(url.to_string(), links.iter().map(|s| s.to_string()).collect());
            self
        }
    }

    #[async_trait]
    impl FeedParser for FakeParser {
        async fn parse(&self, url: &str) -> Result<ParsedFeed> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if self.slow_url.as_deref() == Some(url) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            } else if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let Some(links) = self.feeds.get(url) else {
                return Err(Error::feed(url, "simulated parse failure"));
            };
            Ok(ParsedFeed {
                title: Some(format!("Feed {url}")),
                entries: links
                    .iter()
                    .map(|l| FeedEntry {
                        link: Some(l.clone()),
                        title: Some(l.clone()),
                        ..FeedEntry::default()
                    })
                    .collect(),
            })
        }
    }

    fn categories(specs: Vec<(&str, Vec<&str>)>) -> CategoryConfig {
        CategoryConfig {
            categories: specs
                .into_iter()
                .map(|(name, feeds)| Category {
                    name: name.to_string(),
                    emoji: String::new(),
                    color: 0,
                    feeds: feeds.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn aggregator(parser: Arc<FakeParser>, store: Arc<MemorySeenStore>) -> Aggregator {
        Aggregator::new(Arc::new(FeedSource::new(parser, store)))
    }

    #[tokio::test]
    async fn same_article_in_two_feeds_is_kept_once() {
        let parser = Arc::new(
            FakeParser::default()
                .with_feed("https://one.example/rss", &["https://x.example/a", "https://x.example/b"])
                .with_feed("https://two.example/rss", &["https://x.example/b", "https://x.example/c"]),
        );
        let cfg = categories(vec![
            ("One", vec!["https://one.example/rss"]),
            ("Two", vec!["https://two.example/rss"]),
        ]);

        let batch = aggregator(parser, Arc::new(MemorySeenStore::new()))
            .fetch_all(&cfg)
            .await;

        let links: Vec<_> = batch.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://x.example/a", "https://x.example/b", "https://x.example/c"]
        );
        // first occurrence wins, so b stays in category One
        assert_eq!(batch.articles[1].category, "One");
    }

    #[tokio::test]
    async fn seen_links_never_come_back() {
        let parser = Arc::new(FakeParser::default().with_feed(
            "https://one.example/rss",
            &["https://x.example/old", "https://x.example/new"],
        ));
        let store = Arc::new(MemorySeenStore::with_links(["https://x.example/old"]));
        let cfg = categories(vec![("One", vec!["https://one.example/rss"])]);

        let batch = aggregator(parser, store).fetch_all(&cfg).await;

        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.articles[0].link, "https://x.example/new");
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let parser = Arc::new(
            FakeParser::default().with_feed("https://ok.example/rss", &["https://x.example/1"]),
        );
        let cfg = categories(vec![(
            "One",
            vec!["https://broken.example/rss", "https://ok.example/rss"],
        )]);

        let batch = aggregator(parser, Arc::new(MemorySeenStore::new()))
            .fetch_all(&cfg)
            .await;

        assert_eq!(batch.sources, 2);
        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].url, "https://broken.example/rss");
        assert!(batch.failures[0].reason.contains("simulated parse failure"));
    }

    #[tokio::test]
    async fn slow_source_times_out_without_blocking_others() {
        let mut parser = FakeParser::default()
            .with_feed("https://slow.example/rss", &["https://x.example/slow"])
            .with_feed("https://fast.example/rss", &["https://x.example/fast"]);
        parser.slow_url = Some("https://slow.example/rss".to_string());
        let cfg = categories(vec![(
            "One",
            vec!["https://slow.example/rss", "https://fast.example/rss"],
        )]);

        let batch = aggregator(Arc::new(parser), Arc::new(MemorySeenStore::new()))
            .with_limits(10, Duration::from_millis(50))
            .fetch_all(&cfg)
            .await;

        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.articles[0].link, "https://x.example/fast");
        assert!(batch.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn fan_out_respects_worker_ceiling() {
        let mut parser = FakeParser::default();
        let mut feeds = Vec::new();
        for i in 0..12 {
            let url = format!("https://f{i}.example/rss");
            parser = parser.with_feed(&url, &[]);
            feeds.push(url);
        }
        parser.delay = Duration::from_millis(20);
        let parser = Arc::new(parser);

        let feed_refs: Vec<&str> = feeds.iter().map(|s| s.as_str()).collect();
        let cfg = categories(vec![("One", feed_refs)]);

        let batch = aggregator(parser.clone(), Arc::new(MemorySeenStore::new()))
            .with_limits(3, Duration::from_secs(5))
            .fetch_all(&cfg)
            .await;

        assert_eq!(batch.sources, 12);
        assert!(batch.failures.is_empty());
        let peak = parser.max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak}");
        assert!(peak >= 2, "fetches should overlap, peak {peak}");
    }
}
