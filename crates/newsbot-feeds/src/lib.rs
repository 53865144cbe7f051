//! HTTP + feed-rs implementation of the feed port.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::{
    model::{Entry, Link},
    parser,
};
use tracing::debug;

use newsbot_core::{
    errors::Error,
    feed::{FeedEntry, FeedParser, ParsedFeed},
    Result,
};

/// Fetches a feed over HTTP and parses RSS, Atom or JSON Feed bodies.
#[derive(Clone, Debug)]
pub struct HttpFeedParser {
    http: reqwest::Client,
}

impl HttpFeedParser {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl FeedParser for HttpFeedParser {
    async fn parse(&self, url: &str) -> Result<ParsedFeed> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::feed(url, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::feed(url, format!("http status {}", resp.status())));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::feed(url, format!("reading body failed: {e}")))?;
        debug!(feed = %url, bytes = body.len(), "feed downloaded");

        parse_document(&body).map_err(|reason| Error::feed(url, reason))
    }
}

/// Parse a downloaded feed document.
pub fn parse_document(body: &[u8]) -> std::result::Result<ParsedFeed, String> {
    let feed = parser::parse(body).map_err(|e| format!("unparseable feed: {e}"))?;

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content),
        entries: feed.entries.into_iter().map(entry_of).collect(),
    })
}

fn entry_of(entry: Entry) -> FeedEntry {
    let published_at = entry.published.map(|d| d.with_timezone(&Utc));
    FeedEntry {
        link: article_link(&entry.links),
        title: entry.title.map(|t| t.content),
        summary: entry.summary.map(|s| s.content),
        description: entry.content.and_then(|c| c.body),
        published: published_at.map(|d| d.to_rfc3339()),
        published_at,
        updated_at: entry.updated.map(|d| d.with_timezone(&Utc)),
    }
}

/// The entry's page link: first `alternate` (or unlabelled) link, else the
/// first link of any kind. Atom feeds often list `replies`/`edit`/`self` first.
fn article_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}
