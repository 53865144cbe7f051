//! Category → feed table.
//!
//! The table is loaded once at startup and defines both the fan-out set of
//! the aggregator and the grouping key of the packer. Order is significant:
//! categories are packed (and feeds fetched) in the order listed.

use std::{collections::HashSet, fs, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{errors::Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub color: u32,
    pub feeds: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CategoryConfig {
    pub categories: Vec<Category>,
}

/// One (category, feed URL) pair of the fan-out set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSpec {
    pub category: String,
    pub url: String,
}

impl CategoryConfig {
    /// The stock AI-news table.
    pub fn builtin() -> Self {
        fn cat(name: &str, emoji: &str, color: u32, feeds: &[&str]) -> Category {
            Category {
                name: name.to_string(),
                emoji: emoji.to_string(),
                color,
                feeds: feeds.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            categories: vec![
                cat(
                    "Business & Industry News",
                    "💼",
                    0xF1C40F,
                    &[
                        "https://spectrum.ieee.org/feeds/topic/artificial-intelligence.rss",
                        "https://www.fastcompany.com/section/artificial-intelligence/rss",
                        "https://venturebeat.com/category/ai/feed/",
                        "https://news.crunchbase.com/sections/artificial-intelligence/feed/",
                        "https://aws.amazon.com/blogs/machine-learning/feed/",
                        "https://news.microsoft.com/source/topic/ai/feed/",
                    ],
                ),
                cat(
                    "General & Broad News",
                    "🌐",
                    0x3498DB,
                    &[
                        "https://www.technologyreview.com/feed/topic/artificial-intelligence",
                        "https://www.wired.com/feed/tag/ai/latest/rss",
                        "https://techcrunch.com/category/artificial-intelligence/feed/",
                        "https://www.geekwire.com/tag/ai/feed/",
                        "https://rss.nytimes.com/services/xml/rss/nyt/ArtificialIntelligence.xml",
                        "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
                        "https://arstechnica.com/ai/feed/",
                        "https://www.theguardian.com/technology/artificialintelligence/rss",
                    ],
                ),
                cat(
                    "Research & Technical News",
                    "🔬",
                    0xE74C3C,
                    &[
                        "https://openai.com/news/rss.xml",
                        "https://blog.google/technology/google-deepmind/rss/",
                    ],
                ),
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read categories file {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(input: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| Error::Config(format!("invalid categories file: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config("no categories configured".to_string()));
        }

        let mut names = HashSet::new();
        for c in &self.categories {
            let name = c.name.trim();
            if name.is_empty() {
                return Err(Error::Config("category with empty name".to_string()));
            }
            if !names.insert(name) {
                return Err(Error::Config(format!("duplicate category: {name}")));
            }
            for feed in &c.feeds {
                let url = Url::parse(feed)
                    .map_err(|e| Error::Config(format!("invalid feed url {feed}: {e}")))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(Error::Config(format!("unsupported feed scheme: {feed}")));
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Every (category, feed) pair in configured order.
    pub fn feed_specs(&self) -> Vec<FeedSpec> {
        self.categories
            .iter()
            .flat_map(|c| {
                c.feeds.iter().map(move |url| FeedSpec {
                    category: c.name.clone(),
                    url: url.clone(),
                })
            })
            .collect()
    }

    pub fn feed_count(&self) -> usize {
        self.categories.iter().map(|c| c.feeds.len()).sum()
    }
}
