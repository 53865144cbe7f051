//! Message paginator: accumulate blocks into size-bounded pages.

use chrono::NaiveDate;

use crate::{
    delivery::types::PageLimits,
    domain::{Block, MessageContainer},
};

/// Neutral accent used when a page's first category has no color.
pub const DEFAULT_PAGE_COLOR: u32 = 0x36393F;

pub const DEFAULT_DIGEST_TITLE: &str = "Daily AI News Summary";
pub const DEFAULT_INTRO: &str = "Here are the latest updates from the world of AI.";
pub const DEFAULT_CONTINUED: &str = "Additional stories continue below.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTemplate {
    pub title: String,
    /// Description of page 1.
    pub intro: String,
    /// Description of every later page.
    pub continued: String,
    pub color: u32,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_DIGEST_TITLE)
    }
}

impl PageTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            intro: DEFAULT_INTRO.to_string(),
            continued: DEFAULT_CONTINUED.to_string(),
            color: DEFAULT_PAGE_COLOR,
        }
    }

    fn open(&self, page: usize, run_date: NaiveDate) -> MessageContainer {
        let date = run_date.format("%Y-%m-%d");
        let (title, description) = if page == 1 {
            (format!("📰 {} - {date}", self.title), self.intro.clone())
        } else {
            (
                format!("📰 {} - {date} (Page {page})", self.title),
                self.continued.clone(),
            )
        };
        MessageContainer {
            page,
            title,
            description,
            color: self.color,
            blocks: Vec::new(),
        }
    }
}

/// Lay blocks out over as many pages as the limits require, in order.
///
/// A page is closed when the next block would push it past
/// `limits.container_max` or it already holds `limits.max_blocks` blocks.
/// Pages without blocks are never returned.
pub fn paginate(
    blocks: Vec<Block>,
    run_date: NaiveDate,
    template: &PageTemplate,
    limits: &PageLimits,
) -> Vec<MessageContainer> {
    let mut pages = Vec::new();
    let mut current = template.open(1, run_date);
    let mut running = current.header_len();

    for block in blocks {
        let over_size = running + block.byte_len() > limits.container_max;
        let over_count = current.blocks.len() >= limits.max_blocks;
        if !current.blocks.is_empty() && (over_size || over_count) {
            let next = template.open(current.page + 1, run_date);
            running = next.header_len();
            pages.push(std::mem::replace(&mut current, next));
        }

        if current.blocks.is_empty() && block.color != 0 {
            current.color = block.color;
        }
        running += block.byte_len();
        current.blocks.push(block);
    }

    if !current.blocks.is_empty() {
        pages.push(current);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn block(category: &str, part: usize, body_len: usize) -> Block {
        Block {
            category: category.to_string(),
            part,
            color: 0,
            heading: format!("**{category}**"),
            body: "b".repeat(body_len),
        }
    }

    #[test]
    fn no_blocks_no_pages() {
        let pages = paginate(vec![], date(), &PageTemplate::default(), &PageLimits::DISCORD);
        assert!(pages.is_empty());
    }

    #[test]
    fn first_page_header() {
        let pages = paginate(
            vec![block("A", 1, 10)],
            date(),
            &PageTemplate::default(),
            &PageLimits::DISCORD,
        );
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[0].title, "📰 Daily AI News Summary - 2026-10-18");
        assert_eq!(pages[0].description, DEFAULT_INTRO);
        assert_eq!(pages[0].color, DEFAULT_PAGE_COLOR);
    }

    #[test]
    fn pages_respect_ceiling_and_number_from_two() {
        let blocks: Vec<_> = (1..=20).map(|i| block("A", i, 1000)).collect();
        let limits = PageLimits::DISCORD;

        let pages = paginate(blocks, date(), &PageTemplate::default(), &limits);

        assert!(pages.len() >= 4);
        for (i, p) in pages.iter().enumerate() {
            assert_eq!(p.page, i + 1);
            assert!(p.byte_len() <= limits.container_max, "page {} is {}", p.page, p.byte_len());
            assert!(!p.blocks.is_empty());
            if p.page > 1 {
                assert!(p.title.ends_with(&format!("(Page {})", p.page)));
                assert_eq!(p.description, DEFAULT_CONTINUED);
            }
        }

        let parts: Vec<usize> = pages.iter().flat_map(|p| p.blocks.iter().map(|b| b.part)).collect();
        assert_eq!(parts, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn block_count_ceiling_opens_new_page() {
        let blocks: Vec<_> = (1..=30).map(|i| block("A", i, 5)).collect();

        let pages = paginate(blocks, date(), &PageTemplate::default(), &PageLimits::DISCORD);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), 25);
        assert_eq!(pages[1].blocks.len(), 5);
    }

    #[test]
    fn page_takes_accent_of_its_first_category() {
        let mut first = block("A", 1, 10);
        first.color = 0xF1C40F;
        let mut second = block("B", 1, 10);
        second.color = 0x3498DB;

        let pages = paginate(
            vec![first, second],
            date(),
            &PageTemplate::new("Digest"),
            &PageLimits::DISCORD,
        );

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].color, 0xF1C40F);
        assert_eq!(pages[0].title, "📰 Digest - 2026-10-18");
    }
}
