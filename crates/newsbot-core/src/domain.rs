/// A normalized article produced by the feed adapter.
///
/// The link is the article identity and the deduplication key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleRecord {
    pub link: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub category: String,
    /// Raw publication string as delivered by the feed (persisted as-is).
    pub published: String,
    /// Local display form, e.g. `3:05pm 10/18`. Empty when the feed has no date.
    pub published_display: String,
}

impl ArticleRecord {
    pub fn identity(&self) -> &str {
        &self.link
    }

    pub fn seen_record(&self) -> SeenRecord {
        SeenRecord {
            link: self.link.clone(),
            title: self.title.clone(),
            published_at: self.published.clone(),
        }
    }
}

/// Persisted history row; `link` is unique across all records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeenRecord {
    pub link: String,
    pub title: String,
    pub published_at: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    AlreadyPresent,
}

/// A named, size-bounded chunk of rendered text for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub category: String,
    /// 1 for the block carrying the visible heading, 2.. for continuations.
    pub part: usize,
    /// Accent color of the category, 0 when unset.
    pub color: u32,
    pub heading: String,
    pub body: String,
}

impl Block {
    pub fn is_continuation(&self) -> bool {
        self.part > 1
    }

    /// Heading + body, the amount a block contributes to its container.
    pub fn byte_len(&self) -> usize {
        self.heading.len() + self.body.len()
    }
}

/// One outbound message: a titled page holding an ordered run of blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageContainer {
    pub page: usize,
    pub title: String,
    pub description: String,
    pub color: u32,
    pub blocks: Vec<Block>,
}

impl MessageContainer {
    pub fn header_len(&self) -> usize {
        self.title.len() + self.description.len()
    }

    pub fn byte_len(&self) -> usize {
        self.header_len() + self.blocks.iter().map(Block::byte_len).sum::<usize>()
    }
}
