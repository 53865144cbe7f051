/// How a backend wants article text marked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStyle {
    /// Discord embed Markdown: `**bold**`, `[label](url)`, `*italic*`.
    Markdown,
    /// Telegram HTML parse mode: `<b>`, `<a href>`, `<i>`.
    Html,
}

/// Size ceilings the packer and paginator must respect for one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    /// Max bytes of one block body.
    pub block_max: usize,
    /// Max bytes of one page: title + description + every heading and body.
    pub container_max: usize,
    /// Max blocks in one page.
    pub max_blocks: usize,
}

impl PageLimits {
    /// Discord embeds: 1024 per field value, 6000 per embed (kept at 5500 for
    /// headroom), 25 fields.
    pub const DISCORD: Self = Self {
        block_max: 1024,
        container_max: 5500,
        max_blocks: 25,
    };

    /// Telegram messages cap at 4096 characters after entity parsing.
    pub const TELEGRAM: Self = Self {
        block_max: 1024,
        container_max: 3800,
        max_blocks: 25,
    };
}

/// Capabilities / rendering constraints of a delivery implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryCapabilities {
    pub style: RenderStyle,
    pub limits: PageLimits,
}
