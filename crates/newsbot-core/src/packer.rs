//! Category packer: group articles by category, render them, and pack the
//! rendered entries into size-bounded blocks.

use tracing::debug;

use crate::{
    categories::CategoryConfig,
    delivery::types::{PageLimits, RenderStyle},
    domain::{ArticleRecord, Block},
    formatting::{clip, escape_html, escape_link_label, trim_end_in_place},
};

/// Characters of summary shown per entry before `...`.
pub const ENTRY_SUMMARY_CHARS: usize = 120;

/// Heading of continuation blocks. Renders as nothing, so each category shows
/// one visible heading however many blocks it spans.
pub const CONTINUATION_HEADING: &str = "\u{200B}";

/// Articles of one category, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryGroup {
    pub name: String,
    pub emoji: String,
    pub color: u32,
    pub articles: Vec<ArticleRecord>,
}

/// Group articles in configured category order.
///
/// Articles whose category is not configured are dropped; categories with no
/// articles are omitted.
pub fn group_by_category(config: &CategoryConfig, articles: Vec<ArticleRecord>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = config
        .categories
        .iter()
        .map(|c| CategoryGroup {
            name: c.name.clone(),
            emoji: c.emoji.clone(),
            color: c.color,
            articles: Vec::new(),
        })
        .collect();

    for article in articles {
        match groups.iter_mut().find(|g| g.name == article.category) {
            Some(group) => group.articles.push(article),
            None => debug!(category = %article.category, link = %article.link, "dropping article of unknown category"),
        }
    }

    groups.retain(|g| !g.articles.is_empty());
    groups
}

pub fn render_heading(group: &CategoryGroup, style: RenderStyle) -> String {
    let name = match style {
        RenderStyle::Markdown => format!("**{}**", group.name),
        RenderStyle::Html => format!("<b>{}</b>", escape_html(&group.name)),
    };
    if group.emoji.is_empty() {
        name
    } else {
        format!("{} {name}", group.emoji)
    }
}

/// Render one article entry, including its trailing blank line.
pub fn render_entry(article: &ArticleRecord, style: RenderStyle) -> String {
    let summary = clip(&article.summary, ENTRY_SUMMARY_CHARS);
    let byline = if article.published_display.is_empty() {
        article.source.clone()
    } else {
        format!("{} • {}", article.source, article.published_display)
    };

    let mut out = match style {
        RenderStyle::Markdown => format!(
            "• **[{}]({})**\n",
            escape_link_label(&article.title),
            article.link
        ),
        RenderStyle::Html => format!(
            "• <b><a href=\"{}\">{}</a></b>\n",
            escape_html(&article.link),
            escape_html(&article.title)
        ),
    };

    if !summary.is_empty() {
        match style {
            RenderStyle::Markdown => out.push_str(&summary),
            RenderStyle::Html => out.push_str(&escape_html(&summary)),
        }
        out.push('\n');
    }

    match style {
        RenderStyle::Markdown => out.push_str(&format!("*{byline}*")),
        RenderStyle::Html => out.push_str(&format!("<i>{}</i>", escape_html(&byline))),
    }
    out.push_str("\n\n");
    out
}

/// Pack every group into blocks no larger than `limits.block_max`.
///
/// A single entry larger than the ceiling still gets a block of its own.
pub fn pack(groups: &[CategoryGroup], style: RenderStyle, limits: &PageLimits) -> Vec<Block> {
    let mut blocks = Vec::new();

    for group in groups {
        let heading = render_heading(group, style);
        let mut part = 1;
        let mut body = String::new();

        for article in &group.articles {
            let entry = render_entry(article, style);
            if !body.is_empty() && body.len() + entry.len() > limits.block_max {
                blocks.push(close_block(group, part, &heading, &mut body));
                part += 1;
            }
            body.push_str(&entry);
        }

        if !body.is_empty() {
            blocks.push(close_block(group, part, &heading, &mut body));
        }
    }

    blocks
}

fn close_block(group: &CategoryGroup, part: usize, heading: &str, body: &mut String) -> Block {
    trim_end_in_place(body);
    Block {
        category: group.name.clone(),
        part,
        color: group.color,
        heading: if part == 1 {
            heading.to_string()
        } else {
            CONTINUATION_HEADING.to_string()
        },
        body: std::mem::take(body),
    }
}
