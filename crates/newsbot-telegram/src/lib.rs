//! Telegram adapter (teloxide).
//!
//! Implements the delivery port over the Bot API and hosts the command router
//! for on-demand digest runs.

use async_trait::async_trait;
use teloxide::{prelude::*, types::ParseMode};
use tokio::time::sleep;
use tracing::{debug, warn};

pub mod handlers;
pub mod router;

pub use teloxide::Bot;

use newsbot_core::{
    delivery::{
        port::DeliveryPort,
        progress::ProgressSink,
        types::{DeliveryCapabilities, PageLimits, RenderStyle},
    },
    domain::MessageContainer,
    errors::Error,
    formatting::{escape_html, strip_tags, trim_end_in_place, truncate_with_ellipsis},
    Result,
};

/// Telegram's cap on one message, in characters after entity parsing.
pub const MESSAGE_MAX_CHARS: usize = 4096;

/// Render one page as a Telegram HTML message.
///
/// Block headings and bodies are already HTML; continuation markers are
/// dropped since Telegram has no field layout to keep aligned. A body over
/// the block ceiling (a single oversize entry) is flattened to plain text and
/// clipped, so the page stays under `MESSAGE_MAX_CHARS`.
pub fn render_container_html(container: &MessageContainer) -> String {
    let mut out = format!(
        "<b>{}</b>\n<i>{}</i>\n\n",
        escape_html(&container.title),
        escape_html(&container.description)
    );
    for block in &container.blocks {
        if !block.is_continuation() {
            out.push_str(&block.heading);
            out.push('\n');
        }
        out.push_str(&fit_body(&block.body));
        out.push_str("\n\n");
    }
    trim_end_in_place(&mut out);
    out
}

fn fit_body(body: &str) -> String {
    let max = PageLimits::TELEGRAM.block_max;
    if body.chars().count() <= max {
        return body.to_string();
    }
    escape_html(&truncate_with_ellipsis(&strip_tags(body), max))
}

#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramDelivery {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    debug!(wait_ms = d.as_millis() as u64, "telegram asked to retry later");
                    sleep(d).await;
                }
                Err(e) => return Err(Error::Delivery(format!("telegram error: {e}"))),
            }
        }
    }
}

#[async_trait]
impl DeliveryPort for TelegramDelivery {
    fn capabilities(&self) -> DeliveryCapabilities {
        DeliveryCapabilities {
            style: RenderStyle::Html,
            limits: PageLimits::TELEGRAM,
        }
    }

    async fn send(&self, container: &MessageContainer) -> Result<()> {
        let html = render_container_html(container);
        if html.chars().count() > MESSAGE_MAX_CHARS {
            // Oversize header: plain text can be clipped safely, HTML cannot.
            warn!(page = container.page, "page over telegram cap, sending as plain text");
            let text = truncate_with_ellipsis(&strip_tags(&html), MESSAGE_MAX_CHARS);
            self.with_retry(|| {
                self.bot
                    .send_message(self.chat_id, text.clone())
                    .disable_web_page_preview(true)
            })
            .await?;
            return Ok(());
        }

        self.with_retry(|| {
            self.bot
                .send_message(self.chat_id, html.clone())
                .parse_mode(ParseMode::Html)
                .disable_web_page_preview(true)
        })
        .await?;
        Ok(())
    }
}

/// Echoes cycle progress into the chat that asked for the run.
pub struct ChatProgress {
    bot: Bot,
    chat_id: ChatId,
}

impl ChatProgress {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ProgressSink for ChatProgress {
    async fn report(&self, text: &str) {
        if let Err(e) = self.bot.send_message(self.chat_id, text.to_string()).await {
            debug!("progress echo failed: {e}");
        }
    }
}
