//! Discord adapter (REST, bot token).
//!
//! Each page becomes one message carrying a single embed: page title and
//! description, accent color, one field per block.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;

use newsbot_core::{
    delivery::{
        port::DeliveryPort,
        types::{DeliveryCapabilities, PageLimits, RenderStyle},
    },
    domain::MessageContainer,
    errors::Error,
    formatting::truncate_with_ellipsis,
    Result,
};

const API_BASE: &str = "https://discord.com/api/v10";
/// Hard Discord cap on an embed field value, in characters.
const FIELD_VALUE_MAX: usize = 1024;

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MessagePayload {
    pub embeds: Vec<Embed>,
}

#[derive(Deserialize)]
struct RateLimited {
    retry_after: f64,
}

/// Build the create-message body for one page.
pub fn embed_payload(container: &MessageContainer) -> MessagePayload {
    let fields = container
        .blocks
        .iter()
        .map(|b| EmbedField {
            name: b.heading.clone(),
            value: truncate_with_ellipsis(&b.body, FIELD_VALUE_MAX),
            inline: false,
        })
        .collect();

    MessagePayload {
        embeds: vec![Embed {
            title: container.title.clone(),
            description: container.description.clone(),
            color: container.color,
            fields,
        }],
    }
}

#[derive(Clone, Debug)]
pub struct DiscordDelivery {
    token: String,
    channel_id: u64,
    http: reqwest::Client,
}

impl DiscordDelivery {
    pub fn new(token: impl Into<String>, channel_id: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            token: token.into(),
            channel_id,
            http,
        })
    }

    fn messages_url(&self) -> String {
        format!("{API_BASE}/channels/{}/messages", self.channel_id)
    }

    async fn post(&self, payload: &MessagePayload) -> Result<reqwest::Response> {
        self.http
            .post(self.messages_url())
            .header("Authorization", format!("Bot {}", self.token))
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("discord request error: {e}")))
    }
}

#[async_trait]
impl DeliveryPort for DiscordDelivery {
    fn capabilities(&self) -> DeliveryCapabilities {
        DeliveryCapabilities {
            style: RenderStyle::Markdown,
            limits: PageLimits::DISCORD,
        }
    }

    async fn send(&self, container: &MessageContainer) -> Result<()> {
        const MAX_RETRIES: usize = 1;
        let payload = embed_payload(container);
        let mut attempts = 0usize;

        loop {
            let resp = self.post(&payload).await?;
            let status = resp.status();
            if status.is_success() {
                return Ok(());
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempts < MAX_RETRIES {
                attempts += 1;
                let wait = resp
                    .json::<RateLimited>()
                    .await
                    .map(|r| Duration::from_secs_f64(r.retry_after.max(0.0)))
                    .unwrap_or(Duration::from_secs(1));
                warn!(page = container.page, wait_ms = wait.as_millis() as u64, "discord rate limited");
                sleep(wait).await;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!(
                "discord send failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsbot_core::domain::Block;

    fn page() -> MessageContainer {
        MessageContainer {
            page: 2,
            title: "📰 Daily AI News Summary - 2026-10-18 (Page 2)".to_string(),
            description: "Additional stories continue below.".to_string(),
            color: 0x3498DB,
            blocks: vec![
                Block {
                    category: "General".to_string(),
                    part: 1,
                    color: 0x3498DB,
                    heading: "🌐 **General**".to_string(),
                    body: "• **[A](https://a.example)**\n*Wired*".to_string(),
                },
                Block {
                    category: "General".to_string(),
                    part: 2,
                    color: 0x3498DB,
                    heading: "\u{200B}".to_string(),
                    body: "x".repeat(1500),
                },
            ],
        }
    }

    #[test]
    fn one_embed_one_field_per_block() {
        let payload = embed_payload(&page());
        assert_eq!(payload.embeds.len(), 1);

        let embed = &payload.embeds[0];
        assert_eq!(embed.color, 0x3498DB);
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "🌐 **General**");
        assert!(!embed.fields[0].inline);
        assert_eq!(embed.fields[1].name, "\u{200B}");
    }

    #[test]
    fn oversize_field_is_cut_to_discord_cap() {
        let payload = embed_payload(&page());
        let value = &payload.embeds[0].fields[1].value;
        assert_eq!(value.chars().count(), FIELD_VALUE_MAX);
        assert!(value.ends_with("..."));
    }

    #[test]
    fn serializes_as_discord_expects() {
        let json = serde_json::to_value(embed_payload(&page())).unwrap();
        assert_eq!(json["embeds"][0]["title"], "📰 Daily AI News Summary - 2026-10-18 (Page 2)");
        assert_eq!(json["embeds"][0]["color"], 0x3498DB);
        assert_eq!(json["embeds"][0]["fields"][0]["inline"], false);
    }

    #[test]
    fn posts_to_channel_messages() {
        let d = DiscordDelivery::new("tok", 42).unwrap();
        assert_eq!(d.messages_url(), "https://discord.com/api/v10/channels/42/messages");
    }
}
