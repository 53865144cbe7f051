use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};
use tracing::{info, warn};

use newsbot_core::{
    config::Config,
    cycle::CycleStatus,
    errors::Error,
    formatting::{escape_html, format_display_time},
};

use crate::{router::BotState, ChatProgress};

fn parse_command(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`
    let first = text.split_whitespace().next().unwrap_or("");
    first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

pub async fn handle_command(
    bot: Bot,
    chat_id: ChatId,
    text: &str,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match parse_command(text).as_str() {
        "news" | "force_news" => {
            info!(chat = chat_id.0, "manual digest requested");
            // Run off the dispatcher so /status keeps answering meanwhile.
            tokio::spawn(async move {
                let progress = ChatProgress::new(bot.clone(), chat_id);
                match state.ctx.cycle.run(&progress).await {
                    Err(Error::Busy) => {
                        let _ = bot
                            .send_message(chat_id, "A digest run is already in progress.")
                            .await;
                    }
                    Err(e) => warn!("manual digest failed: {e}"),
                    Ok(_) => {}
                }
            });
            Ok(())
        }

        "status" => {
            let status = state.ctx.cycle.status().await;
            let seen = match state.ctx.store.count().await {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!("seen count failed: {e}");
                    None
                }
            };
            let body = format_status(&status, seen, &state.ctx.config);
            bot.send_message(chat_id, body)
                .parse_mode(ParseMode::Html)
                .await?;
            Ok(())
        }

        "start" | "help" => {
            bot.send_message(chat_id, help_text(&state.ctx.config))
                .parse_mode(ParseMode::Html)
                .await?;
            Ok(())
        }

        _ => {
            bot.send_message(chat_id, "Unknown command. Try /help.")
                .await?;
            Ok(())
        }
    }
}

fn help_text(cfg: &Config) -> String {
    format!(
        "📰 <b>{}</b>\n\n\
<b>Commands:</b>\n\
/news - Fetch and post new articles now\n\
/force_news - Same as /news\n\
/status - Show digest status\n\
/help - Show this message\n\n\
Digests are posted every {}h.",
        escape_html(&cfg.digest_title),
        cfg.update_interval.as_secs() / 3600
    )
}

fn format_status(status: &CycleStatus, seen: Option<u64>, cfg: &Config) -> String {
    let mut out = String::from("📊 <b>Digest status</b>\n\n");
    out.push_str(&format!("State: {}\n", status.state));

    match &status.last {
        None => out.push_str("Last run: never\n"),
        Some(report) => {
            let when = format_display_time(&report.finished_at);
            let what = match &report.outcome {
                Ok(outcome) => outcome.to_string(),
                Err(e) => format!("failed: {e}"),
            };
            out.push_str(&format!("Last run: {when}, {}\n", escape_html(&what)));
        }
    }

    match seen {
        Some(n) => out.push_str(&format!("Seen articles: {n}\n")),
        None => out.push_str("Seen articles: unavailable\n"),
    }
    out.push_str(&format!(
        "Categories: {} ({} feeds)\n",
        cfg.categories.categories.len(),
        cfg.categories.feed_count()
    ));
    out.push_str(&format!(
        "Interval: every {}h",
        cfg.update_interval.as_secs() / 3600
    ));
    out
}
