//! Telegram update handlers.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::warn;

use crate::router::BotState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| u.id.0 as i64);

    if !is_authorized(user_id, &state.ctx.config.telegram_allowed_users) {
        warn!(user = ?user_id, "unauthorized command attempt");
        let _ = bot
            .send_message(msg.chat.id, "Unauthorized. Contact the bot owner for access.")
            .await;
        return Ok(());
    }

    match msg.text() {
        Some(text) if text.starts_with('/') => commands::handle_command(bot, msg.chat.id, text, state).await,
        _ => Ok(()),
    }
}

fn is_authorized(user_id: Option<i64>, allowed: &[i64]) -> bool {
    match user_id {
        Some(id) => allowed.contains(&id),
        None => false,
    }
}
