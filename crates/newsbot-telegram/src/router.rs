use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use newsbot_core::app::AppContext;

use crate::handlers;

#[derive(Clone)]
pub struct BotState {
    pub ctx: AppContext,
}

/// Long-poll for commands until the process is stopped.
pub async fn run_polling(bot: Bot, ctx: AppContext) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => info!(bot = %me.username(), "telegram commands enabled"),
        Err(e) => return Err(anyhow::anyhow!("telegram get_me failed: {e}")),
    }
    info!(
        allowed_users = ctx.config.telegram_allowed_users.len(),
        "accepting commands"
    );

    let state = Arc::new(BotState { ctx });
    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
