use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use newsbot_core::{
    app::AppContext,
    config::{Config, DeliveryBackend},
    delivery::{port::DeliveryPort, progress::ProgressSink},
    store::SeenStore,
    Error,
};
use newsbot_discord::DiscordDelivery;
use newsbot_feeds::HttpFeedParser;
use newsbot_store::SqliteSeenStore;
use newsbot_telegram::{Bot, TelegramDelivery};

#[derive(Parser)]
#[command(name = "newsbot", version, about = "Periodic category-grouped feed digest")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Post a digest now and on every interval; accept chat commands.
    #[default]
    Serve,
    /// Run a single digest cycle and exit.
    Once,
}

/// Progress echo for `once`: straight to the terminal.
struct StdoutProgress;

#[async_trait]
impl ProgressSink for StdoutProgress {
    async fn report(&self, text: &str) {
        println!("{text}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    newsbot_core::logging::init("newsbot")?;

    let cfg = Arc::new(Config::load()?);
    let bot = cfg.telegram_bot_token.as_deref().map(Bot::new);

    let store: Arc<dyn SeenStore> = Arc::new(SqliteSeenStore::open(&cfg.database_path).await?);
    let parser = Arc::new(HttpFeedParser::new(&cfg.feed_user_agent, cfg.feed_timeout)?);
    let delivery = build_delivery(&cfg, bot.clone())?;

    info!(
        backend = ?cfg.delivery_backend,
        categories = cfg.categories.categories.len(),
        feeds = cfg.categories.feed_count(),
        "newsbot configured"
    );
    let ctx = AppContext::new(cfg.clone(), store, parser, delivery);

    match cli.command.unwrap_or_default() {
        Command::Once => {
            let outcome = ctx.cycle.run(&StdoutProgress).await?;
            println!("{outcome}");
        }
        Command::Serve => serve(ctx, bot).await?,
    }

    Ok(())
}

fn build_delivery(cfg: &Config, bot: Option<Bot>) -> Result<Arc<dyn DeliveryPort>, Error> {
    match cfg.delivery_backend {
        DeliveryBackend::Discord => {
            let (Some(token), Some(channel)) = (cfg.discord_token.as_deref(), cfg.discord_channel_id)
            else {
                return Err(Error::Config("discord credentials missing".to_string()));
            };
            Ok(Arc::new(DiscordDelivery::new(token, channel)?))
        }
        DeliveryBackend::Telegram => {
            let (Some(bot), Some(chat)) = (bot, cfg.telegram_chat_id) else {
                return Err(Error::Config("telegram credentials missing".to_string()));
            };
            Ok(Arc::new(TelegramDelivery::new(bot, chat)))
        }
    }
}

async fn serve(ctx: AppContext, bot: Option<Bot>) -> Result<(), Error> {
    let cancel = CancellationToken::new();
    let scheduler = ctx.scheduler().spawn(cancel.clone());

    match bot {
        Some(bot) => {
            tokio::select! {
                res = newsbot_telegram::router::run_polling(bot, ctx.clone()) => {
                    res.map_err(|e| Error::External(format!("telegram bot failed: {e}")))?;
                }
                _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("shutdown requested");
        }
    }

    cancel.cancel();
    let _ = scheduler.await;
    Ok(())
}
