//! Pickup Bot
//!
//! Main application entry point

use std::sync::Arc;

use teloxide::Bot;
use tracing::{info, warn};

use pickup_bot::{
    config::Settings,
    handlers::ConversationHandler,
    polling::PollingSupervisor,
    survey::{SessionStore, SurveyPipeline},
    telegram::{BotClient, TelegramApi},
    utils::{logging, shutdown},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration; missing required settings halt startup.
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must outlive the supervisor loop.
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", pickup_bot::info());

    let bot = Bot::new(&settings.bot.token);
    let api: Arc<dyn TelegramApi> = Arc::new(BotClient::new(bot));

    // Identity lookup is logging-only; a network hiccup here is not fatal,
    // the supervisor retries the receive loop anyway.
    match api.identity().await {
        Ok(me) => info!(bot = %me.username, bot_id = me.id, "Bot identity confirmed"),
        Err(err) => warn!(error = %err, "Could not fetch bot identity at startup"),
    }

    let store = SessionStore::new();
    let pipeline = Arc::new(SurveyPipeline::standard());
    let handler = Arc::new(ConversationHandler::new(
        api.clone(),
        store,
        pipeline,
        settings.bot.operator_chat_id,
    ));

    let (shutdown_handle, shutdown_token) = shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown_handle.shutdown();
        }
    });

    let supervisor = PollingSupervisor::new(api, handler);
    supervisor.run(shutdown_token).await;

    info!("Pickup bot has been shut down.");
    Ok(())
}
