use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use nutribot::assistant::NutritionAssistant;
use nutribot::bot;
use nutribot::config::{log_file_path, mask_secret, BotConfig};
use nutribot::gemini::GeminiClient;
use nutribot::localization::t;

/// Log to stdout and, unless disabled, append plain-text lines to the operator log file
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    let stdout_layer = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let log_path = log_file_path(std::env::var("LOG_FILE").ok());
    let log_file = log_path.as_ref().map(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
    });
    let (file_layer, file_error) = match log_file {
        Some(Ok(file)) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            ),
            None,
        ),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let (Some(path), Some(e)) = (log_path, file_error) {
        warn!(path = %path.display(), error = %e, "Could not open log file, logging to stdout only");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!("Starting nutrition assistant bot");

    let config = BotConfig::from_env()?;
    info!(
        telegram_token = %mask_secret(&config.telegram_token),
        gemini_api_key = %mask_secret(&config.gemini_api_key),
        api_url = %config.assistant.api_url,
        "Configuration loaded"
    );

    let backend = GeminiClient::new(&config.assistant, config.gemini_api_key.clone())?;
    let assistant = Arc::new(NutritionAssistant::new(
        config.assistant.clone(),
        Arc::new(backend),
    ));
    let delivery = Arc::new(config.delivery.clone());

    // Initialize the bot
    let bot = Bot::new(config.telegram_token.clone());

    let commands = [
        BotCommand::new("start", t("command-start")),
        BotCommand::new("reset", t("command-reset")),
        BotCommand::new("test", t("command-test")),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        error!(error = %e, "Failed to register bot commands");
    }

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![assistant, delivery])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
