//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use chrono::Local;
use std::io::Write;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Me};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::assistant::NutritionAssistant;
use crate::config::DeliveryConfig;
use crate::localization::t;
use crate::text_processing::preview;

use super::delivery::deliver_response;
use super::ui_builder::{
    create_quick_actions_keyboard, format_diagnostics, format_welcome_message, DiagnosticsInfo,
};

/// Commands the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Test,
}

impl Command {
    /// Localization key of the reply sent when the command itself fails
    fn error_key(self) -> &'static str {
        match self {
            Command::Start => "error-start",
            Command::Reset => "error-reset",
            Command::Test => "error-test",
        }
    }
}

/// Outcome of looking at a text message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedText<'a> {
    Command(Command),
    UnknownCommand(&'a str),
    /// A command addressed to another bot in a group chat
    ForeignCommand(&'a str),
    Plain(&'a str),
}

/// Classify a text message.
///
/// Commands may carry a mention (`/cmd@name`); a mention of anything but
/// `bot_username` marks the command as foreign.
pub fn parse_text<'a>(text: &'a str, bot_username: &str) -> ParsedText<'a> {
    let Some(rest) = text.strip_prefix('/') else {
        return ParsedText::Plain(text);
    };
    let token = rest.split_whitespace().next().unwrap_or("");
    let (name, mention) = match token.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (token, None),
    };
    if mention.is_some_and(|mention| !mention.eq_ignore_ascii_case(bot_username)) {
        return ParsedText::ForeignCommand(token);
    }
    match name {
        "start" => ParsedText::Command(Command::Start),
        "reset" => ParsedText::Command(Command::Reset),
        "test" => ParsedText::Command(Command::Test),
        _ => ParsedText::UnknownCommand(name),
    }
}

/// Download a Telegram file into a temporary file that is removed when dropped
pub async fn download_file(bot: &Bot, file_id: teloxide::types::FileId) -> Result<NamedTempFile> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    let mut temp_file = tempfile::Builder::new()
        .prefix("nutribot_photo_")
        .suffix(".jpg")
        .tempfile()?;
    temp_file.as_file_mut().write_all(&bytes)?;
    temp_file.as_file_mut().flush()?;

    Ok(temp_file)
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    command: Command,
    assistant: &NutritionAssistant,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let today = Local::now().date_naive();

    match command {
        Command::Start => {
            info!(user_id = %user.id, username = ?user.username, "Handling /start");
            bot.send_message(msg.chat.id, format_welcome_message(Local::now()))
                .reply_markup(create_quick_actions_keyboard(today))
                .await?;
        }
        Command::Reset => {
            info!(user_id = %user.id, "Handling /reset");
            let response = assistant.reset(user.id.0);
            bot.send_message(msg.chat.id, response)
                .reply_markup(create_quick_actions_keyboard(today))
                .await?;
        }
        Command::Test => {
            info!(user_id = %user.id, "Handling /test");
            let info = DiagnosticsInfo {
                now: Local::now(),
                user_id: user.id.0,
                chat_id: msg.chat.id.0,
                full_name: user.full_name(),
                username: user.username.clone(),
                session: assistant.session_snapshot(user.id.0).await,
            };
            bot.send_message(msg.chat.id, format_diagnostics(&info))
                .await?;
        }
    }
    Ok(())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    text: &str,
    assistant: &NutritionAssistant,
    delivery: &DeliveryConfig,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    info!(user_id = %user.id, text = %preview(text, 50), "Received text message");

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let response = assistant.get_response(user.id.0, text).await;
    debug!(user_id = %user.id, chars = response.chars().count(), "Response ready");

    let keyboard = create_quick_actions_keyboard(Local::now().date_naive());
    deliver_response(bot, msg.chat.id, &response, keyboard, delivery).await?;

    info!(user_id = %user.id, "Response sent");
    Ok(())
}

async fn handle_photo_message(
    bot: &Bot,
    msg: &Message,
    assistant: &NutritionAssistant,
    delivery: &DeliveryConfig,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) else {
        return Ok(());
    };
    info!(user_id = %user.id, "Received photo message");

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
    bot.send_message(msg.chat.id, t("photo-analyzing")).await?;

    let temp_file = download_file(bot, largest_photo.file.id.clone()).await?;
    debug!(user_id = %user.id, temp_path = %temp_file.path().display(), "Photo downloaded");

    let response = assistant.process_image(user.id.0, temp_file.path()).await;

    // Remove the photo before replying
    let temp_path = temp_file.path().display().to_string();
    if let Err(cleanup_err) = temp_file.close() {
        error!(temp_path = %temp_path, error = %cleanup_err, "Failed to clean up temporary file");
    } else {
        debug!(temp_path = %temp_path, "Temporary file cleaned up successfully");
    }

    let keyboard = create_quick_actions_keyboard(Local::now().date_naive());
    deliver_response(bot, msg.chat.id, &response, keyboard, delivery).await?;

    info!(user_id = %user.id, "Photo analysed and response sent");
    Ok(())
}

/// Entry point for every incoming message.
///
/// Any failure inside a handler is logged and answered with a fallback text,
/// so the user always gets a reply.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    me: Me,
    assistant: Arc<NutritionAssistant>,
    delivery: Arc<DeliveryConfig>,
) -> Result<()> {
    let (result, error_key) = if let Some(text) = msg.text() {
        match parse_text(text, me.username()) {
            ParsedText::Command(command) => (
                handle_command(&bot, &msg, command, &assistant).await,
                command.error_key(),
            ),
            ParsedText::UnknownCommand(name) => {
                debug!(chat_id = %msg.chat.id, command = %name, "Ignoring unknown command");
                return Ok(());
            }
            ParsedText::ForeignCommand(command) => {
                debug!(chat_id = %msg.chat.id, command = %command, "Ignoring command for another bot");
                return Ok(());
            }
            ParsedText::Plain(text) => (
                handle_text_message(&bot, &msg, text, &assistant, &delivery).await,
                "error-message",
            ),
        }
    } else if msg.photo().is_some() {
        (
            handle_photo_message(&bot, &msg, &assistant, &delivery).await,
            "error-photo",
        )
    } else {
        debug!(chat_id = %msg.chat.id, "Ignoring unsupported message type");
        return Ok(());
    };

    if let Err(e) = result {
        error!(chat_id = %msg.chat.id, error = ?e, "Failed to handle message");
        bot.send_message(msg.chat.id, t(error_key)).await?;
    }

    Ok(())
}
