//! Callback Handler module for processing quick-action button presses

use anyhow::Result;
use chrono::{Datelike, Local};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatAction};
use tracing::{debug, error, info, warn};

use crate::assistant::NutritionAssistant;
use crate::config::DeliveryConfig;
use crate::daily_prompt::weekday_name;
use crate::localization::t;
use crate::quick_actions::prompt_for_callback;

use super::delivery::send_long_message;
use super::ui_builder::create_quick_actions_keyboard;

async fn handle_quick_action(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    assistant: &NutritionAssistant,
    delivery: &DeliveryConfig,
) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    info!(user_id = %q.from.id, data = %data, "Quick action pressed");

    bot.send_chat_action(chat_id, ChatAction::Typing).await?;

    let today = Local::now().date_naive();
    let prompt = prompt_for_callback(data, weekday_name(today.weekday()));
    let response = assistant.get_response(q.from.id.0, &prompt).await;
    debug!(user_id = %q.from.id, chars = response.chars().count(), "Response ready");

    let keyboard = create_quick_actions_keyboard(today);
    if response.chars().count() > delivery.long_message_threshold {
        send_long_message(bot, chat_id, &response, Some(keyboard), delivery).await?;
        return Ok(());
    }

    // Replace the message that carried the keyboard, or send a new one
    let edited = match &q.message {
        Some(msg) => bot
            .edit_message_text(msg.chat().id, msg.id(), response.clone())
            .reply_markup(keyboard.clone())
            .await
            .map_err(|e| warn!(user_id = %q.from.id, error = %e, "Failed to edit message"))
            .is_ok(),
        None => false,
    };
    if !edited {
        bot.send_message(chat_id, response)
            .reply_markup(keyboard)
            .await?;
    }

    Ok(())
}

/// Handle callback queries from the quick-action keyboard
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    assistant: Arc<NutritionAssistant>,
    delivery: Arc<DeliveryConfig>,
) -> Result<()> {
    // Answer the callback query to remove the loading state. Telegram rejects
    // stale queries; the action still runs so the user gets a reply.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let chat_id = q
        .message
        .as_ref()
        .map(|msg| msg.chat().id)
        .unwrap_or_else(|| ChatId::from(q.from.id));

    if let Err(e) = handle_quick_action(&bot, &q, chat_id, &assistant, &delivery).await {
        error!(user_id = %q.from.id, error = ?e, "Failed to handle quick action");

        let edited = match &q.message {
            Some(msg) => bot
                .edit_message_text(msg.chat().id, msg.id(), t("error-button"))
                .await
                .is_ok(),
            None => false,
        };
        if !edited {
            bot.send_message(chat_id, t("error-button")).await?;
        }
    }

    Ok(())
}
