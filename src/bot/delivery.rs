//! Sending replies, splitting those that exceed the platform limit

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, info};

use crate::config::DeliveryConfig;
use crate::text_processing::split_message;

/// Send `text` in chunks, attaching `reply_markup` to the last one.
///
/// Chunks go out one by one with `config.chunk_delay` in between to stay
/// under Telegram's rate limits.
pub async fn send_long_message(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    reply_markup: Option<InlineKeyboardMarkup>,
    config: &DeliveryConfig,
) -> Result<()> {
    let parts = split_message(text, config.max_message_length);
    let count = parts.len();
    debug!(chat_id = %chat_id, chunks = count, "Sending long message");

    let mut reply_markup = reply_markup;
    for (i, part) in parts.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let request = bot.send_message(chat_id, part);
        match reply_markup.take_if(|_| is_last) {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };

        if !is_last {
            tokio::time::sleep(config.chunk_delay).await;
        }
    }

    Ok(())
}

/// Send an assistant reply with the keyboard, chunking it when it is long
pub async fn deliver_response(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: InlineKeyboardMarkup,
    config: &DeliveryConfig,
) -> Result<()> {
    if text.chars().count() > config.long_message_threshold {
        info!(chat_id = %chat_id, "Sending long response in chunks");
        send_long_message(bot, chat_id, text, Some(keyboard), config).await
    } else {
        bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        Ok(())
    }
}
