//! UI Builder module for creating keyboards and formatting messages

use chrono::{DateTime, Datelike, Local, NaiveDate};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::daily_prompt::weekday_name;
use crate::localization::{t, t_args};
use crate::quick_actions::QuickAction;
use crate::session::SessionSnapshot;

/// Create the quick-action keyboard, one button per row
pub fn create_quick_actions_keyboard(date: NaiveDate) -> InlineKeyboardMarkup {
    let day = weekday_name(date.weekday());
    let buttons: Vec<Vec<InlineKeyboardButton>> = QuickAction::ALL
        .iter()
        .map(|action| {
            vec![InlineKeyboardButton::callback(
                action.label(day),
                action.callback_data(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Format the /start greeting
pub fn format_welcome_message(now: DateTime<Local>) -> String {
    let day = weekday_name(now.weekday());
    let date = now.format("%d.%m.%Y").to_string();

    format!(
        "{}\n\n{}\n\n{}\n{}\n{}\n{}\n{}\n{}\n\n{}\n\n{}",
        t_args("welcome-greeting", &[("day", day), ("date", &date)]),
        t("welcome-intro"),
        t("welcome-features-title"),
        t("welcome-feature-menu"),
        t("welcome-feature-photo"),
        t("welcome-feature-lifestyle"),
        t("welcome-feature-planning"),
        t("welcome-feature-health"),
        t("welcome-tip"),
        t_args("welcome-question", &[("day", day)]),
    )
}

/// Everything the /test command reports
#[derive(Debug, Clone)]
pub struct DiagnosticsInfo {
    pub now: DateTime<Local>,
    pub user_id: u64,
    pub chat_id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub session: Option<SessionSnapshot>,
}

/// Format the /test diagnostics reply
pub fn format_diagnostics(info: &DiagnosticsInfo) -> String {
    let time = info.now.format("%d.%m.%Y %H:%M").to_string();
    let username = match &info.username {
        Some(name) => format!("@{name}"),
        None => t("test-username-missing"),
    };

    let mut lines = vec![
        t("test-success"),
        String::new(),
        t_args("test-time", &[("time", &time)]),
        t_args("test-user-id", &[("id", &info.user_id.to_string())]),
        t_args("test-chat-id", &[("id", &info.chat_id.to_string())]),
        t_args("test-name", &[("name", &info.full_name)]),
        t_args("test-username", &[("username", &username)]),
        String::new(),
    ];

    if let Some(session) = &info.session {
        let last = session.last_activity.format("%H:%M").to_string();
        let created = session.created_on.format("%Y-%m-%d").to_string();
        lines.push(t_args("test-history", &[("count", &session.history_len.to_string())]));
        lines.push(t_args("test-last-activity", &[("time", &last)]));
        lines.push(t_args("test-created", &[("date", &created)]));
    }

    lines.push(t("test-version"));
    lines.join("\n")
}
