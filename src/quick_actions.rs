//! Quick-action buttons shown under every reply.
//!
//! Each button carries a fixed callback payload and expands to a canned
//! prompt that goes through the same path as a typed message.

use crate::localization::{t, t_args};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    MenuToday,
    Supplements,
    Activity,
    ShoppingList,
    Water,
    Diary,
}

impl QuickAction {
    /// Keyboard order, one button per row
    pub const ALL: [QuickAction; 6] = [
        QuickAction::MenuToday,
        QuickAction::Supplements,
        QuickAction::Activity,
        QuickAction::ShoppingList,
        QuickAction::Water,
        QuickAction::Diary,
    ];

    pub fn callback_data(self) -> &'static str {
        match self {
            QuickAction::MenuToday => "menu_today",
            QuickAction::Supplements => "supplements",
            QuickAction::Activity => "activity",
            QuickAction::ShoppingList => "shopping_list",
            QuickAction::Water => "water",
            QuickAction::Diary => "diary",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.callback_data() == data)
    }

    /// Button label; `day` is the Russian weekday name
    pub fn label(self, day: &str) -> String {
        match self {
            QuickAction::MenuToday => t_args("button-menu-today", &[("day", day)]),
            QuickAction::Supplements => t("button-supplements"),
            QuickAction::Activity => t("button-activity"),
            QuickAction::ShoppingList => t("button-shopping-list"),
            QuickAction::Water => t("button-water"),
            QuickAction::Diary => t("button-diary"),
        }
    }

    /// Prompt sent to the assistant; `day` is the Russian weekday name
    pub fn prompt(self, day: &str) -> String {
        match self {
            QuickAction::MenuToday => t_args("prompt-menu-today", &[("day", day)]),
            QuickAction::Supplements => t("prompt-supplements"),
            QuickAction::Activity => t_args("prompt-activity", &[("day", day)]),
            QuickAction::ShoppingList => t("prompt-shopping-list"),
            QuickAction::Water => t("prompt-water"),
            QuickAction::Diary => t("prompt-diary"),
        }
    }
}

/// Prompt for a raw callback payload; unknown payloads get a generic request
pub fn prompt_for_callback(data: &str, day: &str) -> String {
    match QuickAction::from_callback_data(data) {
        Some(action) => action.prompt(day),
        None => t("prompt-default"),
    }
}
