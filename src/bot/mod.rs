//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles commands, text and photo messages
//! - `callback_handler`: Handles quick-action keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `delivery`: Sends replies, chunking long ones

pub mod callback_handler;
pub mod delivery;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

// Re-export utility functions that might be used elsewhere
pub use delivery::{deliver_response, send_long_message};
pub use message_handler::download_file;
pub use ui_builder::{create_quick_actions_keyboard, format_welcome_message};
