//! # Nutrition Assistant Telegram Bot
//!
//! A Telegram bot that forwards text and food photos to a Gemini model and
//! answers with personalized nutrition advice, keeping a short per-user
//! conversation history that starts with a daily system prompt.

pub mod assistant;
pub mod bot;
pub mod config;
pub mod daily_prompt;
pub mod gemini;
pub mod gemini_errors;
pub mod localization;
pub mod quick_actions;
pub mod session;
pub mod text_processing;
