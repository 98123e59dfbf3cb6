//! # Configuration Module
//!
//! This module defines configuration structures for the bot: session policy,
//! backend generation parameters, delivery limits and the environment-driven
//! startup configuration.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Constants for the Gemini backend
pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

// Constants for session handling
pub const MAX_HISTORY_TURNS: usize = 10; // Non-system turns kept in history
pub const SESSION_TIMEOUT_HOURS: i64 = 4;
pub const CLEANUP_INTERVAL_MINUTES: i64 = 30;
pub const MAX_INPUT_LENGTH: usize = 2000; // Characters, longer input is truncated

// Constants for Telegram delivery
pub const MAX_MESSAGE_LENGTH: usize = 4096;
pub const LONG_MESSAGE_THRESHOLD: usize = 4000;
pub const CHUNK_DELAY_MS: u64 = 300;

/// Session retention policy
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of non-system turns retained per session
    pub max_history_turns: usize,
    /// Idle time after which a session is evicted
    pub session_timeout: TimeDelta,
    /// Minimum time between two expiry sweeps
    pub cleanup_interval: TimeDelta,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_turns: MAX_HISTORY_TURNS,
            session_timeout: TimeDelta::hours(SESSION_TIMEOUT_HOURS),
            cleanup_interval: TimeDelta::minutes(CLEANUP_INTERVAL_MINUTES),
        }
    }
}

/// Generation parameters attached to every backend request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Configuration of the assistant core
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Full `generateContent` endpoint URL
    pub api_url: String,
    /// Timeout for one backend request
    pub request_timeout: Duration,
    /// Maximum accepted input length in characters
    pub max_input_length: usize,
    /// Generation parameters
    pub generation: GenerationSettings,
    /// Session retention policy
    pub session: SessionConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_input_length: MAX_INPUT_LENGTH,
            generation: GenerationSettings::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Limits for sending replies through Telegram
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Hard per-message limit of the platform
    pub max_message_length: usize,
    /// Replies longer than this are sent in chunks
    pub long_message_threshold: usize,
    /// Pause between consecutive chunks
    pub chunk_delay: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_message_length: MAX_MESSAGE_LENGTH,
            long_message_threshold: LONG_MESSAGE_THRESHOLD,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        }
    }
}

/// Startup configuration read from the environment
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub gemini_api_key: String,
    pub assistant: AssistantConfig,
    pub delivery: DeliveryConfig,
}

impl BotConfig {
    /// Read the configuration from environment variables.
    ///
    /// `TELEGRAM_BOT_TOKEN` and `GEMINI_API_KEY` are required, `GEMINI_API_URL`
    /// overrides the default model endpoint.
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            required_var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let gemini_api_key =
            required_var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

        let mut assistant = AssistantConfig::default();
        if let Ok(url) = env::var("GEMINI_API_URL") {
            if !url.trim().is_empty() {
                assistant.api_url = url.trim().to_string();
            }
        }

        Ok(Self {
            telegram_token,
            gemini_api_key,
            assistant,
            delivery: DeliveryConfig::default(),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    let value = env::var(name)?;
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("{name} is empty");
    }
    Ok(value.to_string())
}

/// Operator log file used when `LOG_FILE` is not set
pub const DEFAULT_LOG_FILE: &str = "bot.log";

/// Resolve the log file path from the raw `LOG_FILE` value.
///
/// Unset means [`DEFAULT_LOG_FILE`]; an empty value disables file logging.
pub fn log_file_path(value: Option<String>) -> Option<PathBuf> {
    match value {
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        Some(path) if path.trim().is_empty() => None,
        Some(path) => Some(PathBuf::from(path.trim())),
    }
}

/// Mask a secret for logging, keeping the first and last five characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{head}...{tail}")
}
