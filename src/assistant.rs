//! # Nutrition Assistant Module
//!
//! Glue between the session store and the generative backend. One call
//! handles one user message end to end:
//!
//! 1. lock the user's session (creating or refreshing it as needed)
//! 2. build the request from a copy of the history
//! 3. call the backend and parse the answer
//! 4. on success only, append the exchange to the stored history
//!
//! Failures never leave this module: they are logged and turned into a
//! fixed sentence for the user.

use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::AssistantConfig;
use crate::gemini::{build_request, parse_response, GenerativeBackend, UserInput};
use crate::gemini_errors::GeminiError;
use crate::localization::t;
use crate::session::{SessionSnapshot, SessionStore, Turn, UserKey};
use crate::text_processing::truncate_input;

pub struct NutritionAssistant {
    store: SessionStore,
    backend: Arc<dyn GenerativeBackend>,
    config: AssistantConfig,
}

impl NutritionAssistant {
    pub fn new(config: AssistantConfig, backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            store: SessionStore::new(config.session.clone()),
            backend,
            config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Answer a text message
    pub async fn get_response(&self, user_id: UserKey, user_input: &str) -> String {
        let text = match truncate_input(user_input, self.config.max_input_length) {
            Some(truncated) => {
                warn!(
                    user_id = %user_id,
                    max_chars = self.config.max_input_length,
                    "User input truncated"
                );
                truncated
            }
            None => user_input.to_string(),
        };

        match self.exchange(user_id, UserInput::Text(text)).await {
            Ok(answer) => answer,
            Err(e) => e.user_message(),
        }
    }

    /// Answer a food photo stored at `image_path`
    pub async fn process_image(&self, user_id: UserKey, image_path: &Path) -> String {
        let result = async {
            let bytes = tokio::fs::read(image_path)
                .await
                .map_err(|e| GeminiError::ImageDecode(e.to_string()))?;
            let media_type = detect_media_type(&bytes)?;
            debug!(user_id = %user_id, media_type, size = bytes.len(), "Image loaded");
            self.exchange(user_id, UserInput::image(bytes, media_type)).await
        }
        .await;

        match result {
            Ok(answer) => answer,
            Err(e) => e.image_user_message(),
        }
    }

    /// Delete the user's session and describe the outcome
    pub fn reset(&self, user_id: UserKey) -> String {
        if self.store.reset(user_id) {
            t("reset-done")
        } else {
            t("reset-none")
        }
    }

    pub async fn session_snapshot(&self, user_id: UserKey) -> Option<SessionSnapshot> {
        self.store.snapshot(user_id).await
    }

    async fn exchange(&self, user_id: UserKey, input: UserInput) -> Result<String, GeminiError> {
        let mut session = self.store.get_or_create(user_id, Local::now()).await;

        let request = build_request(
            &session,
            &input,
            self.config.session.max_history_turns,
            &self.config.generation,
        );

        let answer = self
            .backend
            .generate(&request)
            .await
            .and_then(|response| parse_response(&response))
            .inspect_err(|e| log_failure(user_id, e))?;

        self.store.append_exchange(
            &mut session,
            input.recorded_turn(),
            Turn::assistant(answer.clone()),
            Local::now(),
        );

        info!(
            user_id = %user_id,
            chars = answer.chars().count(),
            history_len = session.history().len(),
            "Response received"
        );
        Ok(answer)
    }
}

fn log_failure(user_id: UserKey, e: &GeminiError) {
    match e {
        GeminiError::Blocked(reason) => {
            warn!(user_id = %user_id, reason = %reason, "Request blocked by backend")
        }
        _ => error!(user_id = %user_id, error = %e, "Backend request failed"),
    }
}

/// MIME type of a supported photo, detected from its leading bytes
pub fn detect_media_type(bytes: &[u8]) -> Result<&'static str, GeminiError> {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(image::ImageFormat::Png) => Ok("image/png"),
        Ok(image::ImageFormat::WebP) => Ok("image/webp"),
        Ok(format) => Err(GeminiError::ImageDecode(format!(
            "unsupported image format: {format:?}"
        ))),
        Err(e) => Err(GeminiError::ImageDecode(e.to_string())),
    }
}
