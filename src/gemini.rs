//! # Gemini Module
//!
//! Request building, response parsing and the HTTP client for the Gemini
//! `generateContent` endpoint.
//!
//! Requests are built from a copy of the session history; the stored session
//! is only changed by the caller once a response has been parsed
//! successfully.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{AssistantConfig, GenerationSettings};
use crate::gemini_errors::GeminiError;
use crate::session::{InlineData, Part, Role, Session, Turn};
use crate::text_processing::preview;

/// Prompt sent together with a food photo
pub const IMAGE_PROMPT: &str =
    "Проанализируй это блюдо с точки зрения моей диеты. Подходит ли оно мне? Что можно улучшить?";

/// Text stored in the history in place of a photo
pub const IMAGE_PLACEHOLDER: &str = "Пользователь отправил фото еды для анализа";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// New input from the user
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    Text(String),
    Image {
        prompt: String,
        bytes: Vec<u8>,
        media_type: String,
    },
}

impl UserInput {
    /// Photo input with the standard analysis prompt
    pub fn image(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        UserInput::Image {
            prompt: IMAGE_PROMPT.to_string(),
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Turn sent to the backend
    pub fn request_turn(&self) -> Turn {
        match self {
            UserInput::Text(text) => Turn::user(text.clone()),
            UserInput::Image {
                prompt,
                bytes,
                media_type,
            } => Turn {
                role: Role::User,
                parts: vec![
                    Part::text(prompt.clone()),
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: media_type.clone(),
                            data: base64::engine::general_purpose::STANDARD.encode(bytes),
                        },
                    },
                ],
            },
        }
    }

    /// Turn kept in the session history after a successful exchange
    pub fn recorded_turn(&self) -> Turn {
        match self {
            UserInput::Text(text) => Turn::user(text.clone()),
            UserInput::Image { .. } => Turn::user(IMAGE_PLACEHOLDER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// Safety settings that disable blocking for every harm category.
///
/// Medical advice regularly touches topics the default filters suppress.
pub fn permissive_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: category.to_string(),
            threshold: "BLOCK_NONE".to_string(),
        })
        .collect()
}

/// Body of a `generateContent` request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Turn>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

/// Build a request from a trimmed copy of the session history plus the new input
pub fn build_request(
    session: &Session,
    input: &UserInput,
    max_turns: usize,
    generation: &GenerationSettings,
) -> GenerateContentRequest {
    let mut contents = crate::session::trim_history(session.history().to_vec(), max_turns);
    contents.push(input.request_turn());

    GenerateContentRequest {
        contents,
        generation_config: GenerationConfig::from(generation),
        safety_settings: permissive_safety_settings(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Extract the assistant text from a response
pub fn parse_response(response: &GenerateContentResponse) -> Result<String, GeminiError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        return Err(GeminiError::Blocked(reason.clone()));
    }

    let candidate = response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .ok_or(GeminiError::NoCandidates)?;

    candidate
        .content
        .as_ref()
        .and_then(|content| content.parts.as_ref())
        .and_then(|parts| parts.first())
        .and_then(|part| part.text.clone())
        .ok_or(GeminiError::MalformedCandidate)
}

/// A generative backend able to answer a `generateContent` request
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError>;
}

/// HTTP client for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AssistantConfig, api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_url(config.api_url.clone(), api_key, config.request_timeout)
    }

    /// Create a client against a custom endpoint (for testing / integration)
    pub fn with_url(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(body) = serde_json::to_string(request) {
                debug!(body = %preview(&body, 200), "Sending request to Gemini API");
            }
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("X-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gemini API request failed");
                GeminiError::from(e)
            })?;

        let status = response.status();
        info!(status = status.as_u16(), "Gemini API response status");

        let body = response.text().await?;
        if status != StatusCode::OK {
            error!(status = status.as_u16(), body = %preview(&body, 500), "Gemini API error");
            return Err(GeminiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Could not decode Gemini API response");
            GeminiError::MalformedResponse(e.to_string())
        })
    }
}
