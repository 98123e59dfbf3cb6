//! # Gemini Error Types Module
//!
//! Error types for requests to the generative backend. Every variant maps to
//! a fixed user-facing sentence; none of them is shown to the user verbatim.

use thiserror::Error;

use crate::localization::t;

/// Failure of a single backend request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeminiError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// The backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),
    /// The backend answered with a non-200 status
    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },
    /// The prompt was rejected by the backend's content filter
    #[error("Request blocked: {0}")]
    Blocked(String),
    /// The response carried no candidates
    #[error("No candidates in response")]
    NoCandidates,
    /// The first candidate has no text part
    #[error("Malformed candidate in response")]
    MalformedCandidate,
    /// The response body is not the expected JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The image could not be read or is not a supported format
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    /// Anything else
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl GeminiError {
    /// Localization key of the fallback sentence for a text request
    pub fn message_key(&self) -> &'static str {
        match self {
            GeminiError::Timeout => "error-timeout",
            GeminiError::Connection(_) => "error-connection",
            GeminiError::Http { .. } => "error-backend",
            GeminiError::Blocked(_) => "error-blocked",
            GeminiError::NoCandidates => "error-no-candidates",
            GeminiError::MalformedCandidate | GeminiError::MalformedResponse(_) => {
                "error-malformed-response"
            }
            GeminiError::ImageDecode(_) | GeminiError::Unknown(_) => "error-unexpected",
        }
    }

    /// Localization key of the fallback sentence for a photo request.
    ///
    /// Answers the backend did produce collapse into "could not analyse";
    /// transport and decoding failures into "error while analysing".
    pub fn image_message_key(&self) -> &'static str {
        match self {
            GeminiError::Http { .. }
            | GeminiError::Blocked(_)
            | GeminiError::NoCandidates
            | GeminiError::MalformedCandidate => "error-image-not-analyzed",
            GeminiError::Timeout
            | GeminiError::Connection(_)
            | GeminiError::MalformedResponse(_)
            | GeminiError::ImageDecode(_)
            | GeminiError::Unknown(_) => "error-image-processing",
        }
    }

    /// Fallback sentence for a text request
    pub fn user_message(&self) -> String {
        t(self.message_key())
    }

    /// Fallback sentence for a photo request
    pub fn image_user_message(&self) -> String {
        t(self.image_message_key())
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeminiError::Timeout
        } else if err.is_connect() {
            GeminiError::Connection(err.to_string())
        } else if err.is_decode() {
            GeminiError::MalformedResponse(err.to_string())
        } else {
            GeminiError::Unknown(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GeminiError::Http {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP error (503): overloaded");
        assert_eq!(
            GeminiError::Blocked("SAFETY".to_string()).to_string(),
            "Request blocked: SAFETY"
        );
    }

    #[test]
    fn test_every_kind_has_a_message() {
        let errors = [
            GeminiError::Timeout,
            GeminiError::Connection("refused".to_string()),
            GeminiError::Http { status: 500, body: String::new() },
            GeminiError::Blocked("SAFETY".to_string()),
            GeminiError::NoCandidates,
            GeminiError::MalformedCandidate,
            GeminiError::MalformedResponse("eof".to_string()),
            GeminiError::ImageDecode("bad".to_string()),
            GeminiError::Unknown("boom".to_string()),
        ];
        for error in errors {
            assert!(!error.user_message().starts_with("Missing translation"));
            assert!(!error.image_user_message().starts_with("Missing translation"));
        }
    }

    #[test]
    fn test_image_messages_split_by_kind() {
        assert_eq!(GeminiError::NoCandidates.image_message_key(), "error-image-not-analyzed");
        assert_eq!(GeminiError::Timeout.image_message_key(), "error-image-processing");
    }
}
