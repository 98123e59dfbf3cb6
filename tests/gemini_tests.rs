//! # Gemini Request and Client Tests
//!
//! Request shape, response parsing and the HTTP client against a mock server.

use chrono::{Local, TimeZone};
use nutribot::config::GenerationSettings;
use nutribot::gemini::{
    build_request, parse_response, GeminiClient, GenerateContentRequest, GenerateContentResponse,
    GenerativeBackend, UserInput,
};
use nutribot::gemini_errors::GeminiError;
use nutribot::session::{Role, Session, SessionStore, Turn};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Local.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().unwrap())
    }

    fn settings() -> GenerationSettings {
        GenerationSettings::default()
    }

    fn text_request() -> GenerateContentRequest {
        build_request(&session(), &UserInput::Text("Привет".to_string()), 10, &settings())
    }

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    /// The request serializes to the generateContent wire format
    #[test]
    fn test_request_wire_format() {
        let session = session();
        let request = build_request(&session, &UserInput::Text("Привет".to_string()), 10, &settings());
        let value = serde_json::to_value(&request).unwrap();

        let contents = value["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(
            contents[0]["parts"][0]["text"],
            session.system_turn().text().unwrap()
        );
        assert_eq!(contents[1], json!({"role": "user", "parts": [{"text": "Привет"}]}));

        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);

        let safety = value["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        for setting in safety {
            assert_eq!(setting["threshold"], "BLOCK_NONE");
        }
        assert!(safety
            .iter()
            .any(|s| s["category"] == "HARM_CATEGORY_DANGEROUS_CONTENT"));
    }

    /// Assistant turns use the backend's "model" role
    #[tokio::test]
    async fn test_request_includes_history_roles() {
        let store = SessionStore::default();
        let now = Local.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().unwrap();
        let mut guard = store.get_or_create(1, now).await;
        store.append_exchange(&mut guard, Turn::user("вопрос"), Turn::assistant("ответ"), now);

        let request = build_request(&guard, &UserInput::Text("ещё".to_string()), 10, &settings());
        let roles: Vec<Role> = request.contents.iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant, Role::User]);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][2]["role"], "model");
    }

    /// Building a request never changes the session
    #[test]
    fn test_build_request_leaves_session_untouched() {
        let session = session();
        let before = session.history().to_vec();

        let _ = build_request(&session, &UserInput::image(vec![0xff, 0xd8, 0xff], "image/jpeg"), 10, &settings());

        assert_eq!(session.history(), before.as_slice());
    }

    /// A photo request carries the prompt and the base64 payload
    #[test]
    fn test_image_request() {
        let request = build_request(
            &session(),
            &UserInput::image(b"abc".to_vec(), "image/png"),
            10,
            &settings(),
        );
        let value = serde_json::to_value(&request).unwrap();
        let last = &value["contents"][1];

        assert_eq!(last["role"], "user");
        assert_eq!(last["parts"].as_array().unwrap().len(), 2);
        assert_eq!(last["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(last["parts"][1]["inline_data"]["data"], "YWJj");
    }

    /// Custom generation settings are carried verbatim
    #[test]
    fn test_custom_generation_settings() {
        let custom = GenerationSettings {
            temperature: 0.2,
            max_output_tokens: 256,
        };
        let request = build_request(&session(), &UserInput::Text("x".to_string()), 10, &custom);
        assert_eq!(request.generation_config.max_output_tokens, 256);
        assert!((request.generation_config.temperature - 0.2).abs() < f32::EPSILON);
    }

    /// The first text part of the first candidate is the answer
    #[test]
    fn test_parse_success() {
        let parsed = parse_response(&response(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Первый"}, {"text": "Второй"}], "role": "model"}},
                {"content": {"parts": [{"text": "Другой"}]}}
            ]
        })));
        assert_eq!(parsed, Ok("Первый".to_string()));
    }

    /// Missing or empty candidate lists are reported as such
    #[test]
    fn test_parse_no_candidates() {
        assert_eq!(parse_response(&response(json!({}))), Err(GeminiError::NoCandidates));
        assert_eq!(
            parse_response(&response(json!({"candidates": []}))),
            Err(GeminiError::NoCandidates)
        );
    }

    /// Candidates without a usable text part are malformed
    #[test]
    fn test_parse_malformed_candidate() {
        for body in [
            json!({"candidates": [{}]}),
            json!({"candidates": [{"content": {}}]}),
            json!({"candidates": [{"content": {"parts": []}}]}),
            json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]}),
        ] {
            assert_eq!(
                parse_response(&response(body)),
                Err(GeminiError::MalformedCandidate)
            );
        }
    }

    /// A successful call sends the key header and decodes the body
    #[tokio::test]
    async fn test_client_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Здравствуйте!"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_url(
            format!("{}/v1beta/models/test:generateContent", server.uri()),
            "test-key",
            Duration::from_secs(5),
        )
        .unwrap();

        let response = client.generate(&text_request()).await.unwrap();
        assert_eq!(parse_response(&response), Ok("Здравствуйте!".to_string()));
    }

    /// The request body reaches the server in wire format
    #[tokio::test]
    async fn test_client_sends_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_url(server.uri(), "k", Duration::from_secs(5)).unwrap();
        client.generate(&text_request()).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["contents"][1]["parts"][0]["text"], "Привет");
        assert!(body.get("generationConfig").is_some());
        assert!(body.get("safetySettings").is_some());
    }

    /// Non-200 statuses carry the status and body
    #[tokio::test]
    async fn test_client_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = GeminiClient::with_url(server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = client.generate(&text_request()).await.unwrap_err();

        assert_eq!(
            err,
            GeminiError::Http {
                status: 500,
                body: "internal".to_string()
            }
        );
        assert_eq!(err.message_key(), "error-backend");
    }

    /// A slow server trips the request timeout
    #[tokio::test]
    async fn test_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client =
            GeminiClient::with_url(server.uri(), "k", Duration::from_millis(200)).unwrap();
        let err = client.generate(&text_request()).await.unwrap_err();

        assert_eq!(err, GeminiError::Timeout);
        assert_eq!(err.message_key(), "error-timeout");
    }

    /// An unreachable endpoint is a connection error
    #[tokio::test]
    async fn test_client_connection_error() {
        let client =
            GeminiClient::with_url("http://127.0.0.1:1/generate", "k", Duration::from_secs(5))
                .unwrap();
        let err = client.generate(&text_request()).await.unwrap_err();

        assert!(matches!(err, GeminiError::Connection(_)), "got {err:?}");
        assert_eq!(err.message_key(), "error-connection");
    }

    /// A 200 with a body that is not JSON is a malformed response
    #[tokio::test]
    async fn test_client_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GeminiClient::with_url(server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = client.generate(&text_request()).await.unwrap_err();

        assert!(matches!(err, GeminiError::MalformedResponse(_)));
        assert_eq!(err.message_key(), "error-malformed-response");
    }
}
