//! Gemini `generateContent` client.

use std::time::Duration;

use bugai_core::{ModelClient, UpstreamError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Gemini API version used for every request.
pub const API_VERSION: &str = "v1beta";
/// Gemini model used for every request.
pub const MODEL_NAME: &str = "gemini-2.5-flash-preview-09-2025";
/// Upper bound on a single upstream call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first candidate's text out of a `generateContent` response body.
fn first_candidate_text(body: &str) -> Result<String, UpstreamError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| UpstreamError::Protocol(format!("response is not valid JSON: {err}")))?;
    let candidate = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Protocol("response has no candidates".to_string()))?;
    candidate
        .content
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| UpstreamError::Protocol("first candidate has no text part".to_string()))
}

/// Blocking Gemini API client.
///
/// Build it before the async runtime starts; the blocking client owns its own runtime.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    /// Build a client for `base_url` with the fixed request timeout.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("bugai-server")
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{API_VERSION}/models/{MODEL_NAME}:generateContent",
            self.base_url
        )
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, UpstreamError> {
        let payload = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
            system_instruction: Content::text(system_instruction),
        };
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| UpstreamError::Transport(err.without_url().to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| UpstreamError::Transport(err.without_url().to_string()))?;
        if !status.is_success() {
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body,
            });
        }
        first_candidate_text(&body)
    }
}

/// Canned analysis served in mock mode.
pub const MOCK_RESPONSE: &str = r#"Here is the analysis you asked for.

```json
{
  "bugs": [],
  "suggestions": ["Configure GOOGLE_API_KEY and unset BUGAI_UPSTREAM_MODE for live analysis."],
  "explanation": "Mock analysis: the upstream model was not contacted.",
  "correctedCode": ""
}
```
"#;

/// Model client that always answers with the same text.
#[derive(Debug, Clone)]
pub struct ScriptedModelClient {
    response: String,
}

impl ScriptedModelClient {
    /// Answer every prompt with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// Client serving [`MOCK_RESPONSE`].
    pub fn mock() -> Self {
        Self::new(MOCK_RESPONSE)
    }
}

impl ModelClient for ScriptedModelClient {
    fn generate(&self, _system_instruction: &str, _prompt: &str) -> Result<String, UpstreamError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugai_core::extract;
    use httpmock::Method::POST;
    use httpmock::MockServer;

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent";

    #[test]
    fn generate_sends_prompt_and_returns_first_candidate() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("x-goog-api-key", "key-123")
                .json_body(serde_json::json!({
                    "contents": [{"parts": [{"text": "analyze this"}]}],
                    "systemInstruction": {"parts": [{"text": "you are a reviewer"}]}
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "candidates": [
                        {"content": {"parts": [{"text": "first"}]}},
                        {"content": {"parts": [{"text": "second"}]}}
                    ]
                }));
        });

        let client = GeminiClient::new(&server.base_url(), "key-123").expect("client");
        let text = client
            .generate("you are a reviewer", "analyze this")
            .expect("generate");

        mock.assert();
        assert_eq!(text, "first");
    }

    #[test]
    fn non_success_status_carries_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(429).body("quota exceeded");
        });

        let client = GeminiClient::new(&server.base_url(), "key-123").expect("client");
        let err = client.generate("system", "prompt").unwrap_err();

        mock.assert();
        assert_eq!(
            err,
            UpstreamError::Http {
                status: 429,
                body: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn empty_candidates_is_a_protocol_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({"candidates": []}));
        });

        let client = GeminiClient::new(&server.base_url(), "key-123").expect("client");
        let err = client.generate("system", "prompt").unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(_)), "{err}");
    }

    #[test]
    fn unreachable_upstream_is_a_transport_error() {
        let client = GeminiClient::new("http://127.0.0.1:1", "key-123").expect("client");
        let err = client.generate("system", "prompt").unwrap_err();
        match err {
            UpstreamError::Transport(message) => assert!(!message.contains("key-123")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn candidate_text_requires_expected_shape() {
        assert!(matches!(
            first_candidate_text("{}"),
            Err(UpstreamError::Protocol(_))
        ));
        assert!(matches!(
            first_candidate_text(r#"{"candidates": null}"#),
            Err(UpstreamError::Protocol(_))
        ));
        assert!(matches!(
            first_candidate_text(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#),
            Err(UpstreamError::Protocol(_))
        ));
        assert!(matches!(
            first_candidate_text(r#"{"candidates": [{"content": {"parts": []}}]}"#),
            Err(UpstreamError::Protocol(_))
        ));
        assert!(matches!(
            first_candidate_text("not json"),
            Err(UpstreamError::Protocol(_))
        ));
        assert_eq!(
            first_candidate_text(r#"{"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}"#),
            Ok("ok".to_string())
        );
    }

    #[test]
    fn endpoint_uses_fixed_model_and_version() {
        let client = GeminiClient::new("https://example.test/", "key").expect("client");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent"
        );
    }

    #[test]
    fn mock_response_extracts_cleanly() {
        let text = ScriptedModelClient::mock()
            .generate("system", "prompt")
            .expect("generate");
        let result = extract(&text).expect("extract");
        assert!(result.bugs.is_empty());
        assert!(result.explanation.starts_with("Mock analysis"));
    }
}
