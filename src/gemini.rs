use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Generation backend seen by the reply pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// Gemini generateContent request format
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

// Gemini generateContent response format (only what we read)
#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

// Google API error body: {"error": {"code", "message", "status"}}
#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: HttpClient,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: HttpClient, api_base: &str, api_key: String, model: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        // model may be given with or without the "models/" prefix
        let model = self.model.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, model = %self.model, "Gemini API returned an error");
            return Err(api_error(status.as_u16(), &body_text));
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| GenerationError::Decode(e.without_url()))?;
        extract_text(parsed).ok_or(GenerationError::EmptyResponse)
    }
}

// Concatenate every text part of the first candidate
fn extract_text(resp: GenerateContentResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() { None } else { Some(text) }
}

/// Build the error for a non-2xx Gemini response.
///
/// The message carries the numeric status plus a label in the style of
/// Google's client libraries, e.g. `400 InvalidArgument: INVALID_ARGUMENT: ...`.
pub fn api_error(status: u16, body: &str) -> GenerationError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let message = match (envelope.error.status.is_empty(), envelope.error.message.is_empty()) {
        (false, false) => format!("{}: {}", envelope.error.status, envelope.error.message),
        (true, false) => envelope.error.message,
        _ => body.trim().to_string(),
    };
    GenerationError::Api {
        status,
        label: status_label(status, &envelope.error.status),
        message,
    }
}

fn status_label(status: u16, google_status: &str) -> &'static str {
    match (google_status, status) {
        ("INVALID_ARGUMENT", _) | ("", 400) => "InvalidArgument",
        ("RESOURCE_EXHAUSTED", _) | ("", 429) => "ResourceExhausted",
        ("UNAUTHENTICATED", _) | ("", 401) => "Unauthenticated",
        ("PERMISSION_DENIED", _) | ("", 403) => "PermissionDenied",
        ("NOT_FOUND", _) | ("", 404) => "NotFound",
        ("FAILED_PRECONDITION", _) => "FailedPrecondition",
        ("INTERNAL", _) | ("", 500) => "InternalServerError",
        ("UNAVAILABLE", _) | ("", 503) => "ServiceUnavailable",
        ("DEADLINE_EXCEEDED", _) | ("", 504) => "DeadlineExceeded",
        _ => "GoogleAPICallError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_joins_parts_of_first_candidate() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"role":"model","parts":[{"text":"hi "},{"text":"there"}]}},
                {"content":{"role":"model","parts":[{"text":"ignored"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(resp).as_deref(), Some("hi there"));
    }

    #[test]
    fn extract_text_is_none_for_blocked_prompt() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(extract_text(resp).is_none());
    }

    #[test]
    fn quota_error_mentions_429() {
        let err = api_error(
            429,
            r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("ResourceExhausted"));
    }

    #[test]
    fn bad_request_is_labelled_invalid_argument() {
        let err = api_error(
            400,
            r#"{"error":{"code":400,"message":"Request contains an invalid argument.","status":"INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "400 InvalidArgument: INVALID_ARGUMENT: Request contains an invalid argument."
        );
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let err = api_error(502, "  upstream connect error  ");
        assert_eq!(err.to_string(), "502 GoogleAPICallError: upstream connect error");
    }

    #[test]
    fn endpoint_strips_models_prefix() {
        let client = GeminiClient::new(
            HttpClient::new(),
            "https://example.test/v1beta/",
            "k".to_string(),
            "models/gemini-2.0-flash".to_string(),
        );
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn transport_error_does_not_expose_api_key() {
        let client = GeminiClient::new(
            HttpClient::new(),
            "http://127.0.0.1:1/v1beta",
            "SECRET429KEY".to_string(),
            "m".to_string(),
        );

        let err = client.generate("hi").await.unwrap_err();

        assert!(matches!(err, GenerationError::Transport(_)));
        let text = err.to_string();
        assert!(!text.contains("SECRET429KEY"), "key leaked: {text}");
        assert!(!text.contains("127.0.0.1"), "url leaked: {text}");
    }
}
