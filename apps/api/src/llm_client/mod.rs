//! Gemini client. Every generative API call goes through this module.
//!
//! The model name is fixed in [`MODEL`].
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod schema;

/// The model used for every analysis call.
pub const MODEL: &str = "gemini-2.5-flash-preview-09-2025";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No Gemini API key configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    system_instruction: RequestContent<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Text of `candidates[0].content.parts[0]`.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// A model that answers a system instruction plus user payload with
/// schema-constrained JSON text.
///
/// Carried in `AppState` as `Arc<dyn SwotModel>`.
#[async_trait]
pub trait SwotModel: Send + Sync {
    async fn generate_json(&self, system: &str, content: &str) -> Result<String, LlmError>;
}

/// The Gemini `generateContent` client.
/// One request per call: no retries, no streaming.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{MODEL}:generateContent", self.base_url)
    }

    /// Makes a raw call to the API, returning the decoded response envelope.
    pub async fn call(
        &self,
        content: &str,
        system: &str,
        response_schema: Value,
    ) -> Result<GenerateContentResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: content }],
            }],
            system_instruction: RequestContent {
                parts: vec![RequestPart { text: system }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}", status);
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let decoded: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &decoded.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(decoded)
    }
}

#[async_trait]
impl SwotModel for LlmClient {
    async fn generate_json(&self, system: &str, content: &str) -> Result<String, LlmError> {
        let response = self.call(content, system, schema::swot_response_schema()).await?;
        response
            .text()
            .map(String::from)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        key: Arc<Mutex<Option<String>>>,
        body: Arc<Mutex<Option<Value>>>,
    }

    /// Serves `reply` for any generateContent call and records what it got.
    async fn fake_gemini(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured = Captured::default();
        let path = format!("/v1beta/models/{MODEL}:generateContent");
        let app = Router::new()
            .route(
                &path,
                post(
                    move |State(c): State<Captured>,
                          Query(q): Query<std::collections::HashMap<String, String>>,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            *c.key.lock().unwrap() = q.get("key").cloned();
                            *c.body.lock().unwrap() = Some(body);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    #[tokio::test]
    async fn test_request_shape_and_response_text() {
        let reply = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"summary\":\"s\"}"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        });
        let (base, captured) = fake_gemini(StatusCode::OK, reply).await;
        let client = LlmClient::new(Some("secret".into()), &base).unwrap();

        let text = client.generate_json("be an analyst", "my cv").await.unwrap();
        assert_eq!(text, "{\"summary\":\"s\"}");

        assert_eq!(captured.key.lock().unwrap().as_deref(), Some("secret"));
        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "my cv");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be an analyst");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["properties"]["threats"]["type"],
            "ARRAY"
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let reply = json!({"error": {"code": 400, "message": "API key not valid"}});
        let (base, _) = fake_gemini(StatusCode::BAD_REQUEST, reply).await;
        let client = LlmClient::new(Some("bad".into()), &base).unwrap();

        match client.generate_json("s", "c").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_content() {
        let (base, _) = fake_gemini(StatusCode::OK, json!({"candidates": []})).await;
        let client = LlmClient::new(Some("k".into()), &base).unwrap();
        assert!(matches!(
            client.generate_json("s", "c").await,
            Err(LlmError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        // Port 9 (discard) is never contacted: the key check comes first.
        let client = LlmClient::new(None, "http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.generate_json("s", "c").await,
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn test_response_text_path() {
        let decoded: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "first"}, {"text": "second"}]}}]
        }))
        .unwrap();
        assert_eq!(decoded.text(), Some("first"));

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(blocked.text(), None);
    }
}
