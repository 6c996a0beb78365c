//! Gemini REST backend (`models/{model}:generateContent`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

use super::{GenerationRequest, GenerativeBackend};

#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.response_schema,
                temperature: request.temperature,
            },
        };

        // Key goes in a header so it never shows up in a logged URL
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&body_text),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        extract_text(parsed).ok_or(ProviderError::EmptyBody)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenated text of the first candidate, if it has any.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates?.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let message = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{}: {}", status, message),
                _ => message,
            })
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    const KEY: &str = "test-key";

    async fn fake_gemini(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(KEY) {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": 403, "message": "bad key", "status": "PERMISSION_DENIED"}})),
            );
        }
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "ARRAY");

        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
        let text = if prompt.contains("silence") {
            String::new()
        } else {
            r#"[{"senderName":"Dave the Plumber","content":"That's me!","emoji":"🔧"}]"#.to_string()
        };
        (
            StatusCode::OK,
            Json(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})),
        )
    }

    async fn spawn_fake() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(fake_gemini);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1beta/models", addr)
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            temperature: 1.2,
            response_schema: super::super::schema::reply_schema(),
        }
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let url = spawn_fake().await;
        let backend = GeminiBackend::new(KEY, "gemini-2.5-flash", url);
        let text = backend.generate(&request("plumber?")).await.unwrap();
        assert!(text.contains("Dave the Plumber"));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let url = spawn_fake().await;
        let backend = GeminiBackend::new("wrong", "gemini-2.5-flash", url);
        match backend.generate(&request("plumber?")).await {
            Err(ProviderError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "PERMISSION_DENIED: bad key");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn blank_candidate_text_is_an_empty_body() {
        let url = spawn_fake().await;
        let backend = GeminiBackend::new(KEY, "gemini-2.5-flash", url);
        let result = backend.generate(&request("silence please")).await;
        assert!(matches!(result, Err(ProviderError::EmptyBody)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = GeminiBackend::new(KEY, "gemini-2.5-flash", format!("http://{}", addr));
        let result = backend.generate(&request("anyone?")).await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("gateway exploded"), "gateway exploded");
    }
}
