//! Client for the Gemini `generateContent` endpoint.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing_futures::Instrument;

use crate::config::AiConfig;
use crate::error::{BackendError, ServiceError, ServiceResult};

use super::CompletionProvider;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|it| it.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeminiClient:{}", self.url)
    }
}

impl GeminiClient {
    pub fn new(c: &AiConfig, api_key: impl ToString) -> Result<GeminiClient, BackendError> {
        let client = Client::builder().timeout(c.timeout()).build()?;

        Ok(GeminiClient {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                c.endpoint.trim_end_matches('/'),
                c.model
            ),
            api_key: api_key.to_string(),
        })
    }
}

#[rocket::async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> ServiceResult<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let span = tracing::info_span!("gemini", url = %self.url);
        async {
            let response = self
                .client
                .post(&self.url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    tracing::warn!("AI request failed: {}", e);
                    ServiceError::Upstream(format!("AI request failed: {}", e))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!("AI provider answered {}: {}", status, body);
                return Err(ServiceError::Upstream(format!(
                    "AI provider answered {}",
                    status
                )));
            }

            let generated: GenerateResponse = response.json().await.map_err(|e| {
                tracing::warn!("unreadable AI response: {}", e);
                ServiceError::Upstream(format!("invalid AI response: {}", e))
            })?;

            generated
                .text()
                .ok_or_else(|| ServiceError::Upstream("AI response had no text.".to_string()))
        }
        .instrument(span)
        .await
    }
}
