//! Generative Language API client for interview summaries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::summary::{SummaryError, SummaryGenerator, summary_prompt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GeminiSummaryClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiSummaryClient {
    pub fn new(endpoint: &str, model: &str, api_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("tsunagu/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[async_trait]
impl SummaryGenerator for GeminiSummaryClient {
    async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let prompt = summary_prompt(text);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| SummaryError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                target = "tsunagu::infra::summary",
                status = status.as_u16(),
                detail = %detail,
                "summary request rejected"
            );
            return Err(SummaryError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| SummaryError::Request(err.to_string()))?;
        parsed.first_text().ok_or(SummaryError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_text_is_joined_and_trimmed() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"地域の"},{"text":"子育て団体です。\n"}]}},{"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .expect("parse");
        assert_eq!(parsed.first_text().as_deref(), Some("地域の子育て団体です。"));
    }

    #[test]
    fn missing_candidates_yield_nothing() {
        let parsed: GenerateResponse = serde_json::from_str("{}").expect("parse");
        assert!(parsed.first_text().is_none());
    }

    #[test]
    fn url_uses_model_and_trims_slash() {
        let client = GeminiSummaryClient::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-1.5-flash",
            "key".into(),
        )
        .expect("client");
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
