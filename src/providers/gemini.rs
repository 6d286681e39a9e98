//! Google Gemini provider (`generateContent`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationError, Generator};

pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiProvider {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Text of the first part of the first candidate
fn first_candidate_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(GenerationError::NoCandidates)?;

    candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| GenerationError::InvalidResponse("candidate has no text part".into()))
}

#[async_trait]
impl Generator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!("Calling Gemini model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::InvalidResponse(format!(
                "{}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        first_candidate_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, GenerationError> {
        first_candidate_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_first_candidate_text() {
        let text = parse(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "first"}, {"text": "ignored"}], "role": "model"}},
                    {"content": {"parts": [{"text": "second"}]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(text, "first");
    }

    #[test]
    fn test_no_candidates() {
        assert!(matches!(parse("{}"), Err(GenerationError::NoCandidates)));
        assert!(matches!(
            parse(r#"{"candidates": []}"#),
            Err(GenerationError::NoCandidates)
        ));
    }

    #[test]
    fn test_candidate_without_text() {
        assert!(matches!(
            parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("Hello".into()),
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(
            "https://generativelanguage.googleapis.com/v1beta/".into(),
            "gemini-1.5-flash-latest".into(),
            "key".into(),
        );
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
    }
}
