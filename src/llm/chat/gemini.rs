use async_trait::async_trait;
use log::info;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

// Every field is optional so that an empty or truncated body decodes to
// "no usable text" instead of a parse error.
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

fn extract_text(response: GeminiResponse) -> Option<String> {
    response.candidates?
        .into_iter()
        .next()?
        .content?
        .parts?
        .into_iter()
        .next()?
        .text
        .filter(|t| !t.is_empty())
}

pub struct GeminiChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;
        Ok(Self::new(api_key, config.completion_model.clone(), config.base_url.clone()))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    /// One attempt, no retries; timeouts are whatever the transport gives us.
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        info!("GeminiChatClient::complete() → model={}", self.model);

        let payload = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.http
            .post(self.endpoint())
            .json(&payload)
            .send().await?
            .error_for_status()?;

        let body: GeminiResponse = response.json().await?;
        Ok(CompletionResponse { text: extract_text(body) })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_from_full_response() {
        let body = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "patch the kernel" } ] } }
            ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("patch the kernel"));
    }

    #[test]
    fn test_extract_text_takes_first_candidate_and_part() {
        let body = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "first" }, { "text": "second" } ] } },
                { "content": { "parts": [ { "text": "other candidate" } ] } }
            ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_body_yields_no_text() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(response), None);
    }

    #[test]
    fn test_blank_text_treated_as_absent() {
        let body = r#"{
            "candidates": [ { "content": { "parts": [ { "text": "" } ] } } ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(response), None);
    }

    #[test]
    fn test_request_body_shape() {
        let payload = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "hi".to_string() }],
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "contents": [ { "parts": [ { "text": "hi" } ] } ] })
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig::default();
        assert!(GeminiChatClient::from_config(&config).is_err());

        let config = LlmConfig {
            api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        assert!(GeminiChatClient::from_config(&config).is_err());
    }

    #[test]
    fn test_endpoint_layout() {
        let client = GeminiChatClient::new(
            "secret".to_string(),
            Some("gemini-2.5-flash".to_string()),
            Some("https://example.test/v1beta/models/".to_string())
        );
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent?key=secret"
        );
    }
}
