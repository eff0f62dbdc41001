use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::llm::parser::parse_oracle_response;
use crate::llm::prompts::{ClassificationRequest, SYSTEM_PROMPT};
use crate::llm::provider::OracleProvider;
use crate::models::OracleVerdict;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiOracle {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| "gpt-4.1-mini".to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl OracleProvider for OpenAiOracle {
    async fn classify(&self, request: &ClassificationRequest) -> Result<OracleVerdict> {
        tracing::debug!("Sending {} chars to {}", request.text.len(), self.model);

        let request_body = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.to_prompt(),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::OracleApi(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::OracleApi(format!("OpenAI API error ({}): {}", status, body)));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::OracleApi(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(error) = result.error {
            return Err(Error::OracleApi(error.message));
        }

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::OracleApi("Empty response from OpenAI".to_string()));
        }

        parse_oracle_response(&text)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
