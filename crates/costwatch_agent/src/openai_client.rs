//! OpenAI implementation of [`LlmClient`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::llm_client::{LlmClient, ToolCallResult, ToolDefinition};

const DEFAULT_MODEL: &str = "gpt-4o";
const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self {
            api_key,
            client: reqwest::Client::new(),
            model,
        }
    }

    pub fn with_model(api_key: String, model: &str) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            model: model.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key))
    }

    async fn post(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let response = self
            .post(serde_json::json!({
                "model": &self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": 0.1
            }))
            .await?;

        #[derive(Deserialize)]
        struct Message {
            content: String,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await?;
        api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("OpenAI returned no choices"))
    }

    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult> {
        let response = self
            .post(serde_json::json!({
                "model": &self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": 0.1,
                "functions": [{
                    "name": &tool.name,
                    "description": &tool.description,
                    "parameters": &tool.parameters
                }],
                "function_call": {"name": &tool.name}
            }))
            .await?;

        // Response shape:
        // { "choices": [{ "message": { "function_call": { "name", "arguments" } } }] }
        // where "arguments" is a JSON string.
        #[derive(Deserialize)]
        struct FunctionCall {
            name: String,
            arguments: String,
        }
        #[derive(Deserialize)]
        struct Message {
            function_call: Option<FunctionCall>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("failed to parse OpenAI response: {e}"))?;

        let function_call = api_response
            .choices
            .first()
            .and_then(|c| c.message.function_call.as_ref())
            .ok_or_else(|| anyhow!("no function_call in OpenAI response"))?;

        tracing::debug!(arguments = %function_call.arguments, "model tool call");

        let arguments: serde_json::Value = serde_json::from_str(&function_call.arguments)
            .map_err(|e| anyhow!("failed to parse function arguments: {e}"))?;

        Ok(ToolCallResult {
            tool_name: function_call.name.clone(),
            arguments,
        })
    }
}
