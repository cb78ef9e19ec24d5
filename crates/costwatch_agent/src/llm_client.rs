//! LLM client abstraction.
//!
//! The pipeline depends on this trait, not on a vendor — tests script it,
//! production wires [`crate::openai_client::OpenAiClient`].

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A function-calling tool definition passed to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the tool's arguments.
    pub parameters: serde_json::Value,
}

/// The model's structured tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Free-form completion.
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Completion forced through a single tool; returns the parsed call.
    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult>;
}
