//! LLM-driven chat pipeline for the Costwatch assistant.
//!
//! Natural language goes in; a template proposal comes back from the model;
//! the core executor validates and runs it; a second completion summarizes
//! the result. The executor — not the model — owns authorization.

pub mod llm_client;
pub mod openai_client;
pub mod pipeline;
pub mod planner;

pub use llm_client::{LlmClient, ToolCallResult, ToolDefinition};
pub use openai_client::OpenAiClient;
pub use pipeline::{ChatError, ChatPipeline, ChatResponse};
