//! Template proposal — turning a natural-language message into a
//! `{ template, params }` pair via one function-calling completion.
//!
//! The tool offered to the model only enumerates templates available to the
//! caller's scope, but nothing here is trusted: the executor re-validates
//! the proposal exactly like a direct API call.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::json;

use costwatch_core::registry::TemplateName;

use crate::llm_client::{ToolCallResult, ToolDefinition};

pub const PROPOSE_TOOL_NAME: &str = "propose_query";

/// The model's answer: either a template invocation or a direct reply when
/// no template fits the question.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryProposal {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub reply: Option<String>,
}

/// Build the proposal tool for the caller's available templates.
pub fn propose_tool(available: &[TemplateName]) -> ToolDefinition {
    let names: Vec<String> = available.iter().map(|t| t.to_string()).collect();
    ToolDefinition {
        name: PROPOSE_TOOL_NAME.to_string(),
        description:
            "Select the query template that answers the user's question, or reply directly \
             when none fits."
                .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "template": {
                    "type": "string",
                    "enum": names,
                    "description": "name of the template to run"
                },
                "params": {
                    "type": "object",
                    "description": "parameters for the chosen template, per its schema"
                },
                "reply": {
                    "type": "string",
                    "description": "direct answer when no template applies"
                }
            }
        }),
    }
}

/// System prompt listing each available template with its parameter schema.
pub fn system_prompt(available: &[TemplateName]) -> String {
    let mut prompt = String::from(
        "You are the Costwatch assistant. You answer questions about an \
         organization's expenses and item prices by selecting exactly one query \
         template and its parameters. Dates are ISO 8601 (YYYY-MM-DD). Omit \
         orgId unless the user names a specific organization. If the question \
         cannot be answered by any template, set only `reply`.\n\nTemplates:\n",
    );
    for name in available {
        prompt.push_str(&format!(
            "- {name}: {}\n  parameters: {}\n",
            name.description(),
            name.param_schema()
        ));
    }
    prompt
}

/// Parse the model's tool call into a proposal.
pub fn parse_proposal(call: &ToolCallResult) -> Result<QueryProposal> {
    if call.tool_name != PROPOSE_TOOL_NAME {
        return Err(anyhow!("unexpected tool call: {}", call.tool_name));
    }
    let proposal: QueryProposal = serde_json::from_value(call.arguments.clone())
        .map_err(|e| anyhow!("malformed proposal arguments: {e}"))?;
    if proposal.template.is_none() && proposal.reply.is_none() {
        return Err(anyhow!("proposal carries neither template nor reply"));
    }
    Ok(proposal)
}
