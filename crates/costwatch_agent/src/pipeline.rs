//! The chat pipeline: plan → execute → summarize.
//!
//! Two sequential LLM calls (the second depends on the first's output), each
//! bounded by a caller-supplied deadline. The executor sits between them as
//! the security boundary — a proposed `{ template, params }` pair is
//! re-validated identically to a direct API call, so a confused or
//! adversarial proposal cannot cross tenant lines.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;

use costwatch_core::context::QueryContext;
use costwatch_core::executor::QueryExecutor;
use costwatch_core::registry::TemplateName;
use costwatch_core::types::{QueryData, QueryResult};

use crate::llm_client::LlmClient;
use crate::planner;

const SUMMARIZE_SYSTEM_PROMPT: &str =
    "You are the Costwatch assistant. Summarize the query result for the user in \
     one short paragraph. If the result is an error, explain it plainly and do not \
     speculate about data you cannot see. Never invent numbers.";

/// Fallback when the model neither proposes a template nor replies.
const FALLBACK_REPLY: &str =
    "I couldn't find a query that answers that. Try asking about prices, expenses, \
     vendors, or recurring charges.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("assistant deadline exceeded")]
    DeadlineExceeded,

    #[error("language model call failed")]
    Llm(#[source] anyhow::Error),

    #[error("malformed model proposal: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// The template that was run, when the model proposed one the registry
    /// recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateName>,
    /// Query payload backing the reply; absent for direct replies and for
    /// failed queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,
}

pub struct ChatPipeline {
    llm: Arc<dyn LlmClient>,
    executor: Arc<QueryExecutor>,
    deadline: Duration,
}

impl ChatPipeline {
    pub fn new(llm: Arc<dyn LlmClient>, executor: Arc<QueryExecutor>, deadline: Duration) -> Self {
        Self {
            llm,
            executor,
            deadline,
        }
    }

    /// Answer one user message under the caller's resolved context.
    pub async fn handle(
        &self,
        ctx: &QueryContext,
        message: &str,
    ) -> Result<ChatResponse, ChatError> {
        let available = self.executor.available_templates(ctx);
        let tool = planner::propose_tool(&available);
        let system = planner::system_prompt(&available);

        let call = timeout(self.deadline, self.llm.chat_with_tool(&system, message, &tool))
            .await
            .map_err(|_| ChatError::DeadlineExceeded)?
            .map_err(ChatError::Llm)?;
        let proposal =
            planner::parse_proposal(&call).map_err(|e| ChatError::Malformed(e.to_string()))?;

        let Some(template) = proposal.template else {
            return Ok(ChatResponse {
                reply: proposal.reply.unwrap_or_else(|| FALLBACK_REPLY.to_string()),
                template: None,
                data: None,
            });
        };

        tracing::debug!(caller = %ctx.caller_id, template = %template, "model proposed template");

        // The executor re-validates scope and parameters; the proposal gets
        // no special trust.
        let result: QueryResult = self
            .executor
            .execute(ctx, &template, proposal.params.unwrap_or(serde_json::json!({})))
            .await;

        let summary_input = format!(
            "User question: {message}\nTemplate: {template}\nResult: {}",
            serde_json::to_value(&result).unwrap_or_default()
        );
        let reply = timeout(
            self.deadline,
            self.llm.chat(SUMMARIZE_SYSTEM_PROMPT, &summary_input),
        )
        .await
        .map_err(|_| ChatError::DeadlineExceeded)?
        .map_err(ChatError::Llm)?;

        Ok(ChatResponse {
            reply,
            template: TemplateName::parse(&template),
            data: result.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use uuid::Uuid;

    use costwatch_core::context::QueryContext;
    use costwatch_core::ports::{ReadStore, StoreResult};
    use costwatch_core::types::*;

    use super::*;
    use crate::llm_client::{ToolCallResult, ToolDefinition};

    // ── Stub store ────────────────────────────────────────────

    struct StubStore;

    #[async_trait]
    impl ReadStore for StubStore {
        async fn current_price(
            &self,
            _org: &OrgId,
            item: &ItemId,
        ) -> StoreResult<Option<PricePoint>> {
            Ok(Some(PricePoint {
                item_id: item.clone(),
                price: rust_decimal::Decimal::new(4_99, 2),
                recorded_at: chrono::Utc::now(),
            }))
        }
        async fn price_at(
            &self,
            _org: &OrgId,
            _item: &ItemId,
            _date: NaiveDate,
        ) -> StoreResult<Option<PricePoint>> {
            Ok(None)
        }
        async fn price_history(
            &self,
            _org: &OrgId,
            _item: &ItemId,
            _since: NaiveDate,
        ) -> StoreResult<Vec<PricePoint>> {
            Ok(vec![])
        }
        async fn top_price_changes(
            &self,
            _org: &OrgId,
            _since: NaiveDate,
            _limit: u32,
        ) -> StoreResult<Vec<PriceChange>> {
            Ok(vec![])
        }
        async fn monthly_expenses(
            &self,
            _org: &OrgId,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> StoreResult<Vec<MonthTotal>> {
            Ok(vec![])
        }
        async fn expenses_by_category(
            &self,
            _org: &OrgId,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> StoreResult<Vec<CategoryTotal>> {
            Ok(vec![])
        }
        async fn top_vendors(
            &self,
            _org: &OrgId,
            _from: NaiveDate,
            _to: NaiveDate,
            _limit: u32,
        ) -> StoreResult<Vec<VendorTotal>> {
            Ok(vec![])
        }
        async fn search_items(&self, _org: &OrgId, _term: &str) -> StoreResult<Vec<ItemMatch>> {
            Ok(vec![])
        }
        async fn recurring_templates(
            &self,
            _org: &OrgId,
        ) -> StoreResult<Vec<RecurringTemplate>> {
            Ok(vec![])
        }
        async fn recurring_expense_history(
            &self,
            _org: &OrgId,
            _template_id: Uuid,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> StoreResult<Vec<RecurringCharge>> {
            Ok(vec![])
        }
        async fn cross_org_item_prices(
            &self,
            _item_name: &str,
        ) -> StoreResult<Vec<OrgItemPrice>> {
            Ok(vec![])
        }
        async fn cross_org_spending(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> StoreResult<Vec<OrgSpending>> {
            Ok(vec![])
        }
    }

    // ── Scripted LLM ──────────────────────────────────────────

    struct FakeLlm {
        proposal: serde_json::Value,
        summary: &'static str,
        /// Tool definitions seen by `chat_with_tool`, for assertions.
        seen_tools: Mutex<Vec<ToolDefinition>>,
    }

    impl FakeLlm {
        fn proposing(proposal: serde_json::Value) -> Self {
            Self {
                proposal,
                summary: "Here is what I found.",
                seen_tools: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlm {
        async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.summary.to_string())
        }

        async fn chat_with_tool(
            &self,
            _system: &str,
            _user: &str,
            tool: &ToolDefinition,
        ) -> Result<ToolCallResult> {
            self.seen_tools.lock().unwrap().push(tool.clone());
            Ok(ToolCallResult {
                tool_name: planner::PROPOSE_TOOL_NAME.into(),
                arguments: self.proposal.clone(),
            })
        }
    }

    /// Hangs past any reasonable deadline.
    struct StallingLlm;

    #[async_trait]
    impl LlmClient for StallingLlm {
        async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        async fn chat_with_tool(
            &self,
            _system: &str,
            _user: &str,
            _tool: &ToolDefinition,
        ) -> Result<ToolCallResult> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn executor() -> Arc<QueryExecutor> {
        Arc::new(QueryExecutor::new(Arc::new(StubStore)))
    }

    fn org_ctx() -> QueryContext {
        QueryContext::org_scoped(
            "alice",
            None,
            vec![OrgId::from("org-a")],
            Some(OrgId::from("org-a")),
        )
    }

    fn pipeline(llm: Arc<dyn LlmClient>) -> ChatPipeline {
        ChatPipeline::new(llm, executor(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn proposal_is_executed_and_summarized() {
        let llm = Arc::new(FakeLlm::proposing(json!({
            "template": "current_price",
            "params": { "itemId": "item-1" }
        })));
        let resp = pipeline(llm).handle(&org_ctx(), "what does item-1 cost?").await.unwrap();
        assert_eq!(resp.reply, "Here is what I found.");
        assert_eq!(resp.template, Some(TemplateName::CurrentPrice));
        assert!(matches!(resp.data, Some(QueryData::PricePoint(Some(_)))));
    }

    #[tokio::test]
    async fn direct_reply_skips_execution() {
        let llm = Arc::new(FakeLlm::proposing(json!({
            "reply": "I can only answer expense and price questions."
        })));
        let resp = pipeline(llm).handle(&org_ctx(), "tell me a joke").await.unwrap();
        assert!(resp.template.is_none());
        assert!(resp.data.is_none());
        assert!(resp.reply.contains("expense and price"));
    }

    #[tokio::test]
    async fn cross_tenant_proposal_yields_no_data() {
        // The model proposes a foreign org; the executor must deny it, and
        // the user gets a summary of the denial with no payload attached.
        let llm = Arc::new(FakeLlm::proposing(json!({
            "template": "current_price",
            "params": { "itemId": "item-1", "orgId": "org-b" }
        })));
        let resp = pipeline(llm).handle(&org_ctx(), "price in org-b?").await.unwrap();
        assert!(resp.data.is_none(), "denied query must not leak data");
        assert_eq!(resp.template, Some(TemplateName::CurrentPrice));
    }

    #[tokio::test]
    async fn offered_tool_respects_caller_scope() {
        let llm = Arc::new(FakeLlm::proposing(json!({ "reply": "ok" })));
        let pipeline = ChatPipeline::new(
            Arc::clone(&llm) as Arc<dyn LlmClient>,
            executor(),
            Duration::from_secs(30),
        );
        pipeline.handle(&org_ctx(), "hello").await.unwrap();

        let tools = llm.seen_tools.lock().unwrap();
        let names = tools[0].parameters["properties"]["template"]["enum"]
            .as_array()
            .unwrap()
            .clone();
        assert!(!names.contains(&json!("cross_org_spending")));
        assert!(!names.contains(&json!("cross_org_item_prices")));
        assert!(names.contains(&json!("current_price")));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_model_hits_deadline() {
        let pipeline = ChatPipeline::new(
            Arc::new(StallingLlm),
            executor(),
            Duration::from_secs(5),
        );
        let err = pipeline.handle(&org_ctx(), "anything").await.unwrap_err();
        assert!(matches!(err, ChatError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn empty_proposal_is_malformed() {
        let llm = Arc::new(FakeLlm::proposing(json!({})));
        let err = pipeline(llm).handle(&org_ctx(), "hm").await.unwrap_err();
        assert!(matches!(err, ChatError::Malformed(_)));
    }
}
