//! POST /assistant/query — direct template invocation.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use costwatch_core::context::Session;
use costwatch_core::executor::QueryExecutor;
use costwatch_core::resolve_context;
use costwatch_core::types::QueryData;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub template: String,
    /// Template parameters; `orgId` may be omitted and is defaulted from
    /// the caller's context.
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub data: QueryData,
}

pub async fn run_query(
    Extension(session): Extension<Session>,
    Extension(executor): Extension<Arc<QueryExecutor>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let ctx = resolve_context(&session)
        .ok_or_else(|| AppError::forbidden("caller has no organization scope"))?;
    let data = executor.try_execute(&ctx, &req.template, req.params).await?;
    Ok(Json(QueryResponse { data }))
}
