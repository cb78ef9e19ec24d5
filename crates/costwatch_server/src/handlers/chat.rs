//! POST /assistant/chat — natural-language entry point.
//!
//! The pipeline's proposal is executed through the same executor as the
//! direct endpoint; scope is re-validated on every call regardless of what
//! the model suggested.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Deserialize;

use costwatch_agent::{ChatPipeline, ChatResponse};
use costwatch_core::context::Session;
use costwatch_core::resolve_context;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub async fn chat(
    Extension(session): Extension<Session>,
    Extension(pipeline): Extension<Arc<ChatPipeline>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let ctx = resolve_context(&session)
        .ok_or_else(|| AppError::forbidden("caller has no organization scope"))?;
    let response = pipeline.handle(&ctx, &req.message).await?;
    Ok(Json(response))
}
