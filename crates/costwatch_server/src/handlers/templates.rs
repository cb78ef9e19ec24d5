//! GET /assistant/templates — the templates this caller may invoke.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;

use costwatch_core::context::Session;
use costwatch_core::executor::QueryExecutor;
use costwatch_core::registry::TemplateName;
use costwatch_core::resolve_context;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub name: TemplateName,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateInfo>,
}

pub async fn list_templates(
    Extension(session): Extension<Session>,
    Extension(executor): Extension<Arc<QueryExecutor>>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let ctx = resolve_context(&session)
        .ok_or_else(|| AppError::forbidden("caller has no organization scope"))?;
    let templates = executor
        .available_templates(&ctx)
        .into_iter()
        .map(|name| TemplateInfo {
            name,
            description: name.description(),
            parameters: name.param_schema(),
        })
        .collect();
    Ok(Json(TemplateListResponse { templates }))
}
