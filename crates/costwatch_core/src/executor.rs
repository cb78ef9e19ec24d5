//! The query template executor — gate, validate, dispatch.
//!
//! Every entry point (direct API, chat pipeline) goes through [`QueryExecutor`],
//! so the tenant-isolation boundary is enforced here on every call rather than
//! at any single route layer. Within one call, validation strictly precedes
//! dispatch; across calls there is no shared mutable state.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::QueryContext;
use crate::error::CostwatchError;
use crate::params::{TemplateCall, DEFAULT_LIMIT};
use crate::ports::ReadStore;
use crate::registry::TemplateName;
use crate::types::{OrgId, QueryData, QueryResult};

pub struct QueryExecutor {
    store: Arc<dyn ReadStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn ReadStore>) -> Self {
        Self { store }
    }

    /// Templates invocable under `ctx`, in registration order. Deterministic
    /// across repeated calls.
    pub fn available_templates(&self, ctx: &QueryContext) -> Vec<TemplateName> {
        TemplateName::all()
            .filter(|t| t.available_for(ctx))
            .collect()
    }

    /// Run a template and fold any failure into the data-xor-error envelope.
    /// Nothing escapes as an error value — the chat pipeline and other
    /// callers always receive a structured result.
    pub async fn execute(&self, ctx: &QueryContext, template: &str, params: Value) -> QueryResult {
        self.try_execute(ctx, template, params).await.into()
    }

    /// Run a template, keeping the typed error for callers that map failure
    /// classes themselves (the HTTP layer maps `http_status()`).
    pub async fn try_execute(
        &self,
        ctx: &QueryContext,
        template: &str,
        params: Value,
    ) -> Result<QueryData, CostwatchError> {
        let name = TemplateName::parse(template)
            .ok_or_else(|| CostwatchError::UnknownTemplate(template.to_string()))?;

        if !name.available_for(ctx) {
            tracing::warn!(
                caller = %ctx.caller_id,
                template = %name,
                "denied: template not available in caller scope"
            );
            return Err(CostwatchError::TemplateUnavailable(name));
        }

        let params = self.scope_params(ctx, name, params)?;
        let call = TemplateCall::bind(name, params)?;

        self.dispatch(call).await.map_err(|cause| {
            tracing::error!(
                template = %name,
                error = %format!("{cause:#}"),
                "store fetch failed"
            );
            CostwatchError::Fetch(cause)
        })
    }

    /// Org-scope injection and enforcement — the tenant-isolation boundary.
    ///
    /// For org-keyed templates: an omitted `orgId` is defaulted from the
    /// context (active org, else first allowed); a present `orgId` under ORG
    /// scope must be one of the caller's organizations. The two cross-org
    /// templates skip this entirely — they are inherently multi-tenant and
    /// already gated by `available_for`.
    fn scope_params(
        &self,
        ctx: &QueryContext,
        name: TemplateName,
        params: Value,
    ) -> Result<Value, CostwatchError> {
        let mut map = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(CostwatchError::InvalidParams(format!(
                    "{name}: parameters must be a JSON object"
                )))
            }
        };

        if name.requires_org() {
            let org = match map.get("orgId") {
                Some(Value::String(s)) => OrgId(s.clone()),
                Some(_) => {
                    return Err(CostwatchError::InvalidParams(format!(
                        "{name}: orgId must be a string"
                    )))
                }
                None => {
                    let org = ctx
                        .default_org()
                        .cloned()
                        .ok_or(CostwatchError::NoOrgInScope(name))?;
                    map.insert("orgId".into(), Value::String(org.0.clone()));
                    org
                }
            };

            if !ctx.may_access(&org) {
                tracing::warn!(
                    caller = %ctx.caller_id,
                    org = %org,
                    template = %name,
                    "denied: organization outside caller scope"
                );
                return Err(CostwatchError::OrgAccessDenied(org));
            }
        }

        Ok(Value::Object(map))
    }

    async fn dispatch(&self, call: TemplateCall) -> anyhow::Result<QueryData> {
        match call {
            TemplateCall::CurrentPrice(p) => Ok(QueryData::PricePoint(
                self.store.current_price(&p.org_id, &p.item_id).await?,
            )),
            TemplateCall::PriceAtDate(p) => Ok(QueryData::PricePoint(
                self.store.price_at(&p.org_id, &p.item_id, p.date).await?,
            )),
            TemplateCall::PriceHistory(p) => Ok(QueryData::PriceSeries(
                self.store
                    .price_history(&p.org_id, &p.item_id, p.start_date)
                    .await?,
            )),
            TemplateCall::TopPriceChanges(p) => Ok(QueryData::PriceChanges(
                self.store
                    .top_price_changes(&p.org_id, p.start_date, p.limit.unwrap_or(DEFAULT_LIMIT))
                    .await?,
            )),
            TemplateCall::MonthlyExpenses(p) => Ok(QueryData::MonthlyTotals(
                self.store
                    .monthly_expenses(&p.org_id, p.start_date, p.end_date)
                    .await?,
            )),
            TemplateCall::ExpensesByCategory(p) => Ok(QueryData::CategoryTotals(
                self.store
                    .expenses_by_category(&p.org_id, p.start_date, p.end_date)
                    .await?,
            )),
            TemplateCall::TopVendors(p) => Ok(QueryData::VendorTotals(
                self.store
                    .top_vendors(
                        &p.org_id,
                        p.start_date,
                        p.end_date,
                        p.limit.unwrap_or(DEFAULT_LIMIT),
                    )
                    .await?,
            )),
            TemplateCall::SearchItems(p) => Ok(QueryData::Items(
                self.store.search_items(&p.org_id, &p.search_term).await?,
            )),
            TemplateCall::RecurringTemplates(p) => Ok(QueryData::RecurringTemplates(
                self.store.recurring_templates(&p.org_id).await?,
            )),
            TemplateCall::RecurringExpenseHistory(p) => Ok(QueryData::RecurringCharges(
                self.store
                    .recurring_expense_history(&p.org_id, p.template_id, p.start_date, p.end_date)
                    .await?,
            )),
            TemplateCall::CrossOrgItemPrices(p) => Ok(QueryData::CrossOrgPrices(
                self.store.cross_org_item_prices(&p.item_name).await?,
            )),
            TemplateCall::CrossOrgSpending(p) => Ok(QueryData::CrossOrgSpending(
                self.store.cross_org_spending(p.start_date, p.end_date).await?,
            )),
        }
    }
}
