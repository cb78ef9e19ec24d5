//! Typed parameter records — one per template — and the validated
//! [`TemplateCall`] sum the executor dispatches on.
//!
//! Wire field names are camelCase (the external API contract); binding goes
//! through serde so missing/mistyped fields produce precise messages, then a
//! semantic pass checks what a type system can't (date-range order, limit
//! bounds, non-blank search terms).

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::CostwatchError;
use crate::registry::TemplateName;
use crate::types::{ItemId, OrgId};

/// Rows returned when a ranked template's `limit` is omitted.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on caller-supplied `limit`.
pub const MAX_LIMIT: u32 = 100;

// ── Parameter records ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPriceParams {
    pub org_id: OrgId,
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAtDateParams {
    pub org_id: OrgId,
    pub item_id: ItemId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryParams {
    pub org_id: OrgId,
    pub item_id: ItemId,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPriceChangesParams {
    pub org_id: OrgId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpensesParams {
    pub org_id: OrgId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesByCategoryParams {
    pub org_id: OrgId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopVendorsParams {
    pub org_id: OrgId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemsParams {
    pub org_id: OrgId,
    pub search_term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplatesParams {
    pub org_id: OrgId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpenseHistoryParams {
    pub org_id: OrgId,
    pub template_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossOrgItemPricesParams {
    pub item_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossOrgSpendingParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// ── Validated call ────────────────────────────────────────────

/// A template invocation whose parameters have been bound and validated.
/// One variant per template; dispatch is an exhaustive match.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateCall {
    CurrentPrice(CurrentPriceParams),
    PriceAtDate(PriceAtDateParams),
    PriceHistory(PriceHistoryParams),
    TopPriceChanges(TopPriceChangesParams),
    MonthlyExpenses(MonthlyExpensesParams),
    ExpensesByCategory(ExpensesByCategoryParams),
    TopVendors(TopVendorsParams),
    SearchItems(SearchItemsParams),
    RecurringTemplates(RecurringTemplatesParams),
    RecurringExpenseHistory(RecurringExpenseHistoryParams),
    CrossOrgItemPrices(CrossOrgItemPricesParams),
    CrossOrgSpending(CrossOrgSpendingParams),
}

fn bind_one<T: DeserializeOwned>(name: TemplateName, params: Value) -> Result<T, CostwatchError> {
    serde_json::from_value(params)
        .map_err(|e| CostwatchError::InvalidParams(format!("{name}: {e}")))
}

fn check_range(
    name: TemplateName,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), CostwatchError> {
    if start > end {
        return Err(CostwatchError::InvalidParams(format!(
            "{name}: startDate {start} is after endDate {end}"
        )));
    }
    Ok(())
}

fn check_limit(name: TemplateName, limit: Option<u32>) -> Result<(), CostwatchError> {
    match limit {
        Some(n) if n == 0 || n > MAX_LIMIT => Err(CostwatchError::InvalidParams(format!(
            "{name}: limit must be between 1 and {MAX_LIMIT}, got {n}"
        ))),
        _ => Ok(()),
    }
}

fn check_term(name: TemplateName, field: &str, term: &str) -> Result<(), CostwatchError> {
    if term.trim().is_empty() {
        return Err(CostwatchError::InvalidParams(format!(
            "{name}: {field} must not be blank"
        )));
    }
    Ok(())
}

impl TemplateCall {
    /// Bind raw JSON parameters (already org-scoped by the executor) to the
    /// template's typed record and run semantic validation. Never partially
    /// succeeds: any violation fails the whole call.
    pub fn bind(name: TemplateName, params: Value) -> Result<Self, CostwatchError> {
        let call = match name {
            TemplateName::CurrentPrice => Self::CurrentPrice(bind_one(name, params)?),
            TemplateName::PriceAtDate => Self::PriceAtDate(bind_one(name, params)?),
            TemplateName::PriceHistory => Self::PriceHistory(bind_one(name, params)?),
            TemplateName::TopPriceChanges => Self::TopPriceChanges(bind_one(name, params)?),
            TemplateName::MonthlyExpenses => Self::MonthlyExpenses(bind_one(name, params)?),
            TemplateName::ExpensesByCategory => {
                Self::ExpensesByCategory(bind_one(name, params)?)
            }
            TemplateName::TopVendors => Self::TopVendors(bind_one(name, params)?),
            TemplateName::SearchItems => Self::SearchItems(bind_one(name, params)?),
            TemplateName::RecurringTemplates => {
                Self::RecurringTemplates(bind_one(name, params)?)
            }
            TemplateName::RecurringExpenseHistory => {
                Self::RecurringExpenseHistory(bind_one(name, params)?)
            }
            TemplateName::CrossOrgItemPrices => {
                Self::CrossOrgItemPrices(bind_one(name, params)?)
            }
            TemplateName::CrossOrgSpending => Self::CrossOrgSpending(bind_one(name, params)?),
        };
        call.validate()?;
        Ok(call)
    }

    fn validate(&self) -> Result<(), CostwatchError> {
        match self {
            Self::TopPriceChanges(p) => check_limit(TemplateName::TopPriceChanges, p.limit),
            Self::MonthlyExpenses(p) => {
                check_range(TemplateName::MonthlyExpenses, p.start_date, p.end_date)
            }
            Self::ExpensesByCategory(p) => {
                check_range(TemplateName::ExpensesByCategory, p.start_date, p.end_date)
            }
            Self::TopVendors(p) => {
                check_range(TemplateName::TopVendors, p.start_date, p.end_date)?;
                check_limit(TemplateName::TopVendors, p.limit)
            }
            Self::SearchItems(p) => {
                check_term(TemplateName::SearchItems, "searchTerm", &p.search_term)
            }
            Self::RecurringExpenseHistory(p) => check_range(
                TemplateName::RecurringExpenseHistory,
                p.start_date,
                p.end_date,
            ),
            Self::CrossOrgItemPrices(p) => {
                check_term(TemplateName::CrossOrgItemPrices, "itemName", &p.item_name)
            }
            Self::CrossOrgSpending(p) => {
                check_range(TemplateName::CrossOrgSpending, p.start_date, p.end_date)
            }
            Self::CurrentPrice(_)
            | Self::PriceAtDate(_)
            | Self::PriceHistory(_)
            | Self::RecurringTemplates(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bind_current_price() {
        let call = TemplateCall::bind(
            TemplateName::CurrentPrice,
            json!({ "orgId": "org-a", "itemId": "item-1" }),
        )
        .unwrap();
        assert_eq!(
            call,
            TemplateCall::CurrentPrice(CurrentPriceParams {
                org_id: OrgId::from("org-a"),
                item_id: ItemId::from("item-1"),
            })
        );
    }

    #[test]
    fn bind_reports_missing_field() {
        let err = TemplateCall::bind(TemplateName::CurrentPrice, json!({ "orgId": "org-a" }))
            .unwrap_err();
        match err {
            CostwatchError::InvalidParams(msg) => {
                assert!(msg.contains("itemId"), "message should name the field: {msg}")
            }
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[test]
    fn bind_reports_bad_date() {
        let err = TemplateCall::bind(
            TemplateName::PriceAtDate,
            json!({ "orgId": "org-a", "itemId": "item-1", "date": "yesterday" }),
        )
        .unwrap_err();
        assert!(matches!(err, CostwatchError::InvalidParams(_)));
    }

    #[test]
    fn reversed_date_range_rejected() {
        let err = TemplateCall::bind(
            TemplateName::MonthlyExpenses,
            json!({
                "orgId": "org-a",
                "startDate": "2024-06-01",
                "endDate": "2024-01-01"
            }),
        )
        .unwrap_err();
        match err {
            CostwatchError::InvalidParams(msg) => assert!(msg.contains("after endDate")),
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[test]
    fn limit_bounds_enforced() {
        for bad in [0u32, MAX_LIMIT + 1] {
            let err = TemplateCall::bind(
                TemplateName::TopPriceChanges,
                json!({ "orgId": "org-a", "startDate": "2024-01-01", "limit": bad }),
            )
            .unwrap_err();
            assert!(matches!(err, CostwatchError::InvalidParams(_)), "limit {bad}");
        }
        // Omitted limit is fine — defaulted at dispatch.
        TemplateCall::bind(
            TemplateName::TopPriceChanges,
            json!({ "orgId": "org-a", "startDate": "2024-01-01" }),
        )
        .unwrap();
    }

    #[test]
    fn blank_search_term_rejected() {
        let err = TemplateCall::bind(
            TemplateName::SearchItems,
            json!({ "orgId": "org-a", "searchTerm": "   " }),
        )
        .unwrap_err();
        assert!(matches!(err, CostwatchError::InvalidParams(_)));
    }

    #[test]
    fn cross_org_templates_take_no_org() {
        let call = TemplateCall::bind(
            TemplateName::CrossOrgSpending,
            json!({ "startDate": "2024-01-01", "endDate": "2024-01-31" }),
        )
        .unwrap();
        assert!(matches!(call, TemplateCall::CrossOrgSpending(_)));
    }

    #[test]
    fn recurring_history_parses_uuid() {
        let id = Uuid::new_v4();
        let call = TemplateCall::bind(
            TemplateName::RecurringExpenseHistory,
            json!({
                "orgId": "org-a",
                "templateId": id.to_string(),
                "startDate": "2024-01-01",
                "endDate": "2024-03-31"
            }),
        )
        .unwrap();
        match call {
            TemplateCall::RecurringExpenseHistory(p) => assert_eq!(p.template_id, id),
            other => panic!("unexpected call: {other:?}"),
        }
    }
}
