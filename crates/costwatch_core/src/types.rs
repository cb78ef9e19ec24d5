//! Identifier newtypes and query payload types — pure value types, no DB
//! dependency.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CostwatchError;

// ── Identifiers ───────────────────────────────────────────────

/// Organization identifier. Opaque to this core; issued by the auth/org
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Inventory item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Payload rows ──────────────────────────────────────────────

/// One entry of the append-only price ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub item_id: ItemId,
    pub price: Decimal,
    pub recorded_at: DateTime<Utc>,
}

/// Price movement of one item over a window, ranked by magnitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub item_id: ItemId,
    pub item_name: String,
    pub price_start: Decimal,
    pub price_end: Decimal,
    pub delta: Decimal,
    /// Absent when the starting price was zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_change: Option<Decimal>,
}

/// Expense sum for one calendar month ("2024-01").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorTotal {
    pub vendor: String,
    pub total: Decimal,
    pub expense_count: i64,
}

/// Item search hit, with the latest ledger price when one exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemMatch {
    pub item_id: ItemId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringTemplate {
    pub template_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount: Decimal,
    pub cadence: String,
}

/// One materialized charge of a recurring template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringCharge {
    pub incurred_on: NaiveDate,
    pub amount: Decimal,
}

/// Latest price of a matching item in one organization — cross-tenant view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgItemPrice {
    pub org_id: OrgId,
    pub org_name: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub price: Decimal,
    pub recorded_at: DateTime<Utc>,
}

/// Total spend of one organization over a window — cross-tenant view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgSpending {
    pub org_id: OrgId,
    pub org_name: String,
    pub total: Decimal,
}

// ── Query output ──────────────────────────────────────────────

/// Template output payload. One variant per distinct payload shape;
/// serialized untagged so callers see the bare rows/aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryData {
    PricePoint(Option<PricePoint>),
    PriceSeries(Vec<PricePoint>),
    PriceChanges(Vec<PriceChange>),
    MonthlyTotals(Vec<MonthTotal>),
    CategoryTotals(Vec<CategoryTotal>),
    VendorTotals(Vec<VendorTotal>),
    Items(Vec<ItemMatch>),
    RecurringTemplates(Vec<RecurringTemplate>),
    RecurringCharges(Vec<RecurringCharge>),
    CrossOrgPrices(Vec<OrgItemPrice>),
    CrossOrgSpending(Vec<OrgSpending>),
}

/// Per-invocation result envelope. Exactly one of `data` / `error` is
/// populated.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn ok(data: QueryData) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.data.is_some()
    }
}

impl From<Result<QueryData, CostwatchError>> for QueryResult {
    fn from(result: Result<QueryData, CostwatchError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_id_display_and_serde() {
        let org = OrgId::from("org-a");
        assert_eq!(org.to_string(), "org-a");
        assert_eq!(serde_json::to_value(&org).unwrap(), "org-a");
        let back: OrgId = serde_json::from_value(serde_json::json!("org-a")).unwrap();
        assert_eq!(back, org);
    }

    #[test]
    fn query_data_serializes_untagged() {
        let data = QueryData::CategoryTotals(vec![CategoryTotal {
            category: "hardware".into(),
            total: Decimal::new(125_50, 2),
        }]);
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["category"], "hardware");
    }

    #[test]
    fn query_result_exactly_one_side() {
        let ok = QueryResult::ok(QueryData::Items(vec![]));
        assert!(ok.is_ok());
        assert!(ok.error.is_none());

        let err = QueryResult::err("boom");
        assert!(!err.is_ok());
        assert!(err.data.is_none());
    }

    #[test]
    fn query_result_envelope_omits_absent_side() {
        let json = serde_json::to_value(QueryResult::err("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "nope" }));
    }

    #[test]
    fn query_result_from_core_error_uses_display() {
        let result: QueryResult =
            Err::<QueryData, _>(CostwatchError::UnknownTemplate("x".into())).into();
        assert_eq!(result.error.as_deref(), Some("unknown template: x"));
    }

    #[test]
    fn price_change_pct_omitted_when_absent() {
        let change = PriceChange {
            item_id: ItemId::from("item-1"),
            item_name: "Widget".into(),
            price_start: Decimal::ZERO,
            price_end: Decimal::new(500, 2),
            delta: Decimal::new(500, 2),
            pct_change: None,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert!(json.get("pct_change").is_none());
    }
}
