//! The template registry — a closed, compile-time-checked set of read-only
//! query templates.
//!
//! Callers address templates by name only. The set is fixed at build time:
//! adding or removing a template means adding or removing an enum variant,
//! and every `match` over [`TemplateName`] is exhaustive, so the registry,
//! the parameter records, and the dispatcher cannot drift apart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::context::{QueryContext, Scope};

/// Which scopes may invoke a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRequirement {
    /// Callable from both single-org and global scope.
    AnyScope,
    /// Spans tenants: requires global scope with `can_compare_orgs`.
    CrossOrgOnly,
}

/// Names of the query templates, in registration order.
///
/// Declaration order is the listing order — [`TemplateName::all`] and
/// therefore `available_templates` are deterministic across calls.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateName {
    CurrentPrice,
    PriceAtDate,
    PriceHistory,
    TopPriceChanges,
    MonthlyExpenses,
    ExpensesByCategory,
    TopVendors,
    SearchItems,
    RecurringTemplates,
    RecurringExpenseHistory,
    CrossOrgItemPrices,
    CrossOrgSpending,
}

impl TemplateName {
    /// Parse a wire-format name ("current_price"). `None` for anything not
    /// in the registry.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// All templates in registration order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn scope_requirement(self) -> ScopeRequirement {
        match self {
            Self::CrossOrgItemPrices | Self::CrossOrgSpending => ScopeRequirement::CrossOrgOnly,
            _ => ScopeRequirement::AnyScope,
        }
    }

    /// Whether the template is keyed by a single organization. The two
    /// cross-org templates are inherently multi-tenant and take no `orgId`.
    pub fn requires_org(self) -> bool {
        !matches!(self, Self::CrossOrgItemPrices | Self::CrossOrgSpending)
    }

    /// Availability check for a resolved context.
    pub fn available_for(self, ctx: &QueryContext) -> bool {
        match self.scope_requirement() {
            ScopeRequirement::AnyScope => true,
            ScopeRequirement::CrossOrgOnly => {
                ctx.scope == Scope::Global && ctx.can_compare_orgs
            }
        }
    }

    /// One-line purpose, surfaced to API clients and the chat planner.
    pub fn description(self) -> &'static str {
        match self {
            Self::CurrentPrice => "latest recorded price of an item as of now",
            Self::PriceAtDate => "price of an item as of a given date",
            Self::PriceHistory => "ordered price series of an item since a date",
            Self::TopPriceChanges => "items ranked by price-change magnitude since a date",
            Self::MonthlyExpenses => "expense totals per calendar month over a date range",
            Self::ExpensesByCategory => "expense totals grouped by category over a date range",
            Self::TopVendors => "vendors ranked by spend over a date range",
            Self::SearchItems => "items matching a free-text search term",
            Self::RecurringTemplates => "recurring expense templates of an organization",
            Self::RecurringExpenseHistory => {
                "charges of one recurring template over a date range"
            }
            Self::CrossOrgItemPrices => {
                "latest price of a named item across all organizations"
            }
            Self::CrossOrgSpending => "total spend per organization over a date range",
        }
    }

    /// JSON-schema object for the template's parameters. Used by the chat
    /// planner's function-call definition and by API docs. `orgId` is never
    /// listed as required — the executor defaults it from context.
    pub fn param_schema(self) -> Value {
        let org_id = json!({
            "type": "string",
            "description": "organization id; defaults to the caller's active organization"
        });
        let date = |desc: &str| json!({ "type": "string", "format": "date", "description": desc });
        let limit = json!({
            "type": "integer",
            "minimum": 1,
            "maximum": 100,
            "description": "maximum rows to return (default 10)"
        });

        match self {
            Self::CurrentPrice => json!({
                "type": "object",
                "properties": { "orgId": org_id, "itemId": { "type": "string" } },
                "required": ["itemId"]
            }),
            Self::PriceAtDate => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "itemId": { "type": "string" },
                    "date": date("as-of date")
                },
                "required": ["itemId", "date"]
            }),
            Self::PriceHistory => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "itemId": { "type": "string" },
                    "startDate": date("start of the series")
                },
                "required": ["itemId", "startDate"]
            }),
            Self::TopPriceChanges => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "startDate": date("start of the comparison window"),
                    "limit": limit
                },
                "required": ["startDate"]
            }),
            Self::MonthlyExpenses => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "startDate": date("range start (inclusive)"),
                    "endDate": date("range end (inclusive)")
                },
                "required": ["startDate", "endDate"]
            }),
            Self::ExpensesByCategory => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "startDate": date("range start (inclusive)"),
                    "endDate": date("range end (inclusive)")
                },
                "required": ["startDate", "endDate"]
            }),
            Self::TopVendors => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "startDate": date("range start (inclusive)"),
                    "endDate": date("range end (inclusive)"),
                    "limit": limit
                },
                "required": ["startDate", "endDate"]
            }),
            Self::SearchItems => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "searchTerm": { "type": "string", "minLength": 1 }
                },
                "required": ["searchTerm"]
            }),
            Self::RecurringTemplates => json!({
                "type": "object",
                "properties": { "orgId": org_id },
                "required": []
            }),
            Self::RecurringExpenseHistory => json!({
                "type": "object",
                "properties": {
                    "orgId": org_id,
                    "templateId": { "type": "string", "format": "uuid" },
                    "startDate": date("range start (inclusive)"),
                    "endDate": date("range end (inclusive)")
                },
                "required": ["templateId", "startDate", "endDate"]
            }),
            Self::CrossOrgItemPrices => json!({
                "type": "object",
                "properties": { "itemName": { "type": "string", "minLength": 1 } },
                "required": ["itemName"]
            }),
            Self::CrossOrgSpending => json!({
                "type": "object",
                "properties": {
                    "startDate": date("range start (inclusive)"),
                    "endDate": date("range end (inclusive)")
                },
                "required": ["startDate", "endDate"]
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QueryContext;
    use crate::types::OrgId;

    fn org_ctx() -> QueryContext {
        QueryContext::org_scoped("alice", None, vec![OrgId::from("org-a")], None)
    }

    #[test]
    fn wire_names_round_trip() {
        for name in TemplateName::all() {
            let wire = name.to_string();
            assert_eq!(TemplateName::parse(&wire), Some(name), "{wire}");
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(TemplateName::parse("price_of_tea"), None);
        assert_eq!(TemplateName::parse("CurrentPrice"), None);
    }

    #[test]
    fn registration_order_is_stable() {
        let first: Vec<_> = TemplateName::all().collect();
        let second: Vec<_> = TemplateName::all().collect();
        assert_eq!(first, second);
        assert_eq!(first[0], TemplateName::CurrentPrice);
        assert_eq!(*first.last().unwrap(), TemplateName::CrossOrgSpending);
        assert_eq!(first.len(), 12);
    }

    #[test]
    fn cross_org_templates_gated_to_global() {
        let org = org_ctx();
        let global = QueryContext::global("root", None, None);

        assert!(!TemplateName::CrossOrgItemPrices.available_for(&org));
        assert!(!TemplateName::CrossOrgSpending.available_for(&org));
        assert!(TemplateName::CrossOrgItemPrices.available_for(&global));
        assert!(TemplateName::CrossOrgSpending.available_for(&global));
    }

    #[test]
    fn any_scope_templates_available_everywhere() {
        let org = org_ctx();
        let global = QueryContext::global("root", None, None);
        for name in TemplateName::all().filter(|t| t.requires_org()) {
            assert!(name.available_for(&org), "{name} should be ORG-callable");
            assert!(name.available_for(&global), "{name} should be GLOBAL-callable");
        }
    }

    #[test]
    fn only_cross_org_templates_omit_org() {
        let no_org: Vec<_> = TemplateName::all().filter(|t| !t.requires_org()).collect();
        assert_eq!(
            no_org,
            vec![
                TemplateName::CrossOrgItemPrices,
                TemplateName::CrossOrgSpending
            ]
        );
    }

    #[test]
    fn param_schemas_never_require_org_id() {
        for name in TemplateName::all() {
            let schema = name.param_schema();
            let required = schema["required"].as_array().unwrap();
            assert!(
                !required.iter().any(|v| v == "orgId"),
                "{name} must not require orgId"
            );
        }
    }

    #[test]
    fn serde_names_match_strum_names() {
        for name in TemplateName::all() {
            let serde_form = serde_json::to_value(name).unwrap();
            assert_eq!(serde_form, name.to_string());
        }
    }
}
