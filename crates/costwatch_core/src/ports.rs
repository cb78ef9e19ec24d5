//! Port trait for the read-only data fetches behind the template registry.
//!
//! The production implementation lives in `costwatch_postgres`; tests use
//! in-memory fakes. Adapters return `anyhow::Error` for their failures —
//! classification into the caller-facing taxonomy happens in the executor.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::{
    CategoryTotal, ItemId, ItemMatch, MonthTotal, OrgId, OrgItemPrice, OrgSpending, PriceChange,
    PricePoint, RecurringCharge, RecurringTemplate, VendorTotal,
};

pub type StoreResult<T> = anyhow::Result<T>;

/// Read-only store behind the query templates, one method per fetch.
/// All methods are side-effect-free reads; concurrent calls need no
/// coordination.
#[async_trait]
pub trait ReadStore: Send + Sync {
    async fn current_price(&self, org: &OrgId, item: &ItemId) -> StoreResult<Option<PricePoint>>;

    /// Latest ledger entry at or before `date`.
    async fn price_at(
        &self,
        org: &OrgId,
        item: &ItemId,
        date: NaiveDate,
    ) -> StoreResult<Option<PricePoint>>;

    /// Ascending price series since `since`.
    async fn price_history(
        &self,
        org: &OrgId,
        item: &ItemId,
        since: NaiveDate,
    ) -> StoreResult<Vec<PricePoint>>;

    async fn top_price_changes(
        &self,
        org: &OrgId,
        since: NaiveDate,
        limit: u32,
    ) -> StoreResult<Vec<PriceChange>>;

    async fn monthly_expenses(
        &self,
        org: &OrgId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<MonthTotal>>;

    async fn expenses_by_category(
        &self,
        org: &OrgId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CategoryTotal>>;

    async fn top_vendors(
        &self,
        org: &OrgId,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> StoreResult<Vec<VendorTotal>>;

    async fn search_items(&self, org: &OrgId, term: &str) -> StoreResult<Vec<ItemMatch>>;

    async fn recurring_templates(&self, org: &OrgId) -> StoreResult<Vec<RecurringTemplate>>;

    async fn recurring_expense_history(
        &self,
        org: &OrgId,
        template_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<RecurringCharge>>;

    /// Latest price of every item matching `item_name`, across all
    /// organizations. Only reachable through cross-org-gated templates.
    async fn cross_org_item_prices(&self, item_name: &str) -> StoreResult<Vec<OrgItemPrice>>;

    /// Total spend per organization over the window, across all
    /// organizations. Only reachable through cross-org-gated templates.
    async fn cross_org_spending(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<OrgSpending>>;
}
