//! Postgres implementation of the core `ReadStore` port.
//!
//! A newtype wrapping PgPool. All SQL is runtime-checked (`sqlx::query_as`,
//! not the compile-time macros) to avoid a compile-time DB requirement.
//! Every query is keyed by `org_id` except the two cross-org reads, which
//! are only reachable through scope-gated templates upstream.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use costwatch_core::ports::{ReadStore, StoreResult};
use costwatch_core::types::{
    CategoryTotal, ItemId, ItemMatch, MonthTotal, OrgId, OrgItemPrice, OrgSpending, PriceChange,
    PricePoint, RecurringCharge, RecurringTemplate, VendorTotal,
};

use crate::rows::*;

/// Postgres-backed read store over the expense/price schema.
pub struct PgReadStore {
    pool: PgPool,
}

impl PgReadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadStore for PgReadStore {
    async fn current_price(&self, org: &OrgId, item: &ItemId) -> StoreResult<Option<PricePoint>> {
        let row = sqlx::query_as::<_, PgPricePoint>(
            r#"
            SELECT item_id, price, recorded_at
            FROM item_prices
            WHERE org_id = $1 AND item_id = $2
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(&org.0)
        .bind(&item.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn price_at(
        &self,
        org: &OrgId,
        item: &ItemId,
        date: NaiveDate,
    ) -> StoreResult<Option<PricePoint>> {
        // Point-in-time read over the append-only ledger: the newest entry
        // recorded on or before the cutoff date.
        let row = sqlx::query_as::<_, PgPricePoint>(
            r#"
            SELECT item_id, price, recorded_at
            FROM item_prices
            WHERE org_id = $1 AND item_id = $2 AND recorded_at::date <= $3
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(&org.0)
        .bind(&item.0)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn price_history(
        &self,
        org: &OrgId,
        item: &ItemId,
        since: NaiveDate,
    ) -> StoreResult<Vec<PricePoint>> {
        let rows = sqlx::query_as::<_, PgPricePoint>(
            r#"
            SELECT item_id, price, recorded_at
            FROM item_prices
            WHERE org_id = $1 AND item_id = $2 AND recorded_at::date >= $3
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(&org.0)
        .bind(&item.0)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn top_price_changes(
        &self,
        org: &OrgId,
        since: NaiveDate,
        limit: u32,
    ) -> StoreResult<Vec<PriceChange>> {
        let rows = sqlx::query_as::<_, PgPriceChange>(
            r#"
            WITH bounds AS (
                SELECT item_id,
                       (array_agg(price ORDER BY recorded_at ASC))[1]  AS price_start,
                       (array_agg(price ORDER BY recorded_at DESC))[1] AS price_end
                FROM item_prices
                WHERE org_id = $1 AND recorded_at::date >= $2
                GROUP BY item_id
            )
            SELECT b.item_id, i.name AS item_name,
                   b.price_start, b.price_end,
                   b.price_end - b.price_start AS delta
            FROM bounds b
            JOIN items i ON i.org_id = $1 AND i.item_id = b.item_id
            WHERE b.price_end <> b.price_start
            ORDER BY abs(b.price_end - b.price_start) DESC
            LIMIT $3
            "#,
        )
        .bind(&org.0)
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn monthly_expenses(
        &self,
        org: &OrgId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<MonthTotal>> {
        let rows = sqlx::query_as::<_, PgMonthTotal>(
            r#"
            SELECT date_trunc('month', incurred_on)::date AS month,
                   sum(amount) AS total
            FROM expenses
            WHERE org_id = $1 AND incurred_on BETWEEN $2 AND $3
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(&org.0)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn expenses_by_category(
        &self,
        org: &OrgId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CategoryTotal>> {
        let rows = sqlx::query_as::<_, PgCategoryTotal>(
            r#"
            SELECT coalesce(category, 'uncategorized') AS category,
                   sum(amount) AS total
            FROM expenses
            WHERE org_id = $1 AND incurred_on BETWEEN $2 AND $3
            GROUP BY 1
            ORDER BY total DESC
            "#,
        )
        .bind(&org.0)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn top_vendors(
        &self,
        org: &OrgId,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> StoreResult<Vec<VendorTotal>> {
        let rows = sqlx::query_as::<_, PgVendorTotal>(
            r#"
            SELECT vendor,
                   sum(amount) AS total,
                   count(*)    AS expense_count
            FROM expenses
            WHERE org_id = $1 AND incurred_on BETWEEN $2 AND $3
            GROUP BY vendor
            ORDER BY total DESC
            LIMIT $4
            "#,
        )
        .bind(&org.0)
        .bind(from)
        .bind(to)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_items(&self, org: &OrgId, term: &str) -> StoreResult<Vec<ItemMatch>> {
        let rows = sqlx::query_as::<_, PgItemMatch>(
            r#"
            SELECT i.item_id, i.name, i.category, p.price AS current_price
            FROM items i
            LEFT JOIN LATERAL (
                SELECT price
                FROM item_prices
                WHERE org_id = i.org_id AND item_id = i.item_id
                ORDER BY recorded_at DESC
                LIMIT 1
            ) p ON true
            WHERE i.org_id = $1 AND i.name ILIKE '%' || $2 || '%'
            ORDER BY i.name
            LIMIT 50
            "#,
        )
        .bind(&org.0)
        .bind(term)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recurring_templates(&self, org: &OrgId) -> StoreResult<Vec<RecurringTemplate>> {
        let rows = sqlx::query_as::<_, PgRecurringTemplate>(
            r#"
            SELECT template_id, name, vendor, category, amount, cadence
            FROM recurring_templates
            WHERE org_id = $1
            ORDER BY name
            "#,
        )
        .bind(&org.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recurring_expense_history(
        &self,
        org: &OrgId,
        template_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<RecurringCharge>> {
        let rows = sqlx::query_as::<_, PgRecurringCharge>(
            r#"
            SELECT incurred_on, amount
            FROM expenses
            WHERE org_id = $1
              AND recurring_template_id = $2
              AND incurred_on BETWEEN $3 AND $4
            ORDER BY incurred_on ASC
            "#,
        )
        .bind(&org.0)
        .bind(template_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn cross_org_item_prices(&self, item_name: &str) -> StoreResult<Vec<OrgItemPrice>> {
        tracing::debug!(item_name, "cross-org price comparison");
        let rows = sqlx::query_as::<_, PgOrgItemPrice>(
            r#"
            SELECT i.org_id, o.name AS org_name,
                   i.item_id, i.name AS item_name,
                   p.price, p.recorded_at
            FROM items i
            JOIN organizations o ON o.org_id = i.org_id
            JOIN LATERAL (
                SELECT price, recorded_at
                FROM item_prices
                WHERE org_id = i.org_id AND item_id = i.item_id
                ORDER BY recorded_at DESC
                LIMIT 1
            ) p ON true
            WHERE i.name ILIKE '%' || $1 || '%'
            ORDER BY p.price ASC
            "#,
        )
        .bind(item_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn cross_org_spending(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<OrgSpending>> {
        tracing::debug!(%from, %to, "cross-org spending aggregate");
        let rows = sqlx::query_as::<_, PgOrgSpending>(
            r#"
            SELECT e.org_id, o.name AS org_name, sum(e.amount) AS total
            FROM expenses e
            JOIN organizations o ON o.org_id = e.org_id
            WHERE e.incurred_on BETWEEN $1 AND $2
            GROUP BY e.org_id, o.name
            ORDER BY total DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
