//! Row types for sqlx binding, separate from core value types so the SQL
//! column shapes can evolve without touching the domain.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use costwatch_core::types::{
    CategoryTotal, ItemId, ItemMatch, MonthTotal, OrgId, OrgItemPrice, OrgSpending, PriceChange,
    PricePoint, RecurringCharge, RecurringTemplate, VendorTotal,
};

#[derive(Debug, FromRow)]
pub struct PgPricePoint {
    pub item_id: String,
    pub price: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl From<PgPricePoint> for PricePoint {
    fn from(row: PgPricePoint) -> Self {
        Self {
            item_id: ItemId(row.item_id),
            price: row.price,
            recorded_at: row.recorded_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgPriceChange {
    pub item_id: String,
    pub item_name: String,
    pub price_start: Decimal,
    pub price_end: Decimal,
    pub delta: Decimal,
}

impl From<PgPriceChange> for PriceChange {
    fn from(row: PgPriceChange) -> Self {
        // Percentage is derived here rather than in SQL so a zero starting
        // price yields "no percentage" instead of a division error.
        let pct_change = if row.price_start.is_zero() {
            None
        } else {
            Some(row.delta / row.price_start * Decimal::ONE_HUNDRED)
        };
        Self {
            item_id: ItemId(row.item_id),
            item_name: row.item_name,
            price_start: row.price_start,
            price_end: row.price_end,
            delta: row.delta,
            pct_change,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgMonthTotal {
    pub month: NaiveDate,
    pub total: Decimal,
}

impl From<PgMonthTotal> for MonthTotal {
    fn from(row: PgMonthTotal) -> Self {
        Self {
            month: row.month.format("%Y-%m").to_string(),
            total: row.total,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgCategoryTotal {
    pub category: String,
    pub total: Decimal,
}

impl From<PgCategoryTotal> for CategoryTotal {
    fn from(row: PgCategoryTotal) -> Self {
        Self {
            category: row.category,
            total: row.total,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgVendorTotal {
    pub vendor: String,
    pub total: Decimal,
    pub expense_count: i64,
}

impl From<PgVendorTotal> for VendorTotal {
    fn from(row: PgVendorTotal) -> Self {
        Self {
            vendor: row.vendor,
            total: row.total,
            expense_count: row.expense_count,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgItemMatch {
    pub item_id: String,
    pub name: String,
    pub category: Option<String>,
    pub current_price: Option<Decimal>,
}

impl From<PgItemMatch> for ItemMatch {
    fn from(row: PgItemMatch) -> Self {
        Self {
            item_id: ItemId(row.item_id),
            name: row.name,
            category: row.category,
            current_price: row.current_price,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgRecurringTemplate {
    pub template_id: Uuid,
    pub name: String,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub amount: Decimal,
    pub cadence: String,
}

impl From<PgRecurringTemplate> for RecurringTemplate {
    fn from(row: PgRecurringTemplate) -> Self {
        Self {
            template_id: row.template_id,
            name: row.name,
            vendor: row.vendor,
            category: row.category,
            amount: row.amount,
            cadence: row.cadence,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgRecurringCharge {
    pub incurred_on: NaiveDate,
    pub amount: Decimal,
}

impl From<PgRecurringCharge> for RecurringCharge {
    fn from(row: PgRecurringCharge) -> Self {
        Self {
            incurred_on: row.incurred_on,
            amount: row.amount,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgOrgItemPrice {
    pub org_id: String,
    pub org_name: String,
    pub item_id: String,
    pub item_name: String,
    pub price: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl From<PgOrgItemPrice> for OrgItemPrice {
    fn from(row: PgOrgItemPrice) -> Self {
        Self {
            org_id: OrgId(row.org_id),
            org_name: row.org_name,
            item_id: ItemId(row.item_id),
            item_name: row.item_name,
            price: row.price,
            recorded_at: row.recorded_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PgOrgSpending {
    pub org_id: String,
    pub org_name: String,
    pub total: Decimal,
}

impl From<PgOrgSpending> for OrgSpending {
    fn from(row: PgOrgSpending) -> Self {
        Self {
            org_id: OrgId(row.org_id),
            org_name: row.org_name,
            total: row.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_derived_from_delta() {
        let change: PriceChange = PgPriceChange {
            item_id: "item-1".into(),
            item_name: "Widget".into(),
            price_start: Decimal::new(200, 0),
            price_end: Decimal::new(250, 0),
            delta: Decimal::new(50, 0),
        }
        .into();
        assert_eq!(change.pct_change, Some(Decimal::new(25, 0)));
    }

    #[test]
    fn pct_change_absent_for_zero_start() {
        let change: PriceChange = PgPriceChange {
            item_id: "item-1".into(),
            item_name: "Widget".into(),
            price_start: Decimal::ZERO,
            price_end: Decimal::new(5, 0),
            delta: Decimal::new(5, 0),
        }
        .into();
        assert_eq!(change.pct_change, None);
    }

    #[test]
    fn month_formatted_year_dash_month() {
        let total: MonthTotal = PgMonthTotal {
            month: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total: Decimal::new(99, 0),
        }
        .into();
        assert_eq!(total.month, "2024-03");
    }
}
