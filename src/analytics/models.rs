use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Reporting period selecting the aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    /// Unknown values fall back to the monthly report rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "weekly" => Period::Weekly,
            "yearly" => Period::Yearly,
            _ => Period::Monthly,
        }
    }

    /// Label describing the window the trend is compared against.
    pub fn comparison_label(&self) -> &'static str {
        match self {
            Period::Weekly => "previous week",
            Period::Monthly => "previous month",
            Period::Yearly => "previous year",
        }
    }
}

/// Query parameters for the analytics report
#[derive(Debug, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// Reporting period: weekly, monthly, or yearly (default monthly)
    #[param(example = "monthly")]
    pub period: Option<String>,
}

/// Direction of a category's spend relative to the previous window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

/// Per-category expense aggregate with its trend against the previous window
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category_id: i32,
    /// Category name
    #[schema(example = "Groceries")]
    pub name: String,
    /// Total expense amount in the current window
    pub value: Decimal,
    /// Monthly budget ceiling (0 when none is set)
    pub budget: Decimal,
    /// Number of expense transactions in the window
    pub transaction_count: i64,
    pub trend: TrendDirection,
    /// Absolute percentage change vs the previous window
    #[schema(example = 12.5)]
    pub percentage: f64,
    /// Human label for the comparison window
    #[schema(example = "previous month")]
    pub comparison: &'static str,
}

/// One bucket of the income-vs-expenses series
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Display label: day of month for daily buckets, month abbreviation
    /// for monthly buckets
    #[schema(example = "15")]
    pub period: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

/// One of the window's highest-amount expenses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopExpense {
    pub id: i32,
    /// Transaction description
    #[schema(example = "New laptop")]
    pub name: String,
    /// Category name, or a fallback when uncategorized
    #[schema(example = "Electronics")]
    pub category: String,
    pub category_id: Option<i32>,
    pub amount: Decimal,
    /// Short day/month display date
    #[schema(example = "07/06")]
    pub date: String,
}

/// A category whose spend moved noticeably vs the previous window
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendEntry {
    pub category_id: i32,
    pub name: String,
    pub trend: TrendDirection,
    pub percentage: f64,
    pub comparison: &'static str,
}

/// Window-level totals
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// Income minus expenses
    pub savings: Decimal,
    /// Spend across all categories as a rounded percentage of the summed
    /// thresholds; 0 when no thresholds are defined
    #[schema(example = 85)]
    pub budget_used: i64,
    pub transaction_count: i64,
}

/// Full analytics payload; all aggregates are computed in one request and
/// a failure in any of them fails the whole response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub category_spending: Vec<CategorySpend>,
    pub income_vs_expenses: Vec<SeriesPoint>,
    pub top_expenses: Vec<TopExpense>,
    pub trends: Vec<TrendEntry>,
    pub summary: Summary,
}

/// Raw per-category aggregate row for the current window
#[derive(Debug, FromRow)]
pub struct CategorySpendRow {
    pub id: i32,
    pub name: String,
    pub threshold: Option<Decimal>,
    pub total_amount: Decimal,
    pub transaction_count: i64,
}

/// Raw per-category aggregate row for the previous window
#[derive(Debug, FromRow)]
pub struct PreviousSpendRow {
    pub id: i32,
    pub total_amount: Decimal,
}

/// Raw time-series row keyed by the SQL bucket string
#[derive(Debug, FromRow)]
pub struct SeriesRow {
    pub bucket: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

/// Raw top-expense row joined with the category name
#[derive(Debug, FromRow)]
pub struct TopExpenseRow {
    pub id: i32,
    pub description: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
}

/// Raw window totals row
#[derive(Debug, FromRow)]
pub struct SummaryRow {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub transaction_count: i64,
}
