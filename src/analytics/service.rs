use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::models::{
    AnalyticsResponse, CategorySpend, CategorySpendRow, Period, PreviousSpendRow, SeriesPoint,
    SeriesRow, Summary, SummaryRow, TopExpense, TopExpenseRow, TrendDirection, TrendEntry,
};
use crate::errors::AppError;

/// Category trends below this absolute percentage are treated as noise and
/// left out of the trends list.
const SIGNIFICANT_TREND_PERCENTAGE: f64 = 5.0;

const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Stateless analytics aggregation over the transaction store. One request
/// computes all five aggregates; a failure in any query fails the whole
/// response, never partial results.
pub struct AnalyticsService;

/// The aggregation window for a period, anchored at `now`. All queries
/// filter with `date >= start AND date < end`.
pub fn period_window(period: Period, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    match period {
        Period::Weekly => (now - Duration::days(7), now),
        Period::Monthly => {
            let start = start_of_day(now.year(), now.month(), 1);
            let last = last_day_of_month(now.year(), now.month());
            let end = end_of_day(now.year(), now.month(), last);
            (start, end)
        }
        Period::Yearly => {
            let start = start_of_day(now.year(), 1, 1);
            let end = end_of_day(now.year(), 12, 31);
            (start, end)
        }
    }
}

/// The comparison window: the same bounds shifted back one period unit.
/// Used only to compute trend percentages, never returned to the caller.
pub fn previous_window(
    period: Period,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match period {
        Period::Weekly => (start - Duration::days(7), end - Duration::days(7)),
        Period::Monthly => (
            start.checked_sub_months(Months::new(1)).unwrap_or(start),
            end.checked_sub_months(Months::new(1)).unwrap_or(end),
        ),
        Period::Yearly => (
            start.with_year(start.year() - 1).unwrap_or(start),
            end.with_year(end.year() - 1).unwrap_or(end),
        ),
    }
}

fn start_of_day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    // Only called with in-range calendar components
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default(),
    )
}

fn end_of_day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .unwrap_or_default(),
    )
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Percentage change against the previous window. A window that had no
/// spend counts as a 100% increase when spend appears, and 0% when both
/// windows are empty; flat or growing spend trends up, shrinking trends
/// down, and the magnitude is always reported as an absolute value.
pub fn compute_trend(current: f64, previous: f64) -> (TrendDirection, f64) {
    let trend_percentage = if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    };

    let direction = if trend_percentage >= 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    (direction, trend_percentage.abs())
}

/// Pair current-window category aggregates with the previous window's and
/// attach trend data.
pub fn build_category_spending(
    rows: Vec<CategorySpendRow>,
    previous: Vec<PreviousSpendRow>,
    period: Period,
) -> Vec<CategorySpend> {
    let previous_by_id: HashMap<i32, Decimal> = previous
        .into_iter()
        .map(|row| (row.id, row.total_amount))
        .collect();

    rows.into_iter()
        .map(|row| {
            let previous_amount = previous_by_id
                .get(&row.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let (trend, percentage) = compute_trend(
                row.total_amount.to_f64().unwrap_or(0.0),
                previous_amount.to_f64().unwrap_or(0.0),
            );

            CategorySpend {
                category_id: row.id,
                name: row.name,
                value: row.total_amount,
                budget: row.threshold.unwrap_or(Decimal::ZERO),
                transaction_count: row.transaction_count,
                trend,
                percentage,
                comparison: period.comparison_label(),
            }
        })
        .collect()
}

/// Spend across all categories as a rounded percentage of the summed
/// thresholds. Guarded against division by zero: no thresholds means 0,
/// never NaN or infinity.
pub fn budget_used(spending: &[CategorySpend]) -> i64 {
    let total_budget: Decimal = spending.iter().map(|c| c.budget).sum();
    if total_budget <= Decimal::ZERO {
        return 0;
    }

    let total_value: Decimal = spending.iter().map(|c| c.value).sum();
    (total_value / total_budget * Decimal::from(100))
        .to_f64()
        .unwrap_or(0.0)
        .round() as i64
}

/// The category movements worth surfacing: absolute change above the noise
/// threshold.
pub fn significant_trends(spending: &[CategorySpend]) -> Vec<TrendEntry> {
    spending
        .iter()
        .filter(|c| c.percentage > SIGNIFICANT_TREND_PERCENTAGE)
        .map(|c| TrendEntry {
            category_id: c.category_id,
            name: c.name.clone(),
            trend: c.trend,
            percentage: c.percentage,
            comparison: c.comparison,
        })
        .collect()
}

/// Display label for a daily bucket key (`YYYY-MM-DD`): the day of month
/// without a leading zero.
pub fn daily_label(bucket: &str) -> String {
    bucket
        .get(8..10)
        .and_then(|day| day.parse::<u32>().ok())
        .map(|day| day.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Display label for a monthly bucket key (`YYYY-MM`): the abbreviated
/// month name.
pub fn monthly_label(bucket: &str) -> String {
    bucket
        .get(5..7)
        .and_then(|month| month.parse::<usize>().ok())
        .and_then(|month| month.checked_sub(1))
        .and_then(|idx| MONTH_ABBREV.get(idx))
        .map(|name| name.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn build_series(rows: Vec<SeriesRow>, period: Period) -> Vec<SeriesPoint> {
    rows.into_iter()
        .map(|row| {
            let label = match period {
                Period::Weekly | Period::Monthly => daily_label(&row.bucket),
                Period::Yearly => monthly_label(&row.bucket),
            };
            SeriesPoint {
                period: label,
                income: row.income,
                expenses: row.expenses,
            }
        })
        .collect()
}

fn build_top_expenses(rows: Vec<TopExpenseRow>) -> Vec<TopExpense> {
    rows.into_iter()
        .map(|row| TopExpense {
            id: row.id,
            name: row.description,
            category: row
                .category_name
                .unwrap_or_else(|| "Uncategorized".to_string()),
            category_id: row.category_id,
            amount: row.amount,
            date: row.date.format("%d/%m").to_string(),
        })
        .collect()
}

impl AnalyticsService {
    /// Compute the full analytics payload for a period.
    pub async fn run(pool: &PgPool, period: Period) -> Result<AnalyticsResponse, AppError> {
        let now = Utc::now();
        let (start, end) = period_window(period, now);
        let (prev_start, prev_end) = previous_window(period, start, end);

        // 1. Expense totals per category over the current window; the left
        // join keeps categories with no matching transactions at zero.
        let spend_rows = sqlx::query_as::<_, CategorySpendRow>(
            r#"
            SELECT c.id, c.name, c.threshold,
                   COALESCE(SUM(t.amount), 0) AS total_amount,
                   COUNT(t.id) AS transaction_count
            FROM categories c
            LEFT JOIN transactions t
                   ON t.category_id = c.id
                  AND t.type = 'expense'
                  AND t.date >= $1 AND t.date < $2
            GROUP BY c.id, c.name, c.threshold
            ORDER BY c.id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 2. Same aggregation over the previous window, for the trend deltas
        let previous_rows = sqlx::query_as::<_, PreviousSpendRow>(
            r#"
            SELECT c.id, COALESCE(SUM(t.amount), 0) AS total_amount
            FROM categories c
            LEFT JOIN transactions t
                   ON t.category_id = c.id
                  AND t.type = 'expense'
                  AND t.date >= $1 AND t.date < $2
            GROUP BY c.id
            "#,
        )
        .bind(prev_start)
        .bind(prev_end)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 3. Income vs expenses bucketed by day (weekly/monthly) or month
        // (yearly), ascending bucket order
        let bucket_format = match period {
            Period::Weekly | Period::Monthly => "YYYY-MM-DD",
            Period::Yearly => "YYYY-MM",
        };
        let series_rows = sqlx::query_as::<_, SeriesRow>(&format!(
            r#"
            SELECT to_char(t.date, '{bucket_format}') AS bucket,
                   COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount ELSE 0 END), 0) AS income,
                   COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount ELSE 0 END), 0) AS expenses
            FROM transactions t
            WHERE t.date >= $1 AND t.date < $2
            GROUP BY bucket
            ORDER BY bucket
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 4. The five largest expenses in the window
        let top_rows = sqlx::query_as::<_, TopExpenseRow>(
            r#"
            SELECT t.id, t.description, t.amount, t.date, t.category_id,
                   c.name AS category_name
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.type = 'expense' AND t.date >= $1 AND t.date < $2
            ORDER BY t.amount DESC
            LIMIT 5
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 5. Window totals
        let summary_row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0) AS total_income,
                   COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0) AS total_expense,
                   COUNT(*) AS transaction_count
            FROM transactions
            WHERE date >= $1 AND date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let category_spending = build_category_spending(spend_rows, previous_rows, period);
        let trends = significant_trends(&category_spending);
        let budget_used = budget_used(&category_spending);

        Ok(AnalyticsResponse {
            income_vs_expenses: build_series(series_rows, period),
            top_expenses: build_top_expenses(top_rows),
            trends,
            summary: Summary {
                total_income: summary_row.total_income,
                total_expenses: summary_row.total_expense,
                savings: summary_row.total_income - summary_row.total_expense,
                budget_used,
                transaction_count: summary_row.transaction_count,
            },
            category_spending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, min, sec)
                .unwrap(),
        )
    }

    fn spend_row(
        id: i32,
        name: &str,
        threshold: Option<i64>,
        total: i64,
        count: i64,
    ) -> CategorySpendRow {
        CategorySpendRow {
            id,
            name: name.to_string(),
            threshold: threshold.map(Decimal::from),
            total_amount: Decimal::from(total),
            transaction_count: count,
        }
    }

    #[test]
    fn test_weekly_window_spans_seven_days() {
        let now = utc(2025, 6, 15, 12, 0, 0);
        let (start, end) = period_window(Period::Weekly, now);

        assert_eq!(start, utc(2025, 6, 8, 12, 0, 0));
        assert_eq!(end, now);
    }

    #[test]
    fn test_monthly_window_covers_the_whole_month() {
        let now = utc(2025, 6, 15, 12, 0, 0);
        let (start, end) = period_window(Period::Monthly, now);

        assert_eq!(start, utc(2025, 6, 1, 0, 0, 0));
        assert_eq!(end, utc(2025, 6, 30, 23, 59, 59));
    }

    #[test]
    fn test_yearly_window_covers_the_whole_year() {
        let now = utc(2025, 6, 15, 12, 0, 0);
        let (start, end) = period_window(Period::Yearly, now);

        assert_eq!(start, utc(2025, 1, 1, 0, 0, 0));
        assert_eq!(end, utc(2025, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_previous_window_shifts_back_one_unit() {
        let now = utc(2025, 6, 15, 12, 0, 0);

        let (start, end) = period_window(Period::Weekly, now);
        let (prev_start, prev_end) = previous_window(Period::Weekly, start, end);
        assert_eq!(prev_start, utc(2025, 6, 1, 12, 0, 0));
        assert_eq!(prev_end, utc(2025, 6, 8, 12, 0, 0));

        let (start, end) = period_window(Period::Monthly, now);
        let (prev_start, prev_end) = previous_window(Period::Monthly, start, end);
        assert_eq!(prev_start, utc(2025, 5, 1, 0, 0, 0));
        assert_eq!(prev_end, utc(2025, 5, 30, 23, 59, 59));

        let (start, end) = period_window(Period::Yearly, now);
        let (prev_start, prev_end) = previous_window(Period::Yearly, start, end);
        assert_eq!(prev_start, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(prev_end, utc(2024, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_previous_monthly_window_clamps_short_months() {
        // March 31 shifted back one month clamps to February's last day
        let now = utc(2025, 3, 31, 12, 0, 0);
        let (start, end) = period_window(Period::Monthly, now);
        let (prev_start, prev_end) = previous_window(Period::Monthly, start, end);

        assert_eq!(prev_start, utc(2025, 2, 1, 0, 0, 0));
        assert_eq!(prev_end, utc(2025, 2, 28, 23, 59, 59));
    }

    #[test]
    fn test_trend_from_zero_previous_is_full_increase() {
        let (trend, percentage) = compute_trend(100.0, 0.0);
        assert_eq!(trend, TrendDirection::Up);
        assert_eq!(percentage, 100.0);
    }

    #[test]
    fn test_trend_decrease_is_down_with_absolute_percentage() {
        let (trend, percentage) = compute_trend(150.0, 200.0);
        assert_eq!(trend, TrendDirection::Down);
        assert_eq!(percentage, 25.0);
    }

    #[test]
    fn test_trend_with_no_spend_at_all_is_flat() {
        let (trend, percentage) = compute_trend(0.0, 0.0);
        assert_eq!(trend, TrendDirection::Up);
        assert_eq!(percentage, 0.0);
    }

    #[test]
    fn test_budget_used_is_zero_without_thresholds() {
        let spending = build_category_spending(
            vec![spend_row(1, "Rent", None, 900, 2)],
            vec![],
            Period::Monthly,
        );
        assert_eq!(budget_used(&spending), 0);
    }

    #[test]
    fn test_budget_used_rounds_the_percentage() {
        // 300 + 600 spent against a single 800 threshold: 112.5% -> 113
        let spending = build_category_spending(
            vec![
                spend_row(1, "Food", Some(800), 900, 2),
                spend_row(2, "Rent", None, 0, 0),
            ],
            vec![],
            Period::Monthly,
        );

        assert_eq!(spending[0].value, Decimal::from(900));
        assert_eq!(spending[0].transaction_count, 2);
        assert_eq!(budget_used(&spending), 113);
    }

    #[test]
    fn test_category_spending_pairs_previous_window() {
        let spending = build_category_spending(
            vec![spend_row(1, "Food", Some(800), 150, 3)],
            vec![PreviousSpendRow {
                id: 1,
                total_amount: Decimal::from(200),
            }],
            Period::Weekly,
        );

        assert_eq!(spending[0].trend, TrendDirection::Down);
        assert_eq!(spending[0].percentage, 25.0);
        assert_eq!(spending[0].comparison, "previous week");
    }

    #[test]
    fn test_significant_trends_filters_noise() {
        let spending = build_category_spending(
            vec![
                spend_row(1, "Food", None, 104, 1),
                spend_row(2, "Rent", None, 200, 1),
            ],
            vec![
                PreviousSpendRow {
                    id: 1,
                    total_amount: Decimal::from(100),
                },
                PreviousSpendRow {
                    id: 2,
                    total_amount: Decimal::from(100),
                },
            ],
            Period::Monthly,
        );

        let trends = significant_trends(&spending);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].name, "Rent");
        assert_eq!(trends[0].percentage, 100.0);
    }

    #[test]
    fn test_daily_label_strips_leading_zero() {
        assert_eq!(daily_label("2025-06-05"), "5");
        assert_eq!(daily_label("2025-06-15"), "15");
        assert_eq!(daily_label("garbage"), "N/A");
    }

    #[test]
    fn test_monthly_label_uses_abbreviations() {
        assert_eq!(monthly_label("2025-01"), "Jan");
        assert_eq!(monthly_label("2025-12"), "Dec");
        assert_eq!(monthly_label("2025-13"), "N/A");
    }

    #[test]
    fn test_period_parse_falls_back_to_monthly() {
        assert_eq!(Period::parse("weekly"), Period::Weekly);
        assert_eq!(Period::parse("yearly"), Period::Yearly);
        assert_eq!(Period::parse("monthly"), Period::Monthly);
        assert_eq!(Period::parse("quarterly"), Period::Monthly);
    }
}
