use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    CreateTransactionDto, TransactionRecord, TransactionType, UpdateTransactionDto,
};
use crate::errors::AppError;

/// Service layer for transaction business logic. Every by-id operation
/// filters on the owning user; a missing row and a row owned by someone
/// else are indistinguishable to the caller.
pub struct TransactionService;

const SELECT_JOINED: &str = r#"
    SELECT t.id, t.type, t.description, t.amount, t.category_id,
           c.name AS category_name, t.user_id, t.date, t.created_at
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

/// First day of `(year, month)` at midnight UTC, and the first day of the
/// following month. Listing with `date >= start AND date < end` makes the
/// month window half-open, so a transaction stamped exactly at the next
/// month's first midnight never leaks into the previous month.
pub fn month_window(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;

    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0)?),
    ))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

/// Resolve the effective date for a new transaction.
///
/// Browsing the current month uses the real timestamp. Browsing another
/// month keeps today's day-of-month, clamped to the last valid day of the
/// target month (adding on Jan 31 while viewing February lands on Feb
/// 28/29), at midnight UTC in that month.
pub fn resolve_transaction_date(
    now: DateTime<Utc>,
    context: Option<(i32, u32)>,
) -> Option<DateTime<Utc>> {
    let (year, month) = match context {
        Some(ctx) => ctx,
        None => return Some(now),
    };

    if year == now.year() && month == now.month() {
        return Some(now);
    }

    let day = now.day().min(days_in_month(year, month)?);
    let date = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&date))
}

impl TransactionService {
    /// List a user's transactions for one calendar month, newest first.
    pub async fn list_month(
        pool: &PgPool,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let (start, end) = month_window(year, month)
            .ok_or_else(|| AppError::ValidationError("Invalid year or month".to_string()))?;

        sqlx::query_as::<_, TransactionRecord>(&format!(
            "{SELECT_JOINED} WHERE t.user_id = $1 AND t.date >= $2 AND t.date < $3 ORDER BY t.date DESC"
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Get a single transaction by ID with the ownership check.
    pub async fn get(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: i32,
    ) -> Result<TransactionRecord, AppError> {
        sqlx::query_as::<_, TransactionRecord>(&format!(
            "{SELECT_JOINED} WHERE t.id = $1 AND t.user_id = $2"
        ))
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// Create a transaction, resolving the effective date from the
    /// browsing context.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        dto: CreateTransactionDto,
    ) -> Result<TransactionRecord, AppError> {
        let description = dto.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::ValidationError(
                "Description cannot be empty".to_string(),
            ));
        }

        let context = match (dto.context_year, dto.context_month) {
            (Some(year), Some(month)) => Some((year, month)),
            _ => None,
        };
        let date = resolve_transaction_date(Utc::now(), context)
            .ok_or_else(|| AppError::ValidationError("Invalid context date".to_string()))?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO transactions (type, description, amount, category_id, user_id, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(dto.transaction_type.as_str())
        .bind(&description)
        .bind(dto.amount)
        .bind(dto.category_id)
        .bind(user_id)
        .bind(date)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Self::get(pool, user_id, id).await
    }

    /// Replace a transaction's mutable fields. The effective date is left
    /// untouched.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: i32,
        dto: UpdateTransactionDto,
    ) -> Result<TransactionRecord, AppError> {
        let description = dto.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::ValidationError(
                "Description cannot be empty".to_string(),
            ));
        }

        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE id = $1 AND user_id = $2)",
        )
        .bind(transaction_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if !owned {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }

        sqlx::query(
            r#"
            UPDATE transactions
            SET type = $2, description = $3, amount = $4, category_id = $5
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .bind(dto.transaction_type.as_str())
        .bind(&description)
        .bind(dto.amount)
        .bind(dto.category_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Self::get(pool, user_id, transaction_id).await
    }

    /// Delete a transaction with the ownership check.
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: i32,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(transaction_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }

        Ok(())
    }
}
