use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Transaction type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received
    Income,
    /// Money spent
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

/// Validate that amount is positive
fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}

/// Database row for transactions, left-joined with the category name.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: i32,
    #[sqlx(rename = "type")]
    pub transaction_type: String,
    pub description: String,
    pub amount: Decimal,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Transaction information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Unique transaction identifier
    pub id: i32,
    /// Transaction type (income or expense)
    #[serde(rename = "type")]
    #[schema(example = "expense")]
    pub transaction_type: String,
    /// What the money was for
    #[schema(example = "Weekly groceries")]
    pub description: String,
    /// Transaction amount (always positive)
    #[schema(example = 50.00)]
    pub amount: Decimal,
    /// Category this transaction belongs to (optional)
    pub category_id: Option<i32>,
    /// Joined category name, for display
    #[schema(example = "Groceries")]
    pub category_name: Option<String>,
    /// Owning user
    pub user_id: Uuid,
    /// Effective (user-intended) date
    pub date: DateTime<Utc>,
    /// Record insertion timestamp
    pub created_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(t: TransactionRecord) -> Self {
        Self {
            id: t.id,
            transaction_type: t.transaction_type,
            description: t.description,
            amount: t.amount,
            category_id: t.category_id,
            category_name: t.category_name,
            user_id: t.user_id,
            date: t.date,
            created_at: t.created_at,
        }
    }
}

/// Request body for creating a transaction
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionDto {
    /// Transaction type (income or expense)
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Description (non-empty, max 200 chars)
    #[validate(length(min = 1, max = 200, message = "Description is required"))]
    #[schema(example = "Weekly groceries")]
    pub description: String,

    /// Transaction amount (must be positive)
    #[validate(custom(
        function = "validate_positive_amount",
        message = "Amount must be greater than zero"
    ))]
    #[schema(example = 50.00)]
    pub amount: Decimal,

    /// Category to assign (optional)
    pub category_id: Option<i32>,

    /// Year of the month the user is browsing; combined with
    /// `contextMonth` to backdate/forward-date the entry
    #[schema(example = 2025)]
    pub context_year: Option<i32>,

    /// Month (1-12) the user is browsing
    #[validate(range(min = 1, max = 12, message = "contextMonth must be 1-12"))]
    #[schema(example = 6)]
    pub context_month: Option<u32>,
}

/// Request body for updating a transaction (PUT - full-field replace;
/// the effective date is not editable)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionDto {
    /// Transaction type (income or expense)
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Description (non-empty, max 200 chars)
    #[validate(length(min = 1, max = 200, message = "Description is required"))]
    pub description: String,

    /// Transaction amount (must be positive)
    #[validate(custom(
        function = "validate_positive_amount",
        message = "Amount must be greater than zero"
    ))]
    pub amount: Decimal,

    /// Category to assign; omit to clear
    pub category_id: Option<i32>,
}

/// Query parameters for the month listing; defaults to the current month
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Calendar year
    #[param(example = 2025)]
    pub year: Option<i32>,

    /// Calendar month (1-12)
    #[validate(range(min = 1, max = 12, message = "month must be 1-12"))]
    #[param(example = 6)]
    pub month: Option<u32>,
}

/// Response for a transaction deletion
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTransactionResponse {
    #[schema(example = "Transaction deleted")]
    pub message: String,
    /// Id of the removed transaction
    pub id: i32,
}

/// Path parameters for transaction ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionIdPath {
    /// Transaction ID
    pub id: i32,
}
