use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::transaction::models::TransactionType;

/// A transaction as seen over the wire. Optimistically inserted records
/// carry a negative id until the server's row replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i32,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A category as seen over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub threshold: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new transaction, before the server assigns id and dates
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: Decimal,
    pub category_id: Option<i32>,
}

/// Replacement fields for an existing transaction
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: Decimal,
    pub category_id: Option<i32>,
}

/// Errors surfaced by the transport. There is no retry policy; callers see
/// the first failure.
#[derive(Debug)]
pub enum ClientError {
    /// The request never produced an HTTP response
    Transport(String),
    /// The server answered with a non-success status
    Status { status: u16, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::Status { status, message } => write!(f, "HTTP {status}: {message}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Transport seam between the navigator and the HTTP API, so cache
/// behavior is testable without a network.
#[allow(async_fn_in_trait)]
pub trait TransactionsApi {
    async fn list_month(&self, year: i32, month: u32) -> Result<Vec<Transaction>, ClientError>;

    async fn create(
        &self,
        new: &NewTransaction,
        context_year: i32,
        context_month: u32,
    ) -> Result<Transaction, ClientError>;

    async fn update(&self, id: i32, update: &TransactionUpdate)
        -> Result<Transaction, ClientError>;

    async fn delete(&self, id: i32) -> Result<(), ClientError>;

    async fn list_categories(&self) -> Result<Vec<CategorySummary>, ClientError>;
}

/// reqwest-backed transport against the fintrack API
pub struct HttpTransactionsApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransactionsApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

impl TransactionsApi for HttpTransactionsApi {
    async fn list_month(&self, year: i32, month: u32) -> Result<Vec<Transaction>, ClientError> {
        let response = self
            .http
            .get(format!("{}/transactions", self.base_url))
            .query(&[("year", year.to_string()), ("month", month.to_string())])
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn create(
        &self,
        new: &NewTransaction,
        context_year: i32,
        context_month: u32,
    ) -> Result<Transaction, ClientError> {
        let body = serde_json::json!({
            "type": new.transaction_type,
            "description": new.description,
            "amount": new.amount,
            "categoryId": new.category_id,
            "contextYear": context_year,
            "contextMonth": context_month,
        });

        let response = self
            .http
            .post(format!("{}/transactions", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn update(
        &self,
        id: i32,
        update: &TransactionUpdate,
    ) -> Result<Transaction, ClientError> {
        let body = serde_json::json!({
            "type": update.transaction_type,
            "description": update.description,
            "amount": update.amount,
            "categoryId": update.category_id,
        });

        let response = self
            .http
            .put(format!("{}/transactions/{id}", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn delete(&self, id: i32) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/transactions/{id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategorySummary>, ClientError> {
        let response = self
            .http
            .get(format!("{}/categories", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse(response).await
    }
}
