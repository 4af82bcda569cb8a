//! Client-side month navigator: a month-keyed mirror of the transaction
//! API with optimistic inserts and best-effort persistence. The cache is a
//! convenience layer only; the server remains the source of truth.

pub mod api;
pub mod month_navigator;
pub mod storage;

pub use api::{
    CategorySummary, ClientError, HttpTransactionsApi, NewTransaction, Transaction,
    TransactionUpdate, TransactionsApi,
};
pub use month_navigator::{LoadState, MonthNavigator, MonthSummary};
pub use storage::{CacheStore, JsonFileStore, NavigatorState};
