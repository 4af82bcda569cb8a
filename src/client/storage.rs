use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::api::{CategorySummary, Transaction};

/// Snapshot of the navigator mirrored to persistent storage. Restored data
/// is treated as a warm cache: it is served without a refetch until a key
/// is explicitly invalidated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorState {
    /// Last viewed (year, month)
    pub current_month: Option<(i32, u32)>,
    /// Month key ("YYYY-MM") to fetched transactions
    pub transactions: HashMap<String, Vec<Transaction>>,
    pub categories: Vec<CategorySummary>,
}

/// Persistence seam for the navigator. Stores are best-effort: a failed
/// save must not fail the operation that triggered it.
pub trait CacheStore {
    fn load(&self) -> Option<NavigatorState>;
    fn save(&self, state: &NavigatorState);
}

/// JSON file mirror persisted between runs.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CacheStore for JsonFileStore {
    fn load(&self) -> Option<NavigatorState> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("Discarding unreadable navigator cache: {e}");
                None
            }
        }
    }

    fn save(&self, state: &NavigatorState) {
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize navigator cache: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            tracing::warn!("Failed to persist navigator cache: {e}");
        }
    }
}

/// Store that never persists anything; for callers that opt out of
/// mirroring.
pub struct NullStore;

impl CacheStore for NullStore {
    fn load(&self) -> Option<NavigatorState> {
        None
    }

    fn save(&self, _state: &NavigatorState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::models::TransactionType;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn sample_state() -> NavigatorState {
        let mut transactions = HashMap::new();
        transactions.insert(
            "2025-06".to_string(),
            vec![Transaction {
                id: 1,
                transaction_type: TransactionType::Expense,
                description: "Coffee".to_string(),
                amount: Decimal::new(450, 2),
                category_id: None,
                category_name: None,
                user_id: Uuid::nil(),
                date: Utc::now(),
                created_at: Utc::now(),
            }],
        );
        NavigatorState {
            current_month: Some((2025, 6)),
            transactions,
            categories: vec![],
        }
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("cache.json"));

        let state = sample_state();
        store.save(&state);

        let restored = store.load().expect("state should load back");
        assert_eq!(restored.current_month, Some((2025, 6)));
        assert_eq!(restored.transactions["2025-06"].len(), 1);
        assert_eq!(restored.transactions["2025-06"][0].description, "Coffee");
    }

    #[test]
    fn test_json_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_json_file_store_discards_corrupt_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(store.load().is_none());
    }
}
