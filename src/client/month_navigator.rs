use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::transaction::models::TransactionType;
use crate::transaction::service::resolve_transaction_date;

use super::api::{
    CategorySummary, ClientError, NewTransaction, Transaction, TransactionUpdate, TransactionsApi,
};
use super::storage::{CacheStore, NavigatorState};

/// Fetch status for one month key
#[derive(Debug, Clone, Default)]
pub struct LoadState {
    pub loading: bool,
    pub error: Option<String>,
}

/// Totals over the currently viewed month's cached transactions
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
}

/// An optimistic mutation awaiting server confirmation. The correlation id
/// ties the tentative record to its reconciliation step; the temp id is
/// what sits in the cache until then.
#[derive(Debug)]
struct PendingOperation {
    correlation_id: Uuid,
    temp_id: i32,
    month_key: String,
}

/// Cache key for a month: `"YYYY-MM"`, zero-padded.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// First temp id to hand out, below any negative id already persisted so
/// restored tentative records can never collide with new ones.
fn initial_temp_id(transactions: &HashMap<String, Vec<Transaction>>) -> i32 {
    transactions
        .values()
        .flatten()
        .map(|t| t.id)
        .filter(|id| *id < 0)
        .min()
        .map(|lowest| lowest - 1)
        .unwrap_or(-1)
}

/// Month-keyed mirror of the transaction API.
///
/// Owned explicitly by the embedding UI and passed by reference; months
/// are fetched once and then served from the cache until invalidated.
/// Mutations are applied optimistically and reconciled against the server
/// response; there is no retry and no cancellation of in-flight requests.
pub struct MonthNavigator<A, S> {
    api: A,
    store: S,
    current: (i32, u32),
    transactions: HashMap<String, Vec<Transaction>>,
    categories: Vec<CategorySummary>,
    month_state: HashMap<String, LoadState>,
    pending: Vec<PendingOperation>,
    next_temp_id: i32,
}

impl<A: TransactionsApi, S: CacheStore> MonthNavigator<A, S> {
    /// Build a navigator, restoring the last-viewed month and cached data
    /// from the store. Restored months count as cached and are not
    /// refetched.
    pub fn new(api: A, store: S) -> Self {
        let restored = store.load().unwrap_or_default();
        let now = Utc::now();
        let current = restored.current_month.unwrap_or((now.year(), now.month()));
        let next_temp_id = initial_temp_id(&restored.transactions);

        Self {
            api,
            store,
            current,
            transactions: restored.transactions,
            categories: restored.categories,
            month_state: HashMap::new(),
            pending: Vec::new(),
            next_temp_id,
        }
    }

    pub fn current_month(&self) -> (i32, u32) {
        self.current
    }

    pub fn is_current_month(&self) -> bool {
        let now = Utc::now();
        self.current == (now.year(), now.month())
    }

    /// Cached transactions for the currently viewed month.
    pub fn current_transactions(&self) -> &[Transaction] {
        self.transactions
            .get(&month_key(self.current.0, self.current.1))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> &[CategorySummary] {
        &self.categories
    }

    /// Fetch status for a month key.
    pub fn month_state(&self, year: i32, month: u32) -> LoadState {
        self.month_state
            .get(&month_key(year, month))
            .cloned()
            .unwrap_or_default()
    }

    /// Income/expense totals over the current month's cached rows.
    pub fn summary(&self) -> MonthSummary {
        let transactions = self.current_transactions();

        let total_income: Decimal = transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Income)
            .map(|t| t.amount)
            .sum();
        let total_expense: Decimal = transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Expense)
            .map(|t| t.amount)
            .sum();

        MonthSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            transaction_count: transactions.len(),
        }
    }

    /// Load a month's transactions, hitting the network only on a cache
    /// miss. A failed fetch records the error for that key and yields the
    /// cached (possibly empty) value instead of propagating.
    pub async fn load_month(&mut self, year: i32, month: u32) -> Vec<Transaction> {
        let key = month_key(year, month);

        if let Some(cached) = self.transactions.get(&key) {
            return cached.clone();
        }

        self.month_state.insert(
            key.clone(),
            LoadState {
                loading: true,
                error: None,
            },
        );

        match self.api.list_month(year, month).await {
            Ok(fetched) => {
                self.transactions.insert(key.clone(), fetched.clone());
                self.month_state.insert(key, LoadState::default());
                self.persist();
                fetched
            }
            Err(e) => {
                self.month_state.insert(
                    key.clone(),
                    LoadState {
                        loading: false,
                        error: Some(e.to_string()),
                    },
                );
                self.transactions.get(&key).cloned().unwrap_or_default()
            }
        }
    }

    /// Load categories once; later calls serve the cache.
    pub async fn load_categories(&mut self) -> Vec<CategorySummary> {
        if !self.categories.is_empty() {
            return self.categories.clone();
        }

        match self.api.list_categories().await {
            Ok(fetched) => {
                self.categories = fetched.clone();
                self.persist();
                fetched
            }
            Err(_) => self.categories.clone(),
        }
    }

    /// Create a transaction optimistically: a tentative record with a
    /// negative temp id lands in the current month's cache immediately,
    /// a pending operation ties it to the request via a correlation id,
    /// and the server's row replaces it on success. On failure the
    /// tentative record is rolled back and the error is returned.
    pub async fn add_transaction(
        &mut self,
        new: NewTransaction,
    ) -> Result<Transaction, ClientError> {
        let (year, month) = self.current;
        let key = month_key(year, month);

        let now = Utc::now();
        let date = resolve_transaction_date(now, Some((year, month))).unwrap_or(now);

        let temp_id = self.next_temp_id;
        self.next_temp_id -= 1;
        let correlation_id = Uuid::new_v4();

        let category_name = new.category_id.and_then(|id| {
            self.categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
        });

        let tentative = Transaction {
            id: temp_id,
            transaction_type: new.transaction_type,
            description: new.description.clone(),
            amount: new.amount,
            category_id: new.category_id,
            category_name,
            user_id: Uuid::nil(),
            date,
            created_at: now,
        };

        self.transactions
            .entry(key.clone())
            .or_default()
            .push(tentative);
        self.pending.push(PendingOperation {
            correlation_id,
            temp_id,
            month_key: key,
        });
        self.persist();

        let result = self.api.create(&new, year, month).await;

        let op_index = self
            .pending
            .iter()
            .position(|op| op.correlation_id == correlation_id);
        let op = match op_index {
            Some(idx) => self.pending.remove(idx),
            // Reconciliation state vanished; surface the server result as-is
            None => return result,
        };

        match result {
            Ok(confirmed) => {
                if let Some(list) = self.transactions.get_mut(&op.month_key) {
                    for item in list.iter_mut() {
                        if item.id == op.temp_id {
                            *item = confirmed.clone();
                        }
                    }
                }
                self.persist();
                Ok(confirmed)
            }
            Err(e) => {
                if let Some(list) = self.transactions.get_mut(&op.month_key) {
                    list.retain(|t| t.id != op.temp_id);
                }
                self.persist();
                Err(e)
            }
        }
    }

    /// Replace a transaction on the server, then sweep every cached month
    /// for the id. The sweep is deliberate: an edit can move a record out
    /// of the month it was cached under.
    pub async fn update_transaction(
        &mut self,
        id: i32,
        update: TransactionUpdate,
    ) -> Result<Transaction, ClientError> {
        let confirmed = self.api.update(id, &update).await?;

        for list in self.transactions.values_mut() {
            for item in list.iter_mut() {
                if item.id == id {
                    *item = confirmed.clone();
                }
            }
        }
        self.persist();

        Ok(confirmed)
    }

    /// Delete a transaction on the server and purge it from every cached
    /// month.
    pub async fn delete_transaction(&mut self, id: i32) -> Result<(), ClientError> {
        self.api.delete(id).await?;

        for list in self.transactions.values_mut() {
            list.retain(|t| t.id != id);
        }
        self.persist();

        Ok(())
    }

    pub fn navigate_to_previous_month(&mut self) {
        self.current = match self.current {
            (year, 1) => (year - 1, 12),
            (year, month) => (year, month - 1),
        };
        self.persist();
    }

    pub fn navigate_to_next_month(&mut self) {
        self.current = match self.current {
            (year, 12) => (year + 1, 1),
            (year, month) => (year, month + 1),
        };
        self.persist();
    }

    pub fn navigate_to_month(&mut self, year: i32, month: u32) {
        self.current = (year, month);
        self.persist();
    }

    pub fn navigate_to_current_month(&mut self) {
        let now = Utc::now();
        self.current = (now.year(), now.month());
        self.persist();
    }

    /// Drop one month from the cache so the next load refetches it.
    pub fn invalidate_month(&mut self, year: i32, month: u32) {
        let key = month_key(year, month);
        self.transactions.remove(&key);
        self.month_state.remove(&key);
        self.persist();
    }

    /// Drop the whole cache, categories included.
    pub fn invalidate_all(&mut self) {
        self.transactions.clear();
        self.month_state.clear();
        self.categories.clear();
        self.persist();
    }

    fn persist(&self) {
        self.store.save(&NavigatorState {
            current_month: Some(self.current),
            transactions: self.transactions.clone(),
            categories: self.categories.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn tx(id: i32, transaction_type: TransactionType, amount: i64) -> Transaction {
        Transaction {
            id,
            transaction_type,
            description: format!("tx {id}"),
            amount: Decimal::from(amount),
            category_id: None,
            category_name: None,
            user_id: Uuid::nil(),
            date: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
        }
    }

    #[derive(Default)]
    struct FakeApi {
        months: RefCell<HashMap<String, Vec<Transaction>>>,
        list_calls: Cell<u32>,
        fail_lists: Cell<bool>,
        fail_creates: Cell<bool>,
        next_id: Cell<i32>,
        created: RefCell<Vec<NewTransaction>>,
    }

    impl FakeApi {
        fn with_month(self, year: i32, month: u32, rows: Vec<Transaction>) -> Self {
            self.months.borrow_mut().insert(month_key(year, month), rows);
            self
        }
    }

    impl TransactionsApi for Rc<FakeApi> {
        async fn list_month(
            &self,
            year: i32,
            month: u32,
        ) -> Result<Vec<Transaction>, ClientError> {
            self.list_calls.set(self.list_calls.get() + 1);
            if self.fail_lists.get() {
                return Err(ClientError::Transport("connection refused".to_string()));
            }
            Ok(self
                .months
                .borrow()
                .get(&month_key(year, month))
                .cloned()
                .unwrap_or_default())
        }

        async fn create(
            &self,
            new: &NewTransaction,
            context_year: i32,
            context_month: u32,
        ) -> Result<Transaction, ClientError> {
            if self.fail_creates.get() {
                return Err(ClientError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.created.borrow_mut().push(new.clone());
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            Ok(Transaction {
                id,
                transaction_type: new.transaction_type,
                description: new.description.clone(),
                amount: new.amount,
                category_id: new.category_id,
                category_name: None,
                user_id: Uuid::nil(),
                date: Utc
                    .with_ymd_and_hms(context_year, context_month, 10, 0, 0, 0)
                    .unwrap(),
                created_at: Utc::now(),
            })
        }

        async fn update(
            &self,
            id: i32,
            update: &TransactionUpdate,
        ) -> Result<Transaction, ClientError> {
            Ok(Transaction {
                id,
                transaction_type: update.transaction_type,
                description: update.description.clone(),
                amount: update.amount,
                category_id: update.category_id,
                category_name: None,
                user_id: Uuid::nil(),
                date: Utc::now(),
                created_at: Utc::now(),
            })
        }

        async fn delete(&self, _id: i32) -> Result<(), ClientError> {
            Ok(())
        }

        async fn list_categories(&self) -> Result<Vec<CategorySummary>, ClientError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct MemStore {
        state: RefCell<Option<NavigatorState>>,
        saves: Cell<u32>,
    }

    impl CacheStore for Rc<MemStore> {
        fn load(&self) -> Option<NavigatorState> {
            self.state.borrow().clone()
        }

        fn save(&self, state: &NavigatorState) {
            self.saves.set(self.saves.get() + 1);
            *self.state.borrow_mut() = Some(state.clone());
        }
    }

    fn navigator(
        api: FakeApi,
        store: MemStore,
    ) -> (MonthNavigator<Rc<FakeApi>, Rc<MemStore>>, Rc<FakeApi>, Rc<MemStore>) {
        let api = Rc::new(api);
        let store = Rc::new(store);
        let nav = MonthNavigator::new(Rc::clone(&api), Rc::clone(&store));
        (nav, api, store)
    }

    fn new_expense(amount: i64) -> NewTransaction {
        NewTransaction {
            transaction_type: TransactionType::Expense,
            description: "lunch".to_string(),
            amount: Decimal::from(amount),
            category_id: None,
        }
    }

    #[test]
    fn test_month_key_is_zero_padded() {
        assert_eq!(month_key(2025, 6), "2025-06");
        assert_eq!(month_key(1999, 12), "1999-12");
    }

    #[test]
    fn test_initial_temp_id_avoids_persisted_temps() {
        let mut transactions = HashMap::new();
        transactions.insert(
            "2025-06".to_string(),
            vec![tx(3, TransactionType::Income, 10), tx(-5, TransactionType::Expense, 7)],
        );

        assert_eq!(initial_temp_id(&transactions), -6);
        assert_eq!(initial_temp_id(&HashMap::new()), -1);
    }

    #[actix_rt::test]
    async fn test_load_month_fetches_once_then_serves_cache() {
        let api =
            FakeApi::default().with_month(2025, 6, vec![tx(1, TransactionType::Expense, 40)]);
        let (mut nav, api, _store) = navigator(api, MemStore::default());

        let first = nav.load_month(2025, 6).await;
        let second = nav.load_month(2025, 6).await;

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(api.list_calls.get(), 1, "cache hit must not refetch");
    }

    #[actix_rt::test]
    async fn test_load_month_failure_records_error() {
        let api = FakeApi::default();
        api.fail_lists.set(true);
        let (mut nav, _api, _store) = navigator(api, MemStore::default());

        let rows = nav.load_month(2025, 6).await;

        assert!(rows.is_empty());
        let state = nav.month_state(2025, 6);
        assert!(!state.loading);
        assert!(state.error.expect("error recorded").contains("connection refused"));
    }

    #[actix_rt::test]
    async fn test_add_transaction_reconciles_temp_record() {
        let api = FakeApi::default().with_month(2025, 6, vec![]);
        let (mut nav, api, _store) = navigator(api, MemStore::default());
        nav.navigate_to_month(2025, 6);
        nav.load_month(2025, 6).await;

        let confirmed = nav.add_transaction(new_expense(25)).await.unwrap();

        assert!(confirmed.id > 0);
        let cached = nav.current_transactions();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, confirmed.id, "temp record must be replaced");
        assert!(cached.iter().all(|t| t.id > 0));
        assert_eq!(api.created.borrow().len(), 1);
    }

    #[actix_rt::test]
    async fn test_add_transaction_failure_rolls_back() {
        let api = FakeApi::default().with_month(2025, 6, vec![]);
        api.fail_creates.set(true);
        let (mut nav, _api, _store) = navigator(api, MemStore::default());
        nav.navigate_to_month(2025, 6);
        nav.load_month(2025, 6).await;

        let result = nav.add_transaction(new_expense(25)).await;

        assert!(result.is_err());
        assert!(nav.current_transactions().is_empty(), "optimistic insert must roll back");
    }

    #[actix_rt::test]
    async fn test_update_sweeps_every_cached_month() {
        let api = FakeApi::default()
            .with_month(2025, 5, vec![tx(7, TransactionType::Expense, 10)])
            .with_month(2025, 6, vec![]);
        let (mut nav, _api, _store) = navigator(api, MemStore::default());
        nav.navigate_to_month(2025, 5);
        nav.load_month(2025, 5).await;
        nav.navigate_to_month(2025, 6);
        nav.load_month(2025, 6).await;

        // Editing while viewing June must still fix the May copy
        let update = TransactionUpdate {
            transaction_type: TransactionType::Expense,
            description: "corrected".to_string(),
            amount: Decimal::from(99),
            category_id: None,
        };
        nav.update_transaction(7, update).await.unwrap();

        nav.navigate_to_month(2025, 5);
        let cached = nav.current_transactions();
        assert_eq!(cached[0].description, "corrected");
        assert_eq!(cached[0].amount, Decimal::from(99));
    }

    #[actix_rt::test]
    async fn test_delete_sweeps_every_cached_month() {
        let api = FakeApi::default()
            .with_month(2025, 5, vec![tx(7, TransactionType::Expense, 10)])
            .with_month(2025, 6, vec![]);
        let (mut nav, _api, _store) = navigator(api, MemStore::default());
        nav.navigate_to_month(2025, 5);
        nav.load_month(2025, 5).await;
        nav.navigate_to_month(2025, 6);
        nav.load_month(2025, 6).await;

        nav.delete_transaction(7).await.unwrap();

        nav.navigate_to_month(2025, 5);
        assert!(nav.current_transactions().is_empty());
    }

    #[test]
    fn test_navigation_rolls_the_year_over() {
        let (mut nav, _api, _store) = navigator(FakeApi::default(), MemStore::default());

        nav.navigate_to_month(2025, 1);
        nav.navigate_to_previous_month();
        assert_eq!(nav.current_month(), (2024, 12));

        nav.navigate_to_month(2025, 12);
        nav.navigate_to_next_month();
        assert_eq!(nav.current_month(), (2026, 1));
    }

    #[actix_rt::test]
    async fn test_restored_cache_is_served_without_refetch() {
        let mut transactions = HashMap::new();
        transactions.insert(
            month_key(2025, 6),
            vec![tx(1, TransactionType::Income, 100)],
        );
        let store = MemStore::default();
        *store.state.borrow_mut() = Some(NavigatorState {
            current_month: Some((2025, 6)),
            transactions,
            categories: vec![],
        });

        let (mut nav, api, _store) = navigator(FakeApi::default(), store);

        assert_eq!(nav.current_month(), (2025, 6));
        let rows = nav.load_month(2025, 6).await;
        assert_eq!(rows.len(), 1);
        // Restored data counts as cached: stale until explicitly invalidated
        assert_eq!(api.list_calls.get(), 0);
    }

    #[actix_rt::test]
    async fn test_invalidate_month_forces_refetch() {
        let api =
            FakeApi::default().with_month(2025, 6, vec![tx(1, TransactionType::Expense, 40)]);
        let (mut nav, api, _store) = navigator(api, MemStore::default());

        nav.load_month(2025, 6).await;
        nav.invalidate_month(2025, 6);
        nav.load_month(2025, 6).await;

        assert_eq!(api.list_calls.get(), 2);
    }

    #[actix_rt::test]
    async fn test_summary_totals_current_month() {
        let api = FakeApi::default().with_month(
            2025,
            6,
            vec![
                tx(1, TransactionType::Income, 1000),
                tx(2, TransactionType::Expense, 300),
                tx(3, TransactionType::Expense, 150),
            ],
        );
        let (mut nav, _api, _store) = navigator(api, MemStore::default());
        nav.navigate_to_month(2025, 6);
        nav.load_month(2025, 6).await;

        let summary = nav.summary();
        assert_eq!(summary.total_income, Decimal::from(1000));
        assert_eq!(summary.total_expense, Decimal::from(450));
        assert_eq!(summary.balance, Decimal::from(550));
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn test_navigation_is_mirrored_to_the_store() {
        let (mut nav, _api, store) = navigator(FakeApi::default(), MemStore::default());

        nav.navigate_to_month(2030, 3);

        let state = store.state.borrow();
        assert_eq!(state.as_ref().unwrap().current_month, Some((2030, 3)));
    }
}
