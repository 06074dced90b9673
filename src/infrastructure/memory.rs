use crate::domain::{
    errors::StorageError,
    models::{HistoryStore, Transaction},
};
use dashmap::DashMap;
use std::collections::HashSet;

#[derive(Clone, Default)]
pub struct InMemoryHistory {
    // account -> transactions in arrival order
    transactions_by_account: DashMap<String, Vec<Transaction>>,
    // account -> ids already stored for it
    ids_by_account: DashMap<String, HashSet<String>>,
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistory {
    async fn store_transactions(
        &self,
        account: String,
        transactions: Vec<Transaction>,
    ) -> Result<usize, StorageError> {
        let mut history = self
            .transactions_by_account
            .entry(account.clone())
            .or_default();
        let mut ids = self.ids_by_account.entry(account.clone()).or_default();

        let mut stored = 0;
        for transaction in transactions {
            if !ids.insert(transaction.id.clone()) {
                tracing::warn!(
                    "Transaction already exists for account {}: {}",
                    account,
                    transaction.id
                );
                continue;
            }
            history.push(transaction);
            stored += 1;
        }
        Ok(stored)
    }

    async fn get_transactions(&self, account: String) -> Result<Vec<Transaction>, StorageError> {
        self.transactions_by_account
            .get(&account)
            .map(|v| v.value().clone())
            .ok_or(StorageError::AccountNotFound(account))
    }

    async fn clear(&self, account: String) -> Result<(), StorageError> {
        self.ids_by_account.remove(&account);
        self.transactions_by_account
            .remove(&account)
            .map(|_| ())
            .ok_or(StorageError::AccountNotFound(account))
    }
}
