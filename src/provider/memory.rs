use async_trait::async_trait;
use std::collections::HashMap;

use crate::chain::{normalize, ChainRef};

use super::types::{ProviderResponse, TransactionRecord};
use super::ChainDataProvider;

/// Provider backed by pre-recorded history, keyed by (chain tag, canonical address).
///
/// Unknown addresses yield an empty history rather than an error.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProvider {
    history: HashMap<(String, String), Vec<TransactionRecord>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append history for an address. Records without a chain tag inherit `chain`.
    pub fn insert(&mut self, chain: &ChainRef, address: &str, transactions: Vec<TransactionRecord>) {
        let tag = chain.tag();
        let key = (tag.clone(), normalize(address, chain));
        let entry = self.history.entry(key).or_default();
        for mut tx in transactions {
            if tx.chain.is_empty() {
                tx.chain = tag.clone();
            }
            entry.push(tx);
        }
    }

    pub fn with_history(
        mut self,
        chain: &ChainRef,
        address: &str,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        self.insert(chain, address, transactions);
        self
    }

    /// Number of (chain, address) histories held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[async_trait]
impl ChainDataProvider for InMemoryProvider {
    async fn fetch(&self, chain: &ChainRef, address: &str) -> eyre::Result<ProviderResponse> {
        let key = (chain.tag(), normalize(address, chain));
        let transactions = self.history.get(&key).cloned().unwrap_or_default();
        tracing::debug!(
            chain = %chain,
            address,
            transactions = transactions.len(),
            "Served history from memory"
        );
        Ok(ProviderResponse::from_transactions(transactions))
    }
}
