pub mod memory;
pub mod retry;
pub mod snapshot;
pub mod types;

use async_trait::async_trait;

use crate::chain::ChainRef;

pub use memory::InMemoryProvider;
pub use retry::RetryingProvider;
pub use types::{ProviderResponse, TransactionRecord};

/// Source of raw per-chain transaction history for an address.
///
/// Pagination, rate limiting and explorer-specific quirks live behind this trait.
/// Implementations may report failure either as an error or as an empty response;
/// the graph components treat both as "no contribution".
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    async fn fetch(&self, chain: &ChainRef, address: &str) -> eyre::Result<ProviderResponse>;
}
