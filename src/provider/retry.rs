use async_trait::async_trait;
use std::time::Duration;

use crate::chain::ChainRef;

use super::types::ProviderResponse;
use super::ChainDataProvider;

/// Retries a flaky provider with exponential backoff before giving up.
pub struct RetryingProvider<P> {
    inner: P,
    max_retries: u32,
    base_delay: Duration,
}

impl<P: ChainDataProvider> RetryingProvider<P> {
    pub fn new(inner: P, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }
}

#[async_trait]
impl<P: ChainDataProvider> ChainDataProvider for RetryingProvider<P> {
    async fn fetch(&self, chain: &ChainRef, address: &str) -> eyre::Result<ProviderResponse> {
        let mut delay = self.base_delay;

        for attempt in 0..self.max_retries {
            match self.inner.fetch(chain, address).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        chain = %chain,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Provider fetch failed, retrying..."
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(5));
                }
            }
        }

        // Final attempt, propagate the error
        self.inner.fetch(chain, address).await.map_err(|e| {
            eyre::eyre!(
                "Provider fetch failed after {} retries: {}",
                self.max_retries,
                e
            )
        })
    }
}
