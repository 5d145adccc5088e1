use serde::Deserialize;

use crate::chain::ChainRef;

use super::memory::InMemoryProvider;
use super::types::TransactionRecord;

#[derive(Debug, Deserialize)]
struct SnapshotEntry {
    chain: ChainRef,
    address: String,
    #[serde(default)]
    transactions: Vec<TransactionRecord>,
}

/// Load recorded explorer responses from a JSON file:
/// `[{"chain": 1, "address": "0x..", "transactions": [...]}, ...]`.
pub fn load_snapshot(path: &str) -> eyre::Result<InMemoryProvider> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("Failed to read snapshot file '{}': {}", path, e))?;
    parse_snapshot(&content)
        .map_err(|e| eyre::eyre!("Failed to parse snapshot file '{}': {}", path, e))
}

pub fn parse_snapshot(content: &str) -> eyre::Result<InMemoryProvider> {
    let entries: Vec<SnapshotEntry> = serde_json::from_str(content)?;

    let mut provider = InMemoryProvider::new();
    let mut transactions = 0usize;
    for entry in entries {
        transactions += entry.transactions.len();
        provider.insert(&entry.chain, &entry.address, entry.transactions);
    }

    tracing::info!(
        addresses = provider.len(),
        transactions,
        "Loaded transaction snapshot"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChainDataProvider;
    use std::io::Write;

    const SNAPSHOT: &str = r#"[
        {
            "chain": "ethereum",
            "address": "0xAbC0000000000000000000000000000000000001",
            "transactions": [
                {"hash": "0x01", "from": "0xabc0000000000000000000000000000000000001", "to": "0x02", "value": "0.5", "timestamp": "2024-02-10 10:00:00"}
            ]
        },
        {
            "chain": -1,
            "address": "SoLaNaAddr",
            "transactions": []
        }
    ]"#;

    #[tokio::test]
    async fn test_load_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let provider = load_snapshot(file.path().to_str().unwrap()).unwrap();
        assert_eq!(provider.len(), 2);

        let response = provider
            .fetch(&ChainRef::Id(1), "0xabc0000000000000000000000000000000000001")
            .await
            .unwrap();
        assert_eq!(response.transactions.len(), 1);
        assert_eq!(response.transactions[0].chain, "ethereum");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_snapshot("/nonexistent/snapshot.json").is_err());
    }

    #[test]
    fn test_malformed_snapshot_is_error() {
        assert!(parse_snapshot("{not json").is_err());
    }
}
