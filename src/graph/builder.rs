use alloy::primitives::keccak256;
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::chain::{normalize, ChainRef};
use crate::config::GraphConfig;
use crate::entity::{short_label, EntityLookup, EntityType};
use crate::provider::{ChainDataProvider, ProviderResponse, TransactionRecord};

use super::types::{Graph, GraphEdge, GraphNode};

/// Builds the one-hop neighborhood of an address on a single chain.
///
/// Provider failures and timeouts are absorbed: the build degrades to a
/// root-only graph and never returns an error.
pub struct GraphBuilder {
    provider: Arc<dyn ChainDataProvider>,
    labels: Arc<dyn EntityLookup>,
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(
        provider: Arc<dyn ChainDataProvider>,
        labels: Arc<dyn EntityLookup>,
        config: GraphConfig,
    ) -> Self {
        Self {
            provider,
            labels,
            config,
        }
    }

    /// Fetch raw history with the configured timeout. Failures become an empty response.
    pub async fn fetch_transactions(&self, address: &str, chain: &ChainRef) -> ProviderResponse {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        match tokio::time::timeout(timeout, self.provider.fetch(chain, address.trim())).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(
                    chain = %chain,
                    address,
                    error = %e,
                    "Provider fetch failed, continuing with no transactions"
                );
                ProviderResponse::default()
            }
            Err(_) => {
                tracing::warn!(
                    chain = %chain,
                    address,
                    timeout_secs = self.config.fetch_timeout_secs,
                    "Provider fetch timed out, continuing with no transactions"
                );
                ProviderResponse::default()
            }
        }
    }

    pub async fn build_graph(&self, address: &str, chain: &ChainRef) -> Graph {
        let response = self.fetch_transactions(address, chain).await;
        self.build_from_transactions(address, chain, &response.transactions)
    }

    /// Turn already-fetched history into a neighborhood graph.
    ///
    /// Nodes and edges follow provider order. Only the first `node_cap`
    /// transactions are considered.
    pub fn build_from_transactions(
        &self,
        address: &str,
        chain: &ChainRef,
        transactions: &[TransactionRecord],
    ) -> Graph {
        let root_id = normalize(address.trim(), chain);
        let mut graph = Graph::default();
        let mut seen_nodes: HashSet<String> = HashSet::new();
        let mut seen_edges: HashSet<String> = HashSet::new();

        graph.nodes.push(GraphNode {
            id: root_id.clone(),
            label: short_label(&root_id),
            entity_type: EntityType::Target,
            risk: self.config.root_risk,
            icon: EntityType::Target.default_icon().to_string(),
            is_root: true,
        });
        seen_nodes.insert(root_id.clone());

        let currency_fallback = chain.native_currency();
        let mut rng = rand::thread_rng();

        for tx in transactions.iter().take(self.config.node_cap) {
            let (from, to) = match (endpoint(&tx.from), endpoint(&tx.to)) {
                (Some(from), Some(to)) => (normalize(from, chain), normalize(to, chain)),
                _ => {
                    tracing::debug!(
                        hash = tx.hash.as_deref().unwrap_or(""),
                        "Dropping transaction without both endpoints"
                    );
                    continue;
                }
            };

            let counterpart = if from == root_id {
                to.clone()
            } else if to == root_id {
                from.clone()
            } else {
                continue;
            };

            if seen_nodes.insert(counterpart.clone()) {
                graph.nodes.push(self.enrich(&counterpart, &mut rng));
            }

            let id = edge_id(tx, chain, &from, &to);
            if !seen_edges.insert(id.clone()) {
                continue;
            }

            let currency = tx
                .token_symbol
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| currency_fallback.to_string());

            graph.edges.push(GraphEdge {
                label: edge_label(&tx.value, &currency, &tx.timestamp),
                id,
                source: from,
                target: to,
                amount: tx.value.clone(),
                currency,
                timestamp: tx.timestamp.clone(),
            });
        }

        tracing::debug!(
            chain = %chain,
            root = %root_id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Built neighborhood graph"
        );
        graph
    }

    fn enrich<R: Rng>(&self, id: &str, rng: &mut R) -> GraphNode {
        match self.labels.lookup(id) {
            Some(info) => GraphNode {
                id: id.to_string(),
                icon: info.icon_ref(),
                label: info.label,
                entity_type: info.entity_type,
                risk: info.risk.min(100),
                is_root: false,
            },
            // Placeholder classification for addresses with no intelligence
            None => GraphNode {
                id: id.to_string(),
                label: short_label(id),
                entity_type: EntityType::Wallet,
                risk: rng.gen_range(0..=self.config.default_risk_max),
                icon: EntityType::Wallet.default_icon().to_string(),
                is_root: false,
            },
        }
    }
}

fn endpoint(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `{hash}_{from}_{to}`; hashless records get a stable digest of their contents.
fn edge_id(tx: &TransactionRecord, chain: &ChainRef, from: &str, to: &str) -> String {
    match tx.hash.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        Some(hash) => format!("{}_{}_{}", hash, from, to),
        None => {
            let material = format!(
                "{}|{}|{}|{}|{}",
                chain.tag(),
                from,
                to,
                tx.value.normalized(),
                tx.timestamp
            );
            let digest = keccak256(material.as_bytes());
            format!("synthetic-{}_{}_{}", hex::encode(&digest[..8]), from, to)
        }
    }
}

fn edge_label(value: &BigDecimal, currency: &str, timestamp: &str) -> String {
    if *value > BigDecimal::zero() {
        let amount = value.to_f64().unwrap_or(0.0);
        format!("+{:.4} {}\n{}", amount, currency, timestamp)
    } else {
        format!("0 {} (Call)\n{}", currency, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::entity::{EntityInfo, EntityLabelStore, NoLabels};
    use crate::provider::InMemoryProvider;
    use async_trait::async_trait;
    use std::str::FromStr;

    const ROOT: &str = "0xAbCdEf0000000000000000000000000000000001";
    const PEER: &str = "0x00000000000000000000000000000000000000B2";

    fn tx(hash: Option<&str>, from: Option<&str>, to: Option<&str>, value: &str) -> TransactionRecord {
        TransactionRecord {
            hash: hash.map(String::from),
            from: from.map(String::from),
            to: to.map(String::from),
            value: BigDecimal::from_str(value).unwrap(),
            timestamp: "2024-02-10 12:00:00".to_string(),
            chain: "ethereum".to_string(),
            token_symbol: None,
            tx_type: None,
        }
    }

    fn builder(provider: InMemoryProvider) -> GraphBuilder {
        GraphBuilder::new(Arc::new(provider), Arc::new(NoLabels), GraphConfig::default())
    }

    fn eth() -> ChainRef {
        ChainRef::from(Chain::Ethereum)
    }

    #[tokio::test]
    async fn test_root_only_when_no_history() {
        let graph = builder(InMemoryProvider::new()).build_graph(ROOT, &eth()).await;
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        let root = graph.root().unwrap();
        assert_eq!(root.id, ROOT.to_lowercase());
        assert_eq!(root.entity_type, EntityType::Target);
        assert_eq!(root.risk, 50);
    }

    #[test]
    fn test_dedupes_counterparts_but_keeps_edges() {
        let txs = vec![
            tx(Some("0x01"), Some(ROOT), Some(PEER), "1.5"),
            tx(Some("0x02"), Some(PEER), Some(&ROOT.to_uppercase().replace("0X", "0x")), "2"),
            tx(Some("0x03"), Some(ROOT), Some(PEER), "0"),
        ];
        let graph = builder(InMemoryProvider::new()).build_from_transactions(ROOT, &eth(), &txs);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.is_closed());

        let peer = PEER.to_lowercase();
        assert_eq!(graph.edges[0].id, format!("0x01_{}_{}", ROOT.to_lowercase(), peer));
        assert_eq!(graph.edges[0].label, "+1.5000 ETH\n2024-02-10 12:00:00");
        assert_eq!(graph.edges[1].source, peer);
        assert_eq!(graph.edges[2].label, "0 ETH (Call)\n2024-02-10 12:00:00");
    }

    #[test]
    fn test_drops_records_missing_endpoints_and_unrelated() {
        let txs = vec![
            tx(Some("0x01"), None, Some(PEER), "1"),
            tx(Some("0x02"), Some(ROOT), Some("  "), "1"),
            tx(Some("0x03"), Some(PEER), Some("0x00000000000000000000000000000000000000c3"), "1"),
        ];
        let graph = builder(InMemoryProvider::new()).build_from_transactions(ROOT, &eth(), &txs);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_node_cap_bounds_transactions() {
        let txs: Vec<TransactionRecord> = (0..150)
            .map(|i| {
                let peer = format!("0x{:040x}", i + 10);
                tx(Some(&format!("0x{:x}", i)), Some(ROOT), Some(&peer), "1")
            })
            .collect();
        let graph = builder(InMemoryProvider::new()).build_from_transactions(ROOT, &eth(), &txs);
        assert_eq!(graph.edges.len(), 100);
        assert_eq!(graph.nodes.len(), 101);
    }

    #[test]
    fn test_hashless_edges_get_stable_ids() {
        let txs = vec![tx(None, Some(ROOT), Some(PEER), "3")];
        let b = builder(InMemoryProvider::new());
        let first = b.build_from_transactions(ROOT, &eth(), &txs);
        let second = b.build_from_transactions(ROOT, &eth(), &txs);
        assert!(first.edges[0].id.starts_with("synthetic-"));
        assert_eq!(first.edges[0].id, second.edges[0].id);
    }

    #[test]
    fn test_case_sensitive_chain_keeps_case() {
        let root = "13AM4VW2dhxYgXeQepoHkHSQuy6NgaEb94";
        let peer = "1LckefQJZ8aaaaaaaaaaaaaaaaaaaaaaaa";
        let txs = vec![tx(Some("abc"), Some(root), Some(peer), "0.0172")];
        let graph = builder(InMemoryProvider::new()).build_from_transactions(
            root,
            &ChainRef::from(Chain::Bitcoin),
            &txs,
        );
        assert_eq!(graph.root().unwrap().id, root);
        assert!(graph.contains_node(peer));
        assert_eq!(graph.edges[0].currency, "BTC");
    }

    #[test]
    fn test_enrichment_from_label_store() {
        let mut store = EntityLabelStore::new();
        store.insert_address(
            PEER,
            EntityInfo {
                entity_type: EntityType::Exchange,
                risk: 10,
                label: "Exchange deposit".to_string(),
                icon: None,
            },
        );
        let b = GraphBuilder::new(
            Arc::new(InMemoryProvider::new()),
            Arc::new(store),
            GraphConfig::default(),
        );
        let graph = b.build_from_transactions(ROOT, &eth(), &[tx(Some("0x01"), Some(ROOT), Some(PEER), "1")]);
        let peer = graph.node(&PEER.to_lowercase()).unwrap();
        assert_eq!(peer.entity_type, EntityType::Exchange);
        assert_eq!(peer.label, "Exchange deposit");
        assert_eq!(peer.icon, "icon:exchange");
    }

    #[test]
    fn test_default_wallet_risk_is_bounded() {
        let txs: Vec<TransactionRecord> = (0..50)
            .map(|i| tx(Some(&format!("0x{:x}", i)), Some(ROOT), Some(&format!("0x{:040x}", i + 1)), "1"))
            .collect();
        let graph = builder(InMemoryProvider::new()).build_from_transactions(ROOT, &eth(), &txs);
        for node in graph.nodes.iter().filter(|n| !n.is_root) {
            assert_eq!(node.entity_type, EntityType::Wallet);
            assert!(node.risk <= 40);
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ChainDataProvider for FailingProvider {
        async fn fetch(&self, _chain: &ChainRef, _address: &str) -> eyre::Result<ProviderResponse> {
            Err(eyre::eyre!("explorer returned 502"))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl ChainDataProvider for SlowProvider {
        async fn fetch(&self, _chain: &ChainRef, _address: &str) -> eyre::Result<ProviderResponse> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(ProviderResponse::default())
        }
    }

    #[tokio::test]
    async fn test_provider_error_degrades_to_root_only() {
        let b = GraphBuilder::new(Arc::new(FailingProvider), Arc::new(NoLabels), GraphConfig::default());
        let graph = b.build_graph(ROOT, &eth()).await;
        assert_eq!(graph.nodes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_degrades_to_root_only() {
        let b = GraphBuilder::new(Arc::new(SlowProvider), Arc::new(NoLabels), GraphConfig::default());
        let graph = b.build_graph(ROOT, &eth()).await;
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn test_build_graph_from_provider() {
        let provider = InMemoryProvider::new().with_history(
            &eth(),
            ROOT,
            vec![tx(Some("0x01"), Some(PEER), Some(ROOT), "4.2")],
        );
        let graph = builder(provider).build_graph(ROOT, &eth()).await;
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges[0].target, ROOT.to_lowercase());
    }

    #[tokio::test]
    async fn test_padded_address_matches_its_history() {
        let provider = InMemoryProvider::new().with_history(
            &eth(),
            ROOT,
            vec![tx(Some("0x01"), Some(ROOT), Some(PEER), "1")],
        );
        let padded = format!("  {} ", ROOT);
        let graph = builder(provider).build_graph(&padded, &eth()).await;
        assert_eq!(graph.root().unwrap().id, ROOT.to_lowercase());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
    }
}
