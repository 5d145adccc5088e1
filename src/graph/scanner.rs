use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::chain::detect::candidate_chains;
use crate::chain::ChainRef;
use crate::config::ScannerConfig;

use super::builder::GraphBuilder;
use super::types::Graph;

/// Runs one neighborhood build per candidate chain and merges the results.
pub struct MultiChainScanner {
    builder: Arc<GraphBuilder>,
    default_chains: Vec<ChainRef>,
    pool_size: usize,
}

impl MultiChainScanner {
    pub fn new(builder: Arc<GraphBuilder>, config: &ScannerConfig) -> Self {
        Self {
            builder,
            default_chains: config.default_chains.clone(),
            pool_size: config.pool_size.max(1),
        }
    }

    pub fn candidates(&self, address: &str) -> Vec<ChainRef> {
        candidate_chains(address, &self.default_chains)
    }

    /// Scan every candidate chain for `address`.
    ///
    /// Builds run on at most `pool_size` concurrent tasks. The merge starts only
    /// after every build has finished, and follows candidate order.
    pub async fn scan_all(&self, address: &str) -> Graph {
        let chains = self.candidates(address);
        tracing::info!(
            address,
            chains = ?chains.iter().map(ChainRef::tag).collect::<Vec<_>>(),
            "Scanning candidate chains"
        );

        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let tasks: Vec<_> = chains
            .iter()
            .cloned()
            .map(|chain| {
                let builder = Arc::clone(&self.builder);
                let semaphore = Arc::clone(&semaphore);
                let address = address.to_string();
                tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    builder.build_graph(&address, &chain).await
                })
            })
            .collect();

        let results = join_all(tasks).await;

        let mut graphs = Vec::with_capacity(results.len());
        for (chain, result) in chains.iter().zip(results) {
            match result {
                Ok(graph) => graphs.push(graph),
                Err(e) => {
                    tracing::warn!(chain = %chain, error = %e, "Chain scan task failed, skipping");
                }
            }
        }

        let merged = merge_graphs(graphs);
        tracing::info!(
            address,
            nodes = merged.nodes.len(),
            edges = merged.edges.len(),
            "Multi-chain scan complete"
        );
        merged
    }
}

/// Merge graphs in order. The first occurrence of a node id wins; all edges are kept.
pub fn merge_graphs<I>(graphs: I) -> Graph
where
    I: IntoIterator<Item = Graph>,
{
    let mut merged = Graph::default();
    let mut seen: HashSet<String> = HashSet::new();

    for graph in graphs {
        for node in graph.nodes {
            if seen.insert(node.id.clone()) {
                merged.nodes.push(node);
            }
        }
        merged.edges.extend(graph.edges);
    }

    merged
}
