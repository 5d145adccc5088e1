use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::chain::{normalize, ChainRef};
use crate::config::{NeighborOrder, PathfinderConfig};
use crate::entity::{short_label, EntityType};

use super::builder::GraphBuilder;
use super::types::{Graph, GraphEdge, GraphNode};

/// Levels the search actually explores: direct edges, then one intermediate hop.
pub const SEARCHED_LEVELS: u32 = 2;

/// Outcome of a bounded path search.
#[derive(Debug, Clone)]
pub enum PathResult {
    /// Subgraph made of the connecting edges and their endpoints.
    /// `via` is the intermediate address for two-hop paths.
    Found { graph: Graph, via: Option<String> },
    /// The bounded search ran out of candidates. A path may still exist beyond it.
    NotFound { message: String, levels_searched: u32 },
}

impl PathResult {
    pub fn is_found(&self) -> bool {
        matches!(self, PathResult::Found { .. })
    }

    pub fn graph(&self) -> Option<&Graph> {
        match self {
            PathResult::Found { graph, .. } => Some(graph),
            PathResult::NotFound { .. } => None,
        }
    }

    /// Element list for a found path, or `{"error": ...}`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            PathResult::Found { graph, .. } => json!(graph.to_elements()),
            PathResult::NotFound {
                message,
                levels_searched,
            } => json!({ "error": message, "levels_searched": levels_searched }),
        }
    }
}

/// Bounded breadth search for a directed connection between two addresses,
/// discovering the graph through the builder one neighborhood at a time.
pub struct PathFinder {
    builder: Arc<GraphBuilder>,
    config: PathfinderConfig,
}

impl PathFinder {
    pub fn new(builder: Arc<GraphBuilder>, config: PathfinderConfig) -> Self {
        Self { builder, config }
    }

    /// Search with the configured depth and breadth.
    pub async fn find(&self, source: &str, target: &str, chain: &ChainRef) -> eyre::Result<PathResult> {
        self.find_path(source, target, chain, self.config.max_depth, self.config.breadth)
            .await
    }

    /// Look for `source -> target` or `source -> neighbor -> target`.
    ///
    /// Only the first two levels are explored whatever `max_depth` says.
    /// Blank `source` or `target` is the only error.
    pub async fn find_path(
        &self,
        source: &str,
        target: &str,
        chain: &ChainRef,
        max_depth: u32,
        breadth: usize,
    ) -> eyre::Result<PathResult> {
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() {
            eyre::bail!("Path search requires a source address");
        }
        if target.is_empty() {
            eyre::bail!("Path search requires a target address");
        }

        let source = normalize(source, chain);
        let target = normalize(target, chain);
        if max_depth > SEARCHED_LEVELS {
            tracing::debug!(max_depth, "Path search is limited to two hops");
        }
        tracing::info!(source = %source, target = %target, chain = %chain, "Starting path search");

        // Level 0: direct edges
        let source_graph = self.builder.build_graph(&source, chain).await;
        let direct: Vec<GraphEdge> = connecting_edges(&source_graph, &source, &target).collect();
        if !direct.is_empty() {
            tracing::info!(edges = direct.len(), "Direct path found");
            return Ok(PathResult::Found {
                graph: path_graph(&source, direct, &[&source_graph]),
                via: None,
            });
        }

        if max_depth < SEARCHED_LEVELS || breadth == 0 {
            return Ok(not_found(1));
        }

        // Level 1: expand neighbors concurrently, first connecting result wins
        let neighbors = select_neighbors(&source_graph, &source, &target, breadth, self.config.neighbor_order);
        if neighbors.is_empty() {
            return Ok(not_found(SEARCHED_LEVELS));
        }
        tracing::debug!(neighbors = neighbors.len(), "Expanding first-hop neighbors");

        let semaphore = Arc::new(Semaphore::new(breadth));
        let mut pending: FuturesUnordered<_> = neighbors
            .into_iter()
            .map(|neighbor| {
                let builder = Arc::clone(&self.builder);
                let semaphore = Arc::clone(&semaphore);
                let chain = chain.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let graph = builder.build_graph(&neighbor, &chain).await;
                    (neighbor, graph)
                })
            })
            .collect();

        // Every expansion runs to completion; later results are discarded
        let mut winner: Option<(String, Graph)> = None;
        while let Some(joined) = pending.next().await {
            match joined {
                Ok((neighbor, graph)) => {
                    if winner.is_none()
                        && connecting_edges(&graph, &neighbor, &target).next().is_some()
                    {
                        tracing::info!(via = %neighbor, "Path found through neighbor");
                        winner = Some((neighbor, graph));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Neighbor expansion task failed, skipping");
                }
            }
        }

        match winner {
            Some((neighbor, neighbor_graph)) => {
                let mut edges: Vec<GraphEdge> =
                    connecting_edges(&source_graph, &source, &neighbor).collect();
                edges.extend(connecting_edges(&neighbor_graph, &neighbor, &target));
                Ok(PathResult::Found {
                    graph: path_graph(&source, edges, &[&source_graph, &neighbor_graph]),
                    via: Some(neighbor),
                })
            }
            None => Ok(not_found(SEARCHED_LEVELS)),
        }
    }
}

fn not_found(levels_searched: u32) -> PathResult {
    PathResult::NotFound {
        message: "No direct path found within search limits.".to_string(),
        levels_searched,
    }
}

fn connecting_edges<'a>(
    graph: &'a Graph,
    from: &'a str,
    to: &'a str,
) -> impl Iterator<Item = GraphEdge> + 'a {
    graph
        .outgoing(from)
        .filter(move |e| e.target == to)
        .cloned()
}

/// Distinct targets of the source's outgoing edges, excluding both endpoints.
fn select_neighbors(
    graph: &Graph,
    source: &str,
    target: &str,
    breadth: usize,
    order: NeighborOrder,
) -> Vec<String> {
    let mut outgoing: Vec<&GraphEdge> = graph.outgoing(source).collect();
    if order == NeighborOrder::Value {
        // Largest amount first, ties by edge id
        outgoing.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.id.cmp(&b.id)));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    outgoing
        .into_iter()
        .map(|e| e.target.as_str())
        .filter(|t| *t != source && *t != target)
        .filter(|t| seen.insert(*t))
        .take(breadth)
        .map(str::to_string)
        .collect()
}

/// Keep only the given edges and the nodes they touch.
fn path_graph(source: &str, edges: Vec<GraphEdge>, known: &[&Graph]) -> Graph {
    let mut graph = Graph::default();
    let mut seen: HashSet<String> = HashSet::new();

    for edge in &edges {
        for id in [&edge.source, &edge.target] {
            if !seen.insert(id.clone()) {
                continue;
            }
            let mut node = known
                .iter()
                .find_map(|g| g.node(id))
                .cloned()
                .unwrap_or_else(|| GraphNode {
                    id: id.clone(),
                    label: short_label(id),
                    entity_type: EntityType::Entity,
                    risk: EntityType::Entity.default_risk(),
                    icon: EntityType::Entity.default_icon().to_string(),
                    is_root: false,
                });
            node.is_root = node.id == source;
            graph.nodes.push(node);
        }
    }
    graph.edges = edges;
    graph
}
