use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Serialize;
use std::collections::HashSet;

use crate::entity::EntityType;

/// An address in a traced neighborhood. `id` is the canonical address.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub entity_type: EntityType,
    pub risk: u8,
    pub icon: String,
    pub is_root: bool,
}

/// One transaction between two nodes. Parallel edges are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub timestamp: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.is_root)
    }

    /// Edges leaving `source`, in insertion order.
    pub fn outgoing<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == source)
    }

    /// Every edge endpoint is present as a node.
    pub fn is_closed(&self) -> bool {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
    }

    /// Flatten into the element list consumed by graph renderers: nodes first, then edges.
    pub fn to_elements(&self) -> Vec<GraphElement> {
        let nodes = self.nodes.iter().map(|node| GraphElement {
            data: ElementData::Node(NodeData {
                id: node.id.clone(),
                label: node.label.clone(),
                entity_type: node.entity_type,
                risk: node.risk,
                icon: node.icon.clone(),
            }),
            classes: node.is_root.then(|| "root".to_string()),
        });
        let edges = self.edges.iter().map(|edge| GraphElement {
            data: ElementData::Edge(EdgeData {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                amount: edge.amount.to_f64().unwrap_or(0.0),
                label: edge.label.clone(),
                currency: edge.currency.clone(),
                timestamp: edge.timestamp.clone(),
            }),
            classes: None,
        });
        nodes.chain(edges).collect()
    }
}

/// Wire format element: `{"data": {...}, "classes": "root"}`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphElement {
    pub data: ElementData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ElementData {
    Node(NodeData),
    Edge(EdgeData),
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub risk: u8,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeData {
    pub id: String,
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub label: String,
    pub currency: String,
    pub timestamp: String,
}
