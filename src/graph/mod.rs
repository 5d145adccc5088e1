pub mod builder;
pub mod pathfinder;
pub mod scanner;
pub mod types;

pub use builder::GraphBuilder;
pub use pathfinder::{PathFinder, PathResult};
pub use scanner::{merge_graphs, MultiChainScanner};
pub use types::{Graph, GraphEdge, GraphElement, GraphNode};
