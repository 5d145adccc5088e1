pub mod anomaly;
pub mod chain;
pub mod config;
pub mod entity;
pub mod graph;
pub mod pipeline;
pub mod provider;
