pub mod engine;
pub mod forest;
pub mod rules;
pub mod types;

pub use engine::AnomalyDetector;
pub use rules::PatternDetector;
pub use types::{AnomalyReason, AnomalyRecord, PatternFinding, PatternType, Severity};
