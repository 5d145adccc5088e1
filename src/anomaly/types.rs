use serde::Serialize;

use crate::provider::TransactionRecord;

/// Why a transaction was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    StatisticalOutlier,
}

impl AnomalyReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::StatisticalOutlier => "Statistical Outlier (Value/Timing)",
        }
    }
}

/// A transaction the outlier model ranked as anomalous.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyRecord {
    /// Position of the transaction in the input slice.
    pub index: usize,
    pub transaction: TransactionRecord,
    /// Decision score, more negative is more anomalous.
    pub score: f64,
    pub reasons: Vec<AnomalyReason>,
    /// Human-readable summary of `reasons`.
    pub reason: String,
}

/// Heuristic laundering patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    HighFrequencyOutflow,
    RoundTripping,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighFrequencyOutflow => "high_frequency_outflow",
            Self::RoundTripping => "round_tripping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternFinding {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub severity: Severity,
    pub description: String,
    pub implicated_entities: Vec<String>,
}
