use crate::config::AnomalyDetectionConfig;
use crate::provider::TransactionRecord;

use super::forest;
use super::types::{AnomalyReason, AnomalyRecord};

/// Unsupervised outlier detection over a transaction history.
///
/// Features per transaction are (value, seconds since the previous transaction).
/// The model is fitted fresh on every call, so one detector can serve
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyDetectionConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyDetectionConfig) -> Self {
        Self { config }
    }

    /// Rank transactions and return the ones scored as outliers, in time order.
    ///
    /// Returns nothing when fewer than `min_samples` records carry a timestamp.
    /// Timestamps that do not parse are kept: they sort after every parsed one
    /// and get a zero time delta without moving the clock.
    pub fn detect_anomalies(&self, transactions: &[TransactionRecord]) -> Vec<AnomalyRecord> {
        let mut usable: Vec<(usize, &TransactionRecord, Option<i64>)> = transactions
            .iter()
            .enumerate()
            .filter(|(_, tx)| !tx.timestamp.trim().is_empty())
            .map(|(i, tx)| (i, tx, tx.parsed_timestamp().map(|t| t.timestamp())))
            .collect();

        if usable.len() < self.config.min_samples {
            tracing::debug!(
                usable = usable.len(),
                min_samples = self.config.min_samples,
                "Not enough transactions for anomaly detection"
            );
            return Vec::new();
        }

        usable.sort_by_key(|(_, _, ts)| (ts.is_none(), *ts));

        let mut last_time: Option<i64> = None;
        let rows: Vec<Vec<f64>> = usable
            .iter()
            .map(|(_, tx, ts)| {
                let delta = match (*ts, last_time) {
                    (Some(now), Some(prev)) => (now - prev) as f64,
                    _ => 0.0,
                };
                if ts.is_some() {
                    last_time = *ts;
                }
                vec![finite_value(tx.value_f64()), delta]
            })
            .collect();

        let decisions = forest::decision_scores(&rows, &self.config);

        let anomalies: Vec<AnomalyRecord> = usable
            .iter()
            .zip(decisions)
            .filter(|(_, decision)| *decision < 0.0)
            .map(|((index, tx, _), decision)| {
                let reasons = vec![AnomalyReason::StatisticalOutlier];
                AnomalyRecord {
                    index: *index,
                    transaction: (*tx).clone(),
                    score: (decision * 10_000.0).round() / 10_000.0,
                    reason: describe(&reasons),
                    reasons,
                }
            })
            .collect();

        tracing::debug!(
            samples = rows.len(),
            anomalies = anomalies.len(),
            "Anomaly detection complete"
        );
        anomalies
    }
}

fn describe(reasons: &[AnomalyReason]) -> String {
    reasons
        .iter()
        .map(AnomalyReason::description)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Values past the f64 range convert to infinity; pin them to the largest finite value.
fn finite_value(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}
