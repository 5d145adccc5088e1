use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::anomaly::{AnomalyDetector, AnomalyRecord, PatternDetector, PatternFinding};
use crate::chain::{normalize, ChainRef};
use crate::config::Config;
use crate::entity::{EntityLabelStore, EntityLookup};
use crate::graph::{Graph, GraphBuilder, GraphElement, MultiChainScanner, PathFinder, PathResult};
use crate::provider::types::parse_timestamp;
use crate::provider::{ChainDataProvider, TransactionRecord};

/// Inclusive time bounds on the history an investigation looks at.
///
/// A bare `YYYY-MM-DD` start means midnight, a bare end date covers the whole day.
/// With any bound set, records whose timestamp does not parse are left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> eyre::Result<Self> {
        let start = start
            .map(|raw| {
                parse_bound(raw, false).ok_or_else(|| eyre::eyre!("Invalid start date '{}'", raw))
            })
            .transpose()?;
        let end = end
            .map(|raw| {
                parse_bound(raw, true).ok_or_else(|| eyre::eyre!("Invalid end date '{}'", raw))
            })
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                eyre::bail!("Start date {} is after end date {}", start, end);
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, tx: &TransactionRecord) -> bool {
        if self.is_unbounded() {
            return true;
        }
        match tx.parsed_timestamp() {
            Some(ts) => {
                self.start.map_or(true, |start| ts >= start) && self.end.map_or(true, |end| ts <= end)
            }
            None => false,
        }
    }
}

fn parse_bound(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        return time.map(|t| t.and_utc());
    }
    parse_timestamp(raw)
}

/// Everything learned about one address on one chain.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationReport {
    pub address: String,
    pub chain: String,
    pub explorer_url: String,
    /// Transactions per type as reported by the provider.
    pub counts: BTreeMap<String, u64>,
    pub elements: Vec<GraphElement>,
    pub anomalies: Vec<AnomalyRecord>,
    pub patterns: Vec<PatternFinding>,
}

/// Wires the graph and analytics components to one provider and one label store:
/// 1. Neighborhood graph (single chain or every candidate chain)
/// 2. Path search between two addresses
/// 3. Anomaly and pattern detection over the fetched history
pub struct InvestigationPipeline {
    pub builder: Arc<GraphBuilder>,
    pub scanner: MultiChainScanner,
    pub pathfinder: PathFinder,
    pub anomaly_detector: AnomalyDetector,
    pub pattern_detector: PatternDetector,
}

impl InvestigationPipeline {
    /// Load entity labels from the configured sources and build every component.
    pub fn init(config: &Config, provider: Arc<dyn ChainDataProvider>) -> Self {
        let labels: Arc<dyn EntityLookup> =
            Arc::new(EntityLabelStore::from_config(&config.entity_attribution));
        Self::with_labels(config, provider, labels)
    }

    pub fn with_labels(
        config: &Config,
        provider: Arc<dyn ChainDataProvider>,
        labels: Arc<dyn EntityLookup>,
    ) -> Self {
        let builder = Arc::new(GraphBuilder::new(provider, labels, config.graph.clone()));

        Self {
            scanner: MultiChainScanner::new(Arc::clone(&builder), &config.scanner),
            pathfinder: PathFinder::new(Arc::clone(&builder), config.pathfinder.clone()),
            anomaly_detector: AnomalyDetector::new(config.anomaly_detection.clone()),
            pattern_detector: PatternDetector::new(config.patterns.clone()),
            builder,
        }
    }

    pub async fn trace(&self, address: &str, chain: &ChainRef) -> Graph {
        self.builder.build_graph(address, chain).await
    }

    pub async fn trace_all(&self, address: &str) -> Graph {
        self.scanner.scan_all(address).await
    }

    pub async fn find_path(
        &self,
        source: &str,
        target: &str,
        chain: &ChainRef,
    ) -> eyre::Result<PathResult> {
        self.pathfinder.find(source, target, chain).await
    }

    /// Fetch the history once, keep what falls inside `window`, then build the
    /// graph and run both detectors on it. `counts` describes the full fetch.
    pub async fn investigate(
        &self,
        address: &str,
        chain: &ChainRef,
        window: &TimeWindow,
    ) -> InvestigationReport {
        let address = address.trim();
        let response = self.builder.fetch_transactions(address, chain).await;
        let transactions: Vec<TransactionRecord> = response
            .transactions
            .iter()
            .filter(|tx| window.contains(tx))
            .cloned()
            .collect();
        if !window.is_unbounded() {
            tracing::debug!(
                fetched = response.transactions.len(),
                in_window = transactions.len(),
                "Applied time window"
            );
        }

        let graph = self
            .builder
            .build_from_transactions(address, chain, &transactions);
        let anomalies = self.anomaly_detector.detect_anomalies(&transactions);
        let patterns = self.pattern_detector.detect_patterns(&transactions, address);

        log_findings(&anomalies, &patterns);

        tracing::info!(
            chain = %chain,
            transactions = transactions.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Investigation complete"
        );

        let address = normalize(address, chain);
        InvestigationReport {
            explorer_url: chain.explorer_url(&address),
            address,
            chain: chain.tag(),
            counts: response.counts,
            elements: graph.to_elements(),
            anomalies,
            patterns,
        }
    }
}

fn log_findings(anomalies: &[AnomalyRecord], patterns: &[PatternFinding]) {
    for pattern in patterns {
        tracing::warn!(
            pattern_type = pattern.pattern_type.as_str(),
            severity = ?pattern.severity,
            entities = ?pattern.implicated_entities,
            "PATTERN DETECTED"
        );
    }
    if !anomalies.is_empty() {
        tracing::warn!(anomalies = anomalies.len(), "Statistical outliers found");
    }
}
