use serde::Deserialize;

use crate::chain::ChainRef;
use crate::entity::EntityType;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub pathfinder: PathfinderConfig,
    #[serde(default)]
    pub anomaly_detection: AnomalyDetectionConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub entity_attribution: EntityAttributionConfig,
}

// ============================================================
// Graph Builder Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    /// Only the first `node_cap` transactions of a fetch are turned into graph elements.
    #[serde(default = "default_node_cap")]
    pub node_cap: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_root_risk")]
    pub root_risk: u8,
    /// Upper bound (inclusive) of the placeholder risk given to unlabeled wallets.
    #[serde(default = "default_risk_max")]
    pub default_risk_max: u8,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_cap: default_node_cap(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            root_risk: default_root_risk(),
            default_risk_max: default_risk_max(),
        }
    }
}

fn default_node_cap() -> usize {
    100
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_root_risk() -> u8 {
    50
}

fn default_risk_max() -> u8 {
    40
}

// ============================================================
// Multi-Chain Scanner Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_chains")]
    pub default_chains: Vec<ChainRef>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            default_chains: default_chains(),
        }
    }
}

fn default_pool_size() -> usize {
    5
}

fn default_chains() -> Vec<ChainRef> {
    [1, 56, 137, 10, 42161]
        .into_iter()
        .map(ChainRef::Id)
        .collect()
}

// ============================================================
// Path Finder Config
// ============================================================

/// Order in which first-hop neighbors are expanded.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NeighborOrder {
    /// Order of first appearance in the source's history.
    #[default]
    Discovery,
    /// Largest outgoing transfer first.
    Value,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathfinderConfig {
    #[serde(default = "default_breadth")]
    pub breadth: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub neighbor_order: NeighborOrder,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            breadth: default_breadth(),
            max_depth: default_max_depth(),
            neighbor_order: NeighborOrder::default(),
        }
    }
}

fn default_breadth() -> usize {
    5
}

fn default_max_depth() -> u32 {
    3
}

// ============================================================
// Anomaly Detection Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct AnomalyDetectionConfig {
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Expected share of outliers in a history.
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl Default for AnomalyDetectionConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            contamination: default_contamination(),
            seed: default_seed(),
            n_estimators: default_n_estimators(),
            max_samples: default_max_samples(),
        }
    }
}

fn default_min_samples() -> usize {
    5
}

fn default_contamination() -> f64 {
    0.05
}

fn default_seed() -> u64 {
    42
}

fn default_n_estimators() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

// ============================================================
// Pattern Detection Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct PatternConfig {
    #[serde(default = "default_outflow_threshold")]
    pub high_frequency_outflow_threshold: usize,
    #[serde(default = "default_true")]
    pub round_trip_enabled: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            high_frequency_outflow_threshold: default_outflow_threshold(),
            round_trip_enabled: true,
        }
    }
}

fn default_outflow_threshold() -> usize {
    10
}

fn default_true() -> bool {
    true
}

// ============================================================
// Provider Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// JSON snapshot of per-chain histories served by the CLI.
    pub snapshot_path: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

// ============================================================
// Entity Attribution Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EntityAttributionConfig {
    pub known_entities_path: Option<String>,
    pub ofac_sdn_path: Option<String>,
    #[serde(default)]
    pub manual_labels: Vec<ManualLabelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ManualLabelConfig {
    pub address: String,
    pub entity_name: String,
    pub entity_type: EntityType,
    pub risk: Option<u8>,
    pub icon: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.graph.node_cap == 0 {
            return Err(eyre::eyre!("graph.node_cap must be greater than zero"));
        }
        if !(1..=60).contains(&self.graph.fetch_timeout_secs) {
            return Err(eyre::eyre!(
                "graph.fetch_timeout_secs must be between 1 and 60, got {}",
                self.graph.fetch_timeout_secs
            ));
        }
        if self.graph.root_risk > 100 || self.graph.default_risk_max > 100 {
            return Err(eyre::eyre!("Graph risk scores must be within 0..=100"));
        }
        if self.scanner.default_chains.is_empty() {
            return Err(eyre::eyre!("At least one default chain must be configured"));
        }
        if self.scanner.pool_size == 0 {
            return Err(eyre::eyre!("scanner.pool_size must be greater than zero"));
        }
        // Breadth doubles as the neighbor expansion pool size
        if self.pathfinder.breadth == 0 {
            return Err(eyre::eyre!("pathfinder.breadth must be greater than zero"));
        }
        let contamination = self.anomaly_detection.contamination;
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(eyre::eyre!(
                "anomaly_detection.contamination must be in (0, 0.5], got {}",
                contamination
            ));
        }
        if self.anomaly_detection.n_estimators == 0 || self.anomaly_detection.max_samples < 2 {
            return Err(eyre::eyre!(
                "anomaly_detection needs at least one estimator and max_samples >= 2"
            ));
        }
        for label in &self.entity_attribution.manual_labels {
            if label.address.trim().is_empty() {
                return Err(eyre::eyre!(
                    "Manual label '{}' has an empty address",
                    label.entity_name
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[graph]
node_cap = 50

[scanner]
default_chains = [1, "bitcoin", "137"]

[pathfinder]
neighbor_order = "value"

[anomaly_detection]
contamination = 0.1

[[entity_attribution.manual_labels]]
address = "0xD551234Ae421e3BCBA99A0Da6d736074f22192FF"
entity_name = "Exchange 1"
entity_type = "exchange"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();
        assert_eq!(config.graph.node_cap, 50);
        assert_eq!(config.graph.fetch_timeout_secs, 10); // default
        assert_eq!(
            config.scanner.default_chains,
            vec![
                ChainRef::Id(1),
                ChainRef::Name("bitcoin".to_string()),
                ChainRef::Id(137)
            ]
        );
        assert_eq!(config.pathfinder.neighbor_order, NeighborOrder::Value);
        assert_eq!(config.pathfinder.breadth, 5); // default
        assert_eq!(config.anomaly_detection.seed, 42); // default
        assert_eq!(
            config.entity_attribution.manual_labels[0].entity_type,
            EntityType::Exchange
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.scanner.default_chains.len(), 5);
        assert_eq!(config.anomaly_detection.min_samples, 5);
        assert_eq!(config.patterns.high_frequency_outflow_threshold, 10);
        assert!(config.patterns.round_trip_enabled);
        assert!(config.provider.snapshot_path.is_none());
    }

    #[test]
    fn test_validate_timeout_range() {
        let mut config = Config::default();
        config.graph.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.graph.fetch_timeout_secs = 61;
        assert!(config.validate().is_err());
        config.graph.fetch_timeout_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_contamination() {
        let mut config = Config::default();
        config.anomaly_detection.contamination = 0.0;
        assert!(config.validate().is_err());
        config.anomaly_detection.contamination = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_default_chains() {
        let mut config = Config::default();
        config.scanner.default_chains.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/config.toml").is_err());
    }
}
