use std::collections::HashMap;

use crate::chain::detect::canonical_key;
use crate::config::EntityAttributionConfig;

use super::known_entities;
use super::lookup::{EntityInfo, EntityLookup};
use super::ofac;

/// In-memory index of entity labels.
///
/// Exact entries are keyed by canonical address (`0x…` lowercased, everything
/// else kept as-is). Prefix entries match case-insensitively; the longest prefix wins.
#[derive(Debug, Default)]
pub struct EntityLabelStore {
    by_address: HashMap<String, EntityInfo>,
    prefixes: Vec<(String, EntityInfo)>,
}

impl EntityLabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from every configured label source.
    /// A missing or unreadable file is logged and skipped.
    pub fn from_config(config: &EntityAttributionConfig) -> Self {
        let mut store = Self::new();

        if let Some(path) = &config.known_entities_path {
            match known_entities::load_known_entities(&mut store, path) {
                Ok(count) => tracing::info!(count, "Known entities loaded"),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load known entities, continuing without")
                }
            }
        }

        if let Some(path) = &config.ofac_sdn_path {
            match ofac::parse_ofac_csv(path) {
                Ok(entries) => {
                    let count = ofac::seed_ofac_entries(&mut store, &entries);
                    tracing::info!(count, "OFAC SDN entries loaded");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load OFAC SDN file, continuing without");
                }
            }
        }

        if !config.manual_labels.is_empty() {
            known_entities::seed_manual_labels(&mut store, &config.manual_labels);
        }

        tracing::info!(
            labels = store.by_address.len(),
            prefixes = store.prefixes.len(),
            "Loaded entity label store"
        );
        store
    }

    /// Insert or replace the label for one address.
    pub fn insert_address(&mut self, address: &str, info: EntityInfo) {
        self.by_address.insert(canonical_key(address), info);
    }

    pub fn insert_prefix(&mut self, prefix: &str, info: EntityInfo) {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return;
        }
        self.prefixes.push((prefix, info));
        // Longest prefix first so the most specific entry matches
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    pub fn len(&self) -> usize {
        self.by_address.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityLookup for EntityLabelStore {
    fn lookup(&self, canonical_address: &str) -> Option<EntityInfo> {
        if let Some(info) = self.by_address.get(canonical_address) {
            return Some(info.clone());
        }
        if let Some(info) = self.by_address.get(&canonical_key(canonical_address)) {
            return Some(info.clone());
        }

        let lowered = canonical_address.to_ascii_lowercase();
        self.prefixes
            .iter()
            .find(|(prefix, _)| lowered.starts_with(prefix.as_str()))
            .map(|(_, info)| info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::lookup::EntityType;

    fn info(entity_type: EntityType, label: &str) -> EntityInfo {
        EntityInfo {
            entity_type,
            risk: entity_type.default_risk(),
            label: label.to_string(),
            icon: None,
        }
    }

    #[test]
    fn test_exact_lookup_evm_is_case_insensitive() {
        let mut store = EntityLabelStore::new();
        store.insert_address(
            "0xABCDEF0000000000000000000000000000000001",
            info(EntityType::Exchange, "Exchange hot wallet"),
        );
        let found = store
            .lookup("0xabcdef0000000000000000000000000000000001")
            .unwrap();
        assert_eq!(found.label, "Exchange hot wallet");
    }

    #[test]
    fn test_exact_lookup_base58_is_case_sensitive() {
        let mut store = EntityLabelStore::new();
        store.insert_address(
            "13AM4VW2dhxYgXeQepoHkHSQuy6NgaEb94",
            info(EntityType::Ransomware, "WannaCry"),
        );
        assert!(store.lookup("13AM4VW2dhxYgXeQepoHkHSQuy6NgaEb94").is_some());
        assert!(store.lookup("13am4vw2dhxygxeqepohkhsquy6ngaeb94").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut store = EntityLabelStore::new();
        store.insert_prefix("1nd", info(EntityType::Wallet, "short"));
        store.insert_prefix("1NDY", info(EntityType::Exchange, "long"));
        assert_eq!(store.lookup("1NdyJtNTjmwk5xPNhjgAMu4HDHigtobu1s").unwrap().label, "long");
        assert_eq!(store.lookup("1ndQ").unwrap().label, "short");
        assert!(store.lookup("1Lck").is_none());
    }

    #[test]
    fn test_from_config_without_sources_is_empty() {
        let store = EntityLabelStore::from_config(&EntityAttributionConfig::default());
        assert!(store.is_empty());
    }
}
