use alloy::primitives::Address;
use serde::Deserialize;
use std::str::FromStr;

use crate::config::ManualLabelConfig;

use super::label_store::EntityLabelStore;
use super::lookup::{EntityInfo, EntityType};

#[derive(Debug, Deserialize)]
struct KnownEntity {
    address: Option<String>,
    prefix: Option<String>,
    entity_type: EntityType,
    risk: Option<u8>,
    label: String,
    icon: Option<String>,
}

/// Load a known-entities JSON file into the label store.
///
/// Format: `[{"address" | "prefix": "...", "entity_type": "exchange", "risk": 10, "label": "...", "icon": "..."}]`
pub fn load_known_entities(store: &mut EntityLabelStore, path: &str) -> eyre::Result<u64> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("Failed to read known entities file '{}': {}", path, e))?;
    seed_known_entities(store, &content)
}

pub fn seed_known_entities(store: &mut EntityLabelStore, content: &str) -> eyre::Result<u64> {
    let entities: Vec<KnownEntity> = serde_json::from_str(content)
        .map_err(|e| eyre::eyre!("Failed to parse known entities JSON: {}", e))?;

    let mut count = 0u64;

    for entity in entities {
        let info = EntityInfo {
            entity_type: entity.entity_type,
            risk: entity
                .risk
                .unwrap_or_else(|| entity.entity_type.default_risk())
                .min(100),
            label: entity.label,
            icon: entity.icon,
        };

        match (entity.address, entity.prefix) {
            (Some(address), _) => {
                if !valid_evm_or_other(&address) {
                    tracing::warn!(address = %address, "Invalid address in known entities, skipping");
                    continue;
                }
                store.insert_address(&address, info);
            }
            (None, Some(prefix)) => store.insert_prefix(&prefix, info),
            (None, None) => {
                tracing::warn!(label = %info.label, "Known entity without address or prefix, skipping");
                continue;
            }
        }
        count += 1;
    }

    tracing::debug!(count, "Seeded known entities");
    Ok(count)
}

/// Add manual labels from config to the label store.
pub fn seed_manual_labels(store: &mut EntityLabelStore, labels: &[ManualLabelConfig]) -> usize {
    let mut count = 0;

    for label_cfg in labels {
        if !valid_evm_or_other(&label_cfg.address) {
            tracing::warn!(
                address = %label_cfg.address,
                "Invalid address in manual label, skipping"
            );
            continue;
        }

        store.insert_address(
            &label_cfg.address,
            EntityInfo {
                entity_type: label_cfg.entity_type,
                risk: label_cfg
                    .risk
                    .unwrap_or_else(|| label_cfg.entity_type.default_risk())
                    .min(100),
                label: label_cfg.entity_name.clone(),
                icon: label_cfg.icon.clone(),
            },
        );
        count += 1;
    }

    tracing::info!(labels = count, "Seeded manual entity labels");
    count
}

// Only `0x` addresses have a syntax we can check without knowing the chain.
fn valid_evm_or_other(address: &str) -> bool {
    let address = address.trim();
    if address.is_empty() {
        return false;
    }
    if address.starts_with("0x") || address.starts_with("0X") {
        return Address::from_str(address).is_ok();
    }
    true
}
