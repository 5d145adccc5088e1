use alloy::primitives::Address;
use std::collections::HashMap;
use std::str::FromStr;

use super::label_store::EntityLabelStore;
use super::lookup::{EntityInfo, EntityType};

/// A parsed OFAC SDN entry with its crypto addresses.
#[derive(Debug, Clone)]
pub struct OfacEntry {
    pub sdn_id: String,
    pub entity_name: String,
    pub program: String,
    pub addresses: Vec<String>,
}

/// Parse an OFAC SDN CSV file (simplified format).
/// Expected CSV columns: sdn_id, entity_name, program, address
/// Each row represents one crypto address for one SDN entry, on any chain.
pub fn parse_ofac_csv(path: &str) -> eyre::Result<Vec<OfacEntry>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open OFAC CSV '{}': {}", path, e))?;
    parse_ofac_reader(reader)
}

fn parse_ofac_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> eyre::Result<Vec<OfacEntry>> {
    // Keep first-seen SDN order stable
    let mut order: Vec<String> = Vec::new();
    let mut by_sdn: HashMap<String, OfacEntry> = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let sdn_id = record.get(0).unwrap_or("").trim().to_string();
        let entity_name = record.get(1).unwrap_or("").trim().to_string();
        let program = record.get(2).unwrap_or("").trim().to_string();
        let address = record.get(3).unwrap_or("").trim().to_string();

        if address.is_empty() {
            continue;
        }

        let entry = by_sdn.entry(sdn_id.clone()).or_insert_with(|| {
            order.push(sdn_id.clone());
            OfacEntry {
                sdn_id,
                entity_name,
                program,
                addresses: Vec::new(),
            }
        });
        entry.addresses.push(address);
    }

    let entries: Vec<OfacEntry> = order
        .into_iter()
        .filter_map(|id| by_sdn.remove(&id))
        .collect();
    tracing::info!(entries = entries.len(), "Parsed OFAC SDN entries");
    Ok(entries)
}

/// Add sanctioned addresses to the label store. Returns the number of addresses stored.
pub fn seed_ofac_entries(label_store: &mut EntityLabelStore, entries: &[OfacEntry]) -> usize {
    let mut count = 0;

    for entry in entries {
        for address in &entry.addresses {
            if address.starts_with("0x") && Address::from_str(address).is_err() {
                tracing::warn!(
                    address = %address,
                    sdn_id = %entry.sdn_id,
                    "Invalid EVM address in OFAC list, skipping"
                );
                continue;
            }

            let label = if entry.program.is_empty() {
                format!("{} (OFAC SDN)", entry.entity_name)
            } else {
                format!("{} (OFAC {})", entry.entity_name, entry.program)
            };

            label_store.insert_address(
                address,
                EntityInfo {
                    entity_type: EntityType::Entity,
                    risk: 100,
                    label,
                    icon: Some("icon:sanctioned".to_string()),
                },
            );
            count += 1;
        }
    }

    tracing::info!(addresses = count, "Seeded OFAC SDN addresses");
    count
}
