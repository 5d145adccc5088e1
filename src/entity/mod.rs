pub mod known_entities;
pub mod label_store;
pub mod lookup;
pub mod ofac;

pub use label_store::EntityLabelStore;
pub use lookup::{short_label, EntityInfo, EntityLookup, EntityType, NoLabels};
