use serde::{Deserialize, Serialize};

/// Classification shown on graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Target,
    Wallet,
    Exchange,
    Ransomware,
    Entity,
}

impl EntityType {
    /// Icon reference resolved by the rendering layer.
    pub fn default_icon(&self) -> &'static str {
        match self {
            Self::Target => "icon:target",
            Self::Wallet => "icon:wallet",
            Self::Exchange => "icon:exchange",
            Self::Ransomware => "icon:ransomware",
            Self::Entity => "icon:entity",
        }
    }

    pub fn default_risk(&self) -> u8 {
        match self {
            Self::Ransomware => 100,
            Self::Target | Self::Entity => 50,
            Self::Wallet => 20,
            Self::Exchange => 10,
        }
    }
}

/// What the intelligence source knows about an address.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub entity_type: EntityType,
    pub risk: u8,
    pub label: String,
    pub icon: Option<String>,
}

impl EntityInfo {
    pub fn icon_ref(&self) -> String {
        self.icon
            .clone()
            .unwrap_or_else(|| self.entity_type.default_icon().to_string())
    }
}

/// Pluggable address intelligence, supplied at construction time.
pub trait EntityLookup: Send + Sync {
    fn lookup(&self, canonical_address: &str) -> Option<EntityInfo>;
}

/// Lookup that knows nothing; every address falls back to the default classification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLabels;

impl EntityLookup for NoLabels {
    fn lookup(&self, _canonical_address: &str) -> Option<EntityInfo> {
        None
    }
}

/// `0xd8da6b...6045` style display label.
pub fn short_label(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
