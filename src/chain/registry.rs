use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address encoding family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    /// Account-model hex addresses; letter case carries no meaning.
    Evm,
    /// base58 / bech32 style addresses; letter case is part of the encoding.
    CaseSensitive,
}

/// Every chain the tracer knows by id or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Ethereum,
    Bsc,
    Polygon,
    Optimism,
    Arbitrum,
    Avalanche,
    Fantom,
    Cronos,
    Base,
    Linea,
    Blast,
    Sepolia,
    Bitcoin,
    Solana,
    Tron,
    Xrp,
}

struct ChainInfo {
    chain: Chain,
    id: i64,
    tag: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
    family: ChainFamily,
    currency: &'static str,
    explorer: &'static str,
}

// Non-positive ids are reserved for the case-sensitive chains.
const CHAINS: &[ChainInfo] = &[
    ChainInfo {
        chain: Chain::Ethereum,
        id: 1,
        tag: "ethereum",
        name: "Ethereum",
        aliases: &["eth", "ethereum", "mainnet"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://etherscan.io/address/",
    },
    ChainInfo {
        chain: Chain::Bsc,
        id: 56,
        tag: "bsc",
        name: "BNB Smart Chain",
        aliases: &["bsc", "binance", "bnb"],
        family: ChainFamily::Evm,
        currency: "BNB",
        explorer: "https://bscscan.com/address/",
    },
    ChainInfo {
        chain: Chain::Polygon,
        id: 137,
        tag: "polygon",
        name: "Polygon",
        aliases: &["polygon", "matic"],
        family: ChainFamily::Evm,
        currency: "MATIC",
        explorer: "https://polygonscan.com/address/",
    },
    ChainInfo {
        chain: Chain::Optimism,
        id: 10,
        tag: "optimism",
        name: "Optimism",
        aliases: &["optimism", "op"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://optimistic.etherscan.io/address/",
    },
    ChainInfo {
        chain: Chain::Arbitrum,
        id: 42161,
        tag: "arbitrum",
        name: "Arbitrum One",
        aliases: &["arbitrum", "arb"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://arbiscan.io/address/",
    },
    ChainInfo {
        chain: Chain::Avalanche,
        id: 43114,
        tag: "avalanche",
        name: "Avalanche C-Chain",
        aliases: &["avalanche", "avax"],
        family: ChainFamily::Evm,
        currency: "AVAX",
        explorer: "https://snowtrace.io/address/",
    },
    ChainInfo {
        chain: Chain::Fantom,
        id: 250,
        tag: "fantom",
        name: "Fantom",
        aliases: &["fantom", "ftm"],
        family: ChainFamily::Evm,
        currency: "FTM",
        explorer: "https://ftmscan.com/address/",
    },
    ChainInfo {
        chain: Chain::Cronos,
        id: 25,
        tag: "cronos",
        name: "Cronos",
        aliases: &["cronos", "cro"],
        family: ChainFamily::Evm,
        currency: "CRO",
        explorer: "https://cronoscan.com/address/",
    },
    ChainInfo {
        chain: Chain::Base,
        id: 8453,
        tag: "base",
        name: "Base",
        aliases: &["base"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://basescan.org/address/",
    },
    ChainInfo {
        chain: Chain::Linea,
        id: 59144,
        tag: "linea",
        name: "Linea",
        aliases: &["linea"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://lineascan.build/address/",
    },
    ChainInfo {
        chain: Chain::Blast,
        id: 81457,
        tag: "blast",
        name: "Blast",
        aliases: &["blast"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://blastscan.io/address/",
    },
    ChainInfo {
        chain: Chain::Sepolia,
        id: 11155111,
        tag: "sepolia",
        name: "Sepolia",
        aliases: &["sepolia"],
        family: ChainFamily::Evm,
        currency: "ETH",
        explorer: "https://sepolia.etherscan.io/address/",
    },
    ChainInfo {
        chain: Chain::Bitcoin,
        id: 0,
        tag: "bitcoin",
        name: "Bitcoin",
        aliases: &["bitcoin", "btc"],
        family: ChainFamily::CaseSensitive,
        currency: "BTC",
        explorer: "https://mempool.space/address/",
    },
    ChainInfo {
        chain: Chain::Solana,
        id: -1,
        tag: "solana",
        name: "Solana",
        aliases: &["solana", "sol"],
        family: ChainFamily::CaseSensitive,
        currency: "SOL",
        explorer: "https://solscan.io/account/",
    },
    ChainInfo {
        chain: Chain::Tron,
        id: -2,
        tag: "tron",
        name: "Tron",
        aliases: &["tron", "trx"],
        family: ChainFamily::CaseSensitive,
        currency: "TRX",
        explorer: "https://tronscan.org/#/address/",
    },
    ChainInfo {
        chain: Chain::Xrp,
        id: -3,
        tag: "xrp",
        name: "XRP Ledger",
        aliases: &["xrp", "ripple", "xrpl"],
        family: ChainFamily::CaseSensitive,
        currency: "XRP",
        explorer: "https://xrpscan.com/account/",
    },
];

const UNKNOWN_CURRENCY: &str = "UNIT";

impl Chain {
    fn info(self) -> &'static ChainInfo {
        // Every variant has exactly one row in CHAINS.
        CHAINS
            .iter()
            .find(|info| info.chain == self)
            .unwrap_or(&CHAINS[0])
    }

    pub fn all() -> impl Iterator<Item = Chain> {
        CHAINS.iter().map(|info| info.chain)
    }

    pub fn from_id(id: i64) -> Option<Chain> {
        CHAINS.iter().find(|info| info.id == id).map(|info| info.chain)
    }

    /// Resolve a chain name or alias (case-insensitive).
    pub fn from_name(name: &str) -> Option<Chain> {
        let name = name.trim().to_ascii_lowercase();
        CHAINS
            .iter()
            .find(|info| info.tag == name || info.aliases.contains(&name.as_str()))
            .map(|info| info.chain)
    }

    pub fn id(self) -> i64 {
        self.info().id
    }

    /// Tag handed to the chain data provider.
    pub fn tag(self) -> &'static str {
        self.info().tag
    }

    pub fn family(self) -> ChainFamily {
        self.info().family
    }

    pub fn native_currency(self) -> &'static str {
        self.info().currency
    }

    pub fn explorer_url(self, address: &str) -> String {
        format!("{}{}", self.info().explorer, address)
    }
}

/// A chain as a caller names it: a numeric identifier or a name/alias.
///
/// Unknown values are kept verbatim so they can still be forwarded to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawChainRef", into = "RawChainRef")]
pub enum ChainRef {
    Id(i64),
    Name(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawChainRef {
    Id(i64),
    Name(String),
}

impl From<RawChainRef> for ChainRef {
    fn from(raw: RawChainRef) -> Self {
        match raw {
            RawChainRef::Id(id) => ChainRef::Id(id),
            RawChainRef::Name(name) => ChainRef::parse(&name),
        }
    }
}

impl From<ChainRef> for RawChainRef {
    fn from(chain: ChainRef) -> Self {
        match chain {
            ChainRef::Id(id) => RawChainRef::Id(id),
            ChainRef::Name(name) => RawChainRef::Name(name),
        }
    }
}

impl ChainRef {
    /// Parse a chain identifier from user input. Never fails.
    pub fn parse(value: &str) -> ChainRef {
        let trimmed = value.trim();
        match trimmed.parse::<i64>() {
            Ok(id) => ChainRef::Id(id),
            Err(_) => ChainRef::Name(trimmed.to_ascii_lowercase()),
        }
    }

    pub fn resolve(&self) -> Option<Chain> {
        match self {
            ChainRef::Id(id) => Chain::from_id(*id),
            ChainRef::Name(name) => Chain::from_name(name),
        }
    }

    /// Positive ids and unrecognized names are account-model (EVM);
    /// reserved non-positive ids and the base58/bech32 chain names are case-sensitive.
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainRef::Id(id) if *id > 0 => ChainFamily::Evm,
            ChainRef::Id(_) => ChainFamily::CaseSensitive,
            ChainRef::Name(name) => Chain::from_name(name)
                .map(Chain::family)
                .unwrap_or(ChainFamily::Evm),
        }
    }

    pub fn tag(&self) -> String {
        match self.resolve() {
            Some(chain) => chain.tag().to_string(),
            None => self.to_string(),
        }
    }

    pub fn native_currency(&self) -> &'static str {
        self.resolve()
            .map(Chain::native_currency)
            .unwrap_or(UNKNOWN_CURRENCY)
    }

    pub fn explorer_url(&self, address: &str) -> String {
        match self.resolve() {
            Some(chain) => chain.explorer_url(address),
            None => "#".to_string(),
        }
    }
}

impl From<Chain> for ChainRef {
    fn from(chain: Chain) -> Self {
        ChainRef::Id(chain.id())
    }
}

impl From<i64> for ChainRef {
    fn from(id: i64) -> Self {
        ChainRef::Id(id)
    }
}

impl From<&str> for ChainRef {
    fn from(value: &str) -> Self {
        ChainRef::parse(value)
    }
}

impl FromStr for ChainRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ChainRef::parse(s))
    }
}

impl fmt::Display for ChainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainRef::Id(id) => write!(f, "{}", id),
            ChainRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Catalog entry exposed to callers listing supported chains.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub id: i64,
    pub tag: &'static str,
    pub name: &'static str,
    pub family: ChainFamily,
    pub currency: &'static str,
    /// Address page prefix on the chain's block explorer.
    pub explorer: &'static str,
}

pub fn supported_chains() -> Vec<ChainSummary> {
    CHAINS
        .iter()
        .map(|info| ChainSummary {
            id: info.id,
            tag: info.tag,
            name: info.name,
            family: info.family,
            currency: info.currency,
            explorer: info.explorer,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_chain_has_catalog_row() {
        for chain in Chain::all() {
            assert_eq!(chain.info().chain, chain);
            assert_eq!(Chain::from_id(chain.id()), Some(chain));
            assert_eq!(Chain::from_name(chain.tag()), Some(chain));
        }
    }

    #[test]
    fn test_parse_ids_and_aliases() {
        assert_eq!(ChainRef::parse("1"), ChainRef::Id(1));
        assert_eq!(ChainRef::parse(" -1 "), ChainRef::Id(-1));
        assert_eq!(ChainRef::parse("MATIC"), ChainRef::Name("matic".to_string()));
        assert_eq!(ChainRef::parse("matic").resolve(), Some(Chain::Polygon));
        assert_eq!(ChainRef::parse("ripple").resolve(), Some(Chain::Xrp));
    }

    #[test]
    fn test_family_resolution() {
        assert_eq!(ChainRef::Id(1).family(), ChainFamily::Evm);
        assert_eq!(ChainRef::Id(999_999).family(), ChainFamily::Evm);
        assert_eq!(ChainRef::Id(0).family(), ChainFamily::CaseSensitive);
        assert_eq!(ChainRef::Id(-7).family(), ChainFamily::CaseSensitive);
        assert_eq!(ChainRef::parse("sol").family(), ChainFamily::CaseSensitive);
        assert_eq!(ChainRef::parse("trx").family(), ChainFamily::CaseSensitive);
        assert_eq!(ChainRef::parse("arb").family(), ChainFamily::Evm);
        // Unrecognized names default to EVM handling
        assert_eq!(ChainRef::parse("mystery-net").family(), ChainFamily::Evm);
    }

    #[test]
    fn test_currency_and_explorer() {
        assert_eq!(ChainRef::Id(56).native_currency(), "BNB");
        assert_eq!(ChainRef::parse("tron").native_currency(), "TRX");
        assert_eq!(ChainRef::Id(424242).native_currency(), "UNIT");
        assert_eq!(
            ChainRef::parse("bitcoin").explorer_url("1abc"),
            "https://mempool.space/address/1abc"
        );
        assert_eq!(ChainRef::parse("nowhere").explorer_url("x"), "#");
    }

    #[test]
    fn test_supported_chains_list_explorers() {
        let chains = supported_chains();
        let eth = chains.iter().find(|c| c.id == 1).unwrap();
        assert_eq!(eth.explorer, "https://etherscan.io/address/");
        assert!(chains.iter().all(|c| c.explorer.starts_with("https://")));
    }

    #[test]
    fn test_unknown_chain_keeps_raw_tag() {
        assert_eq!(ChainRef::Id(424242).tag(), "424242");
        assert_eq!(ChainRef::parse("eth").tag(), "ethereum");
    }

    #[test]
    fn test_deserialize_mixed_chain_list() {
        #[derive(Deserialize)]
        struct Wrapper {
            chains: Vec<ChainRef>,
        }
        let parsed: Wrapper = toml::from_str(r#"chains = [1, "solana", "137"]"#).unwrap();
        assert_eq!(
            parsed.chains,
            vec![
                ChainRef::Id(1),
                ChainRef::Name("solana".to_string()),
                ChainRef::Id(137)
            ]
        );
    }
}
