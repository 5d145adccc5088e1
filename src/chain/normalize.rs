use super::registry::{ChainFamily, ChainRef};

/// Canonical form of an address on the given chain.
///
/// EVM-family addresses fold to lowercase; base58/bech32 families are returned
/// untouched because case is part of their encoding. Total and idempotent.
pub fn normalize(address: &str, chain: &ChainRef) -> String {
    normalize_for_family(address, chain.family())
}

pub fn normalize_for_family(address: &str, family: ChainFamily) -> String {
    match family {
        ChainFamily::Evm => address.to_ascii_lowercase(),
        ChainFamily::CaseSensitive => address.to_string(),
    }
}
