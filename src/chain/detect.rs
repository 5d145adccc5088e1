use super::registry::{Chain, ChainRef};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

fn is_base58(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Legacy (`1…`) / P2SH (`3…`) base58 of length 26–35, or a `bc1` bech32 address.
pub fn looks_like_bitcoin(address: &str) -> bool {
    let len = address.len();
    if (address.starts_with('1') || address.starts_with('3')) && (26..=35).contains(&len) {
        return is_base58(address);
    }
    let lower = address.to_ascii_lowercase();
    if let Some(data) = lower.strip_prefix("bc1") {
        // Mixed case is invalid bech32
        let single_case = address == lower || address == address.to_ascii_uppercase();
        return single_case
            && (14..=74).contains(&len)
            && data.chars().all(|c| BECH32_CHARSET.contains(c));
    }
    false
}

/// base58 of length 32–44 without an EVM `0x` prefix.
pub fn looks_like_solana(address: &str) -> bool {
    !address.starts_with("0x") && (32..=44).contains(&address.len()) && is_base58(address)
}

/// Chains worth scanning for an address, judged by its syntax alone.
///
/// Bitcoin-looking input scans Bitcoin only, Solana-looking input scans
/// Solana only, anything else scans the configured EVM defaults.
pub fn candidate_chains(address: &str, defaults: &[ChainRef]) -> Vec<ChainRef> {
    let address = address.trim();
    if looks_like_bitcoin(address) {
        vec![ChainRef::from(Chain::Bitcoin)]
    } else if looks_like_solana(address) {
        vec![ChainRef::from(Chain::Solana)]
    } else {
        defaults.to_vec()
    }
}

/// Chain-agnostic canonical key, used where no chain context exists (label tables).
pub fn canonical_key(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        trimmed.to_ascii_lowercase()
    } else {
        trimmed.to_string()
    }
}
