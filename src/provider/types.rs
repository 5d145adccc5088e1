use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format explorers are normalized to by the providers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One transaction as returned by a chain data provider. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: BigDecimal,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
}

impl TransactionRecord {
    pub fn value_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or(0.0)
    }

    /// Parse the timestamp as `YYYY-MM-DD HH:MM:SS` (UTC), RFC 3339, or unix seconds.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
    }
    None
}

/// Transactions plus a per-type breakdown (`normal`, `internal`, `token`, ...).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderResponse {
    pub transactions: Vec<TransactionRecord>,
    pub counts: BTreeMap<String, u64>,
}

impl ProviderResponse {
    pub fn from_transactions(transactions: Vec<TransactionRecord>) -> Self {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for tx in &transactions {
            let kind = tx.tx_type.as_deref().unwrap_or("normal").to_string();
            *counts.entry(kind).or_default() += 1;
        }
        Self {
            transactions,
            counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
