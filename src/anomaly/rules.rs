use std::collections::BTreeSet;

use crate::chain::{normalize, ChainRef};
use crate::config::PatternConfig;
use crate::provider::TransactionRecord;

use super::types::{PatternFinding, PatternType, Severity};

/// Heuristic laundering-pattern checks over one address's history.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    config: PatternConfig,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn detect_patterns(
        &self,
        transactions: &[TransactionRecord],
        address: &str,
    ) -> Vec<PatternFinding> {
        let mut findings = Vec::new();

        if let Some(finding) = check_high_frequency_outflow(
            transactions,
            address,
            self.config.high_frequency_outflow_threshold,
        ) {
            findings.push(finding);
        }

        if self.config.round_trip_enabled {
            if let Some(finding) = check_round_tripping(transactions, address) {
                findings.push(finding);
            }
        }

        findings
    }
}

/// Endpoints and subject address folded with the transaction's own chain rules.
fn normalized_sides(tx: &TransactionRecord, address: &str) -> (String, Option<String>, Option<String>) {
    let chain = ChainRef::parse(&tx.chain);
    let side = |raw: &Option<String>| {
        raw.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| normalize(s, &chain))
    };
    (normalize(address, &chain), side(&tx.from), side(&tx.to))
}

/// More than `threshold` transactions sent by `address`: possible peeling chain or batch payout.
pub fn check_high_frequency_outflow(
    transactions: &[TransactionRecord],
    address: &str,
    threshold: usize,
) -> Option<PatternFinding> {
    let outflows = transactions
        .iter()
        .filter(|tx| {
            let (subject, from, _) = normalized_sides(tx, address);
            from.as_deref() == Some(subject.as_str())
        })
        .count();

    if outflows <= threshold {
        return None;
    }

    Some(PatternFinding {
        pattern_type: PatternType::HighFrequencyOutflow,
        severity: Severity::Medium,
        description: format!(
            "Detected {} outflow transactions. Potential peeling chain or batch payment.",
            outflows
        ),
        implicated_entities: vec![address.trim().to_string()],
    })
}

/// Counterparties that both received funds from `address` and sent funds back to it.
pub fn check_round_tripping(
    transactions: &[TransactionRecord],
    address: &str,
) -> Option<PatternFinding> {
    let mut sent_to: BTreeSet<String> = BTreeSet::new();
    let mut received_from: BTreeSet<String> = BTreeSet::new();

    for tx in transactions {
        let (subject, from, to) = normalized_sides(tx, address);
        match (from, to) {
            (Some(from), Some(to)) if from == subject && to != subject => {
                sent_to.insert(to);
            }
            (Some(from), Some(to)) if to == subject && from != subject => {
                received_from.insert(from);
            }
            _ => {}
        }
    }

    let common: Vec<String> = sent_to.intersection(&received_from).cloned().collect();
    let first = common.first()?;
    let preview: String = first.chars().take(8).collect();

    Some(PatternFinding {
        pattern_type: PatternType::RoundTripping,
        severity: Severity::High,
        description: format!(
            "Funds moved back and forth with {} addresses (e.g., {}...)",
            common.len(),
            preview
        ),
        implicated_entities: common,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    const A: &str = "0xAAAA000000000000000000000000000000000001";
    const B: &str = "0xbbbb000000000000000000000000000000000002";
    const C: &str = "0xcccc000000000000000000000000000000000003";

    fn tx(from: &str, to: &str, chain: &str) -> TransactionRecord {
        TransactionRecord {
            hash: None,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: BigDecimal::from(1),
            timestamp: "2024-01-01 00:00:00".to_string(),
            chain: chain.to_string(),
            token_symbol: None,
            tx_type: None,
        }
    }

    fn outflows(n: usize) -> Vec<TransactionRecord> {
        (0..n).map(|_| tx(A, C, "ethereum")).collect()
    }

    #[test]
    fn test_outflow_boundary() {
        let detector = PatternDetector::new(PatternConfig::default());
        let at_threshold = detector.detect_patterns(&outflows(10), A);
        assert!(at_threshold
            .iter()
            .all(|f| f.pattern_type != PatternType::HighFrequencyOutflow));

        let over = detector.detect_patterns(&outflows(11), A);
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].pattern_type, PatternType::HighFrequencyOutflow);
        assert_eq!(over[0].severity, Severity::Medium);
        assert!(over[0].description.contains("11"));
    }

    #[test]
    fn test_outflow_matches_evm_case_insensitively() {
        let lower = A.to_lowercase();
        let finding = check_high_frequency_outflow(&outflows(11), &lower, 10);
        assert!(finding.is_some());
    }

    #[test]
    fn test_outflow_respects_case_on_bitcoin() {
        let txs: Vec<TransactionRecord> = (0..11)
            .map(|_| tx("1BoatSLRHtKNngkdXEeobR76b53LETtpyT", "1Other", "bitcoin"))
            .collect();
        assert!(check_high_frequency_outflow(&txs, "1BoatSLRHtKNngkdXEeobR76b53LETtpyT", 10).is_some());
        assert!(check_high_frequency_outflow(&txs, "1boatslrhtknngkdxeeobr76b53lettpyt", 10).is_none());
    }

    #[test]
    fn test_round_trip_names_counterpart() {
        let txs = vec![tx(A, B, "ethereum"), tx(&B.to_uppercase().replacen("0X", "0x", 1), A, "ethereum")];
        let finding = check_round_tripping(&txs, A).unwrap();
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.implicated_entities, vec![B.to_string()]);
        assert!(finding.description.contains("0xbbbb00"));
    }

    #[test]
    fn test_no_round_trip_for_disjoint_sets() {
        let txs = vec![tx(A, B, "ethereum"), tx(C, A, "ethereum")];
        assert!(check_round_tripping(&txs, A).is_none());
        assert!(PatternDetector::new(PatternConfig::default())
            .detect_patterns(&txs, A)
            .is_empty());
    }

    #[test]
    fn test_round_trip_can_be_disabled() {
        let txs = vec![tx(A, B, "ethereum"), tx(B, A, "ethereum")];
        let config = PatternConfig {
            round_trip_enabled: false,
            ..PatternConfig::default()
        };
        assert!(PatternDetector::new(config).detect_patterns(&txs, A).is_empty());
    }
}
