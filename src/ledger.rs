//! Audit Ledger
//!
//! Append-only, hash-linked blocks batching authentication transactions.
//! The tail block stays open until it holds `seal_threshold` transactions,
//! then a sealing token is brute-forced and a fresh open block is appended
//! pointing at the sealed block's content hash. Tamper evidence only - this
//! is not a consensus protocol.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::error::LedgerError;

/// previous_hash sentinel of the genesis block
const GENESIS_PREVIOUS_HASH: &str = "0";
const GENESIS_SEALING_TOKEN: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Login,
    DeviceRegistration,
    FileAccess,
}

/// A single audit entry inside a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub user: String,
    pub ip: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// A block in the chain.
///
/// The hash is never stored on the block itself; it is recomputed from the
/// canonical serialization of these fields whenever it is needed, so any
/// mutation of a sealed block breaks every later previous_hash link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Monotonically increasing, starting at 1
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub sealing_token: u64,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Hex SHA-256 over the block's canonical serialization.
    pub fn hash(&self) -> String {
        // Struct fields serialize in declaration order, so the encoding is
        // stable across runs.
        let encoded = serde_json::to_vec(self).expect("block serialization is infallible");
        hex::encode(Sha256::digest(&encoded))
    }
}

/// Block plus its computed hash, for export to callers.
#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    #[serde(flatten)]
    pub block: Block,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerExport {
    pub chain_length: u64,
    pub blocks: Vec<BlockView>,
    pub is_valid: bool,
}

/// Ledger sealing parameters, split out of [`EngineConfig`].
///
/// The default difficulty (4 leading hex zeros) and batch size (3) are demo
/// constants, not tuned security parameters, hence configurable.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub seal_threshold: usize,
    pub difficulty_prefix: String,
    pub max_seal_iterations: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            seal_threshold: 3,
            difficulty_prefix: "0000".to_string(),
            max_seal_iterations: 10_000_000,
        }
    }
}

impl From<&EngineConfig> for LedgerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            seal_threshold: config.seal_threshold,
            difficulty_prefix: config.seal_difficulty_prefix.clone(),
            max_seal_iterations: config.seal_max_iterations,
        }
    }
}

/// Process-wide, hash-linked audit ledger.
///
/// Constructed once at startup holding its genesis block. Appends serialize
/// on an internal mutex; sealing happens inline under that lock, so callers
/// block for the duration of a sealing event. That is the accepted
/// backpressure point, not a defect.
#[derive(Debug, Clone)]
pub struct AuditLedger {
    chain: Arc<Mutex<Vec<Block>>>,
    config: LedgerConfig,
}

impl AuditLedger {
    pub fn new(config: LedgerConfig) -> Self {
        let genesis = Block {
            index: 1,
            timestamp: Utc::now(),
            sealing_token: GENESIS_SEALING_TOKEN,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            transactions: Vec::new(),
        };
        Self {
            chain: Arc::new(Mutex::new(vec![genesis])),
            config,
        }
    }

    /// Append a transaction to the open tail block, sealing it if it reaches
    /// the threshold. Returns true when a seal happened.
    ///
    /// The read-tail / push / maybe-seal sequence is one critical section;
    /// concurrent appends would otherwise corrupt indices and ordering.
    pub fn append(&self, transaction: Transaction) -> Result<bool, LedgerError> {
        let mut chain = self.chain.lock();

        let tail = chain.last_mut().expect("chain always holds at least genesis");
        tail.transactions.push(transaction);

        if tail.transactions.len() < self.config.seal_threshold {
            return Ok(false);
        }

        let token = find_sealing_token(
            tail.sealing_token,
            &self.config.difficulty_prefix,
            self.config.max_seal_iterations,
        )?;
        let previous_hash = tail.hash();
        let index = tail.index + 1;

        tracing::debug!(index, "sealed audit block, opening successor");

        chain.push(Block {
            index,
            timestamp: Utc::now(),
            sealing_token: token,
            previous_hash,
            transactions: Vec::new(),
        });

        Ok(true)
    }

    /// Recompute every previous_hash link. Broken linkage is reported, never
    /// repaired.
    pub fn verify(&self) -> bool {
        let chain = self.chain.lock();
        Self::verify_blocks(&chain)
    }

    fn verify_blocks(blocks: &[Block]) -> bool {
        let Some(genesis) = blocks.first() else {
            return false;
        };
        if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
            return false;
        }
        for pair in blocks.windows(2) {
            if pair[1].previous_hash != pair[0].hash() {
                tracing::error!(index = pair[1].index, "audit ledger hash link broken");
                return false;
            }
            if pair[1].index != pair[0].index + 1 {
                return false;
            }
        }
        true
    }

    pub fn len(&self) -> u64 {
        self.chain.lock().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        // A constructed ledger always holds genesis
        false
    }

    /// Export the last `limit` blocks with their hashes attached.
    pub fn export(&self, limit: usize) -> LedgerExport {
        let chain = self.chain.lock();
        let is_valid = Self::verify_blocks(&chain);
        let start = chain.len().saturating_sub(limit);
        let blocks = chain[start..]
            .iter()
            .map(|block| BlockView { hash: block.hash(), block: block.clone() })
            .collect();

        LedgerExport {
            chain_length: chain.len() as u64,
            blocks,
            is_valid,
        }
    }

    #[cfg(test)]
    pub(crate) fn tamper_with_block<F: FnOnce(&mut Block)>(&self, index: usize, mutate: F) {
        let mut chain = self.chain.lock();
        mutate(&mut chain[index]);
    }

    #[cfg(test)]
    pub(crate) fn block_at(&self, index: usize) -> Block {
        self.chain.lock()[index].clone()
    }
}

/// Brute-force a sealing token: the first candidate whose derived hash starts
/// with the difficulty prefix. Deliberately expensive (cost-to-tamper), but
/// bounded so a misconfigured prefix cannot spin forever.
fn find_sealing_token(
    previous_token: u64,
    difficulty_prefix: &str,
    max_iterations: u64,
) -> Result<u64, LedgerError> {
    let previous = previous_token as i128;
    let mut candidate: u64 = 1;

    while candidate <= max_iterations {
        let value = (candidate as i128) * (candidate as i128) - previous * previous;
        let digest = Sha256::digest(value.to_string().as_bytes());
        if hex::encode(digest).starts_with(difficulty_prefix) {
            return Ok(candidate);
        }
        candidate += 1;
    }

    Err(LedgerError::SealSearchExhausted(max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(user: &str) -> Transaction {
        Transaction {
            kind: TransactionKind::Login,
            user: user.to_string(),
            ip: "10.0.0.1".to_string(),
            detail: "login succeeded".to_string(),
            timestamp: Utc::now(),
        }
    }

    // Cheap difficulty so tests stay fast
    fn fast_config() -> LedgerConfig {
        LedgerConfig {
            seal_threshold: 3,
            difficulty_prefix: "0".to_string(),
            max_seal_iterations: 1_000_000,
        }
    }

    #[test]
    fn genesis_chain_verifies() {
        let ledger = AuditLedger::new(fast_config());
        assert_eq!(ledger.len(), 1);
        assert!(ledger.verify());
    }

    #[test]
    fn appends_below_threshold_do_not_seal() {
        let ledger = AuditLedger::new(fast_config());
        assert!(!ledger.append(tx("alice")).unwrap());
        assert!(!ledger.append(tx("bob")).unwrap());
        assert_eq!(ledger.len(), 1);
        assert!(ledger.verify());
    }

    #[test]
    fn threshold_append_seals_exactly_one_block() {
        let ledger = AuditLedger::new(fast_config());
        assert!(!ledger.append(tx("alice")).unwrap());
        assert!(!ledger.append(tx("bob")).unwrap());
        assert!(ledger.append(tx("carol")).unwrap());

        assert_eq!(ledger.len(), 2);

        let sealed = ledger.block_at(0);
        let open = ledger.block_at(1);
        assert_eq!(sealed.index, 1);
        assert_eq!(open.index, 2);
        assert_eq!(sealed.transactions.len(), 3);
        assert!(open.transactions.is_empty());
        // Link recomputed independently must match
        assert_eq!(open.previous_hash, sealed.hash());
        assert!(ledger.verify());
    }

    #[test]
    fn chain_stays_valid_over_many_appends() {
        let ledger = AuditLedger::new(fast_config());
        for i in 0..10 {
            ledger.append(tx(&format!("user-{i}"))).unwrap();
        }
        assert_eq!(ledger.len(), 4); // 9 sealed transactions -> 3 seals
        assert!(ledger.verify());
    }

    #[test]
    fn sealing_token_satisfies_difficulty() {
        let ledger = AuditLedger::new(fast_config());
        for _ in 0..3 {
            ledger.append(tx("alice")).unwrap();
        }
        let open = ledger.block_at(1);
        let value = (open.sealing_token as i128).pow(2) - (GENESIS_SEALING_TOKEN as i128).pow(2);
        let digest = hex::encode(Sha256::digest(value.to_string().as_bytes()));
        assert!(digest.starts_with("0"));
    }

    #[test]
    fn tampering_with_a_sealed_block_breaks_verification() {
        let ledger = AuditLedger::new(fast_config());
        for i in 0..7 {
            ledger.append(tx(&format!("user-{i}"))).unwrap();
        }
        assert!(ledger.verify());

        ledger.tamper_with_block(0, |block| {
            block.transactions[0].user = "mallory".to_string();
        });
        assert!(!ledger.verify());
    }

    #[test]
    fn tampering_with_any_field_is_detected() {
        let ledger = AuditLedger::new(fast_config());
        for i in 0..4 {
            ledger.append(tx(&format!("user-{i}"))).unwrap();
        }
        ledger.tamper_with_block(0, |block| {
            block.sealing_token += 1;
        });
        assert!(!ledger.verify());
    }

    #[test]
    fn rehashing_a_block_is_stable() {
        let ledger = AuditLedger::new(fast_config());
        ledger.append(tx("alice")).unwrap();
        let block = ledger.block_at(0);
        assert_eq!(block.hash(), block.hash());
    }

    #[test]
    fn export_returns_tail_with_hashes() {
        let ledger = AuditLedger::new(fast_config());
        for i in 0..10 {
            ledger.append(tx(&format!("user-{i}"))).unwrap();
        }
        let export = ledger.export(2);
        assert_eq!(export.chain_length, 4);
        assert_eq!(export.blocks.len(), 2);
        assert!(export.is_valid);
        assert_eq!(export.blocks[0].hash, export.blocks[0].block.hash());
        assert_eq!(export.blocks[1].block.previous_hash, export.blocks[0].hash);
    }

    #[test]
    fn impossible_difficulty_errors_instead_of_spinning() {
        let result = find_sealing_token(1, "ffffffffffffffff", 1_000);
        assert!(matches!(result, Err(LedgerError::SealSearchExhausted(1_000))));
    }
}
