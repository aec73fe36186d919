//! Block structure, deterministic hashing, merkle summarization, and
//! validation against a predecessor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{sha256_hex, ZERO_HASH};
use crate::time::to_iso_millis;
use crate::transaction::Transaction;
use crate::HexHash;

/// ASCII unit separator used between canonicalized header fields so no
/// field boundary can be confused by concatenation.
const FIELD_SEP: u8 = 0x1f;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_height: u64,
    pub previous_hash: HexHash,
    pub timestamp: DateTime<Utc>,
    pub merkle_root: HexHash,
    pub transaction_count: usize,
    pub validator_id: String,
    /// Deliberately excluded from the canonical hash input (see
    /// `compute_block_hash`) and never populated by the core; signing
    /// policy is an open question left to an external collaborator.
    pub validator_signature: HexHash,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub hash: HexHash,
}

/// Canonicalizes the header fields relevant to hashing, in the fixed order
/// `blockHeight, previousHash, timestampISO, merkleRoot, transactionCount,
/// validatorId, nonce`. `validatorSignature` is excluded so a signature may
/// be attached after the hash is computed.
fn canonical_header_bytes(header: &BlockHeader) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(header.block_height.to_string().as_bytes());
    out.push(FIELD_SEP);
    out.extend_from_slice(header.previous_hash.as_bytes());
    out.push(FIELD_SEP);
    out.extend_from_slice(to_iso_millis(&header.timestamp).as_bytes());
    out.push(FIELD_SEP);
    out.extend_from_slice(header.merkle_root.as_bytes());
    out.push(FIELD_SEP);
    out.extend_from_slice(header.transaction_count.to_string().as_bytes());
    out.push(FIELD_SEP);
    out.extend_from_slice(header.validator_id.as_bytes());
    out.push(FIELD_SEP);
    out.extend_from_slice(header.nonce.to_string().as_bytes());
    out
}

/// Computes the deterministic SHA-256 hash of a block header.
pub fn compute_block_hash(header: &BlockHeader) -> HexHash {
    sha256_hex(&canonical_header_bytes(header))
}

/// Computes the merkle root over a transaction list's leaf hashes
/// `hash(txId ++ signature)`, pairing adjacent hashes (duplicating the last
/// when odd) until one hash remains. Returns `hash("empty")` for an empty
/// list.
pub fn compute_merkle_root(transactions: &[Transaction]) -> HexHash {
    if transactions.is_empty() {
        return sha256_hex(b"empty");
    }

    let mut level: Vec<HexHash> = transactions
        .iter()
        .map(|tx| sha256_hex(format!("{}{}", tx.tx_id, tx.signature).as_bytes()))
        .collect();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(level.last().unwrap().clone());
        }
        level = level
            .chunks(2)
            .map(|pair| sha256_hex(format!("{}{}", pair[0], pair[1]).as_bytes()))
            .collect();
    }

    level.into_iter().next().unwrap()
}

/// Produces the genesis block: height 0, all-zero `previousHash`, no
/// transactions, and `merkleRoot = hash("empty")`.
pub fn create_genesis_block(validator_id: impl Into<String>, timestamp: DateTime<Utc>) -> Block {
    let header = BlockHeader {
        block_height: 0,
        previous_hash: ZERO_HASH.to_string(),
        timestamp,
        merkle_root: sha256_hex(b"empty"),
        transaction_count: 0,
        validator_id: validator_id.into(),
        validator_signature: String::new(),
        nonce: 0,
    };
    let hash = compute_block_hash(&header);
    Block {
        header,
        transactions: Vec::new(),
        hash,
    }
}

/// Validates `block` in isolation, or against `predecessor` when given.
/// Returns `false` on any of the six failing checks without mutating
/// anything.
pub fn validate_block(
    block: &Block,
    predecessor: Option<&Block>,
    max_tx_per_block: usize,
) -> bool {
    if compute_block_hash(&block.header) != block.hash {
        return false;
    }
    if let Some(prev) = predecessor {
        if block.header.previous_hash != prev.hash {
            return false;
        }
    }
    if compute_merkle_root(&block.transactions) != block.header.merkle_root {
        return false;
    }
    if block.header.transaction_count != block.transactions.len() {
        return false;
    }
    if let Some(prev) = predecessor {
        if block.header.block_height != prev.header.block_height + 1 {
            return false;
        }
    }
    if block.transactions.len() > max_tx_per_block {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{InstrumentType, TxType};
    use std::collections::BTreeMap;

    fn utc(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn tx(id: &str, sig: &str) -> Transaction {
        Transaction::new(
            id.to_string(),
            TxType::Mint,
            InstrumentType::Gbdc,
            "GBDC-1",
            "BOG_RESERVE",
            "BOG_TREASURY",
            rust_decimal::Decimal::from(100),
            utc(0),
            BTreeMap::new(),
            sig.to_string(),
        )
    }

    #[test]
    fn empty_merkle_root_is_hash_of_empty() {
        assert_eq!(compute_merkle_root(&[]), sha256_hex(b"empty"));
    }

    #[test]
    fn merkle_root_changes_with_any_txid_byte() {
        let a = vec![tx("aaaa", "sig1"), tx("bbbb", "sig2")];
        let mut b = a.clone();
        b[0].tx_id = "aaab".to_string();
        assert_ne!(compute_merkle_root(&a), compute_merkle_root(&b));
    }

    #[test]
    fn merkle_root_changes_with_any_signature_byte() {
        let a = vec![tx("aaaa", "sig1")];
        let mut b = a.clone();
        b[0].signature = "sig2".to_string();
        assert_ne!(compute_merkle_root(&a), compute_merkle_root(&b));
    }

    #[test]
    fn odd_length_duplicates_last_leaf() {
        let three = vec![tx("a", "1"), tx("b", "2"), tx("c", "3")];
        let four = vec![tx("a", "1"), tx("b", "2"), tx("c", "3"), tx("c", "3")];
        assert_eq!(compute_merkle_root(&three), compute_merkle_root(&four));
    }

    #[test]
    fn genesis_block_has_expected_shape() {
        let genesis = create_genesis_block("BOG_VALIDATOR", utc(0));
        assert_eq!(genesis.header.block_height, 0);
        assert_eq!(genesis.header.previous_hash, ZERO_HASH);
        assert_eq!(genesis.header.merkle_root, sha256_hex(b"empty"));
        assert_eq!(genesis.hash, compute_block_hash(&genesis.header));
        assert!(validate_block(&genesis, None, 1000));
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let genesis = create_genesis_block("V", utc(0));
        assert_eq!(
            compute_block_hash(&genesis.header),
            compute_block_hash(&genesis.header)
        );
    }

    #[test]
    fn validate_block_rejects_wrong_previous_hash() {
        let genesis = create_genesis_block("V", utc(0));
        let mut header = genesis.header.clone();
        header.block_height = 1;
        header.previous_hash = "deadbeef".to_string();
        header.merkle_root = sha256_hex(b"empty");
        let hash = compute_block_hash(&header);
        let bad_block = Block { header, transactions: vec![], hash };
        assert!(!validate_block(&bad_block, Some(&genesis), 1000));
    }

    #[test]
    fn validate_block_rejects_tx_count_over_max() {
        let genesis = create_genesis_block("V", utc(0));
        let txs = vec![tx("a", "1"), tx("b", "2")];
        let mut header = BlockHeader {
            block_height: 1,
            previous_hash: genesis.hash.clone(),
            timestamp: utc(1),
            merkle_root: compute_merkle_root(&txs),
            transaction_count: txs.len(),
            validator_id: "V".to_string(),
            validator_signature: String::new(),
            nonce: 0,
        };
        header.merkle_root = compute_merkle_root(&txs);
        let hash = compute_block_hash(&header);
        let block = Block { header, transactions: txs, hash };
        assert!(!validate_block(&block, Some(&genesis), 1));
    }

    #[test]
    fn validate_block_rejects_transaction_count_mismatch() {
        let genesis = create_genesis_block("V", utc(0));
        let txs = vec![tx("a", "1")];
        let header = BlockHeader {
            block_height: 1,
            previous_hash: genesis.hash.clone(),
            timestamp: utc(1),
            merkle_root: compute_merkle_root(&txs),
            transaction_count: 2, // mismatch
            validator_id: "V".to_string(),
            validator_signature: String::new(),
            nonce: 0,
        };
        let hash = compute_block_hash(&header);
        let block = Block { header, transactions: txs, hash };
        assert!(!validate_block(&block, Some(&genesis), 1000));
    }
}
