//! GOVRES Core
//!
//! The settlement engine backing the Ghana-Backed Digital Cedi (GBDC) and
//! Cocoa Receipt Note (CRDN) instruments: hash-chained blocks, role-gated
//! lifecycle transitions, a tamper-evident audit trail, and an in-process
//! event bus for downstream notification.
//!
//! This crate is single-writer: [`ledger::LedgerEngine`] holds no internal
//! synchronization and expects callers to serialize access to it (a mutex,
//! an actor task, or similar). See the `cli` crate for a worked example.

pub mod account;
pub mod audit;
pub mod block;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod instrument;
pub mod ledger;
pub mod time;
pub mod transaction;
pub mod value;

/// Hex-encoded SHA-256 digest, used throughout as the canonical hash
/// representation for blocks, audit entries, and transactions.
pub type HexHash = String;

pub use error::{Error, Result};
