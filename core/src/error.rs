//! Error types for the **GOVRES** core crate.
//!
//! All public operations return [`crate::Result`], a convenient alias for
//! `core::result::Result<T, Error>`. Every variant corresponds to exactly one
//! failure row in the engine's precondition tables; preconditions are always
//! checked before any mutation, so a returned `Error` never leaves partial
//! state behind.

use thiserror::Error;

/// Core crate error type. One variant per documented failure kind.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// `registerAccount` called with an `accountId` that already exists.
    #[error("account already exists: {0}")]
    DuplicateAccount(String),

    /// An operation referenced an `accountId` that has not been registered.
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// Role mismatch for a privileged operation (mint, redeem, issue, ...).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Minting would push total gold backing past the allocation bound.
    #[error("insufficient gold reserve to back requested amount")]
    InsufficientReserve,

    /// A transfer/redeem would debit more than the holder's balance.
    #[error("insufficient balance for account: {0}")]
    InsufficientBalance(String),

    /// Amount is below the instrument's configured minimum issuance value.
    #[error("amount below minimum threshold")]
    AmountBelowMinimum,

    /// Conversion attempted by an account that does not hold the instrument.
    #[error("account {0} does not hold this instrument")]
    NotHolder(String),

    /// Operation is not permitted from the instrument's current status.
    #[error("invalid instrument state: {0}")]
    InvalidState(String),

    /// A sealed block failed `validate_block` against the chain tip.
    #[error("block validation failed at height {0}")]
    BlockValidationFailed(u64),

    /// `initialize()` was called more than once on the same engine.
    #[error("ledger already initialized")]
    AlreadyInitialized,

    /// Mutation attempted before `initialize()` was called.
    #[error("ledger not yet initialized")]
    NotInitialized,
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
