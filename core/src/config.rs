//! Runtime configuration for the **GOVRES** ledger engine.
//!
//! The [`Config`] struct centralises the tunable constants named in the
//! engine's contract (reserve allocation percentage, issuance minimums,
//! sealing cadence, block size). It is constructed via the [`ConfigBuilder`]
//! fluent builder, enabling callers — chiefly tests — to override only the
//! fields they care about while keeping the documented production defaults.
//!
//! ```
//! use govres_core::config::Config;
//!
//! let cfg = Config::default();
//! assert_eq!(cfg.max_tx_per_block, 1000);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Runtime configuration shared across the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Maximum fraction of `goldReserveGrams` that may back outstanding
    /// GBDC at any time, expressed as a whole-number percentage (10 == 10%).
    pub gold_reserve_allocation_percent: Decimal,

    /// Minimum `amountCedi` accepted by `mint_gbdc`.
    pub min_gbdc_issuance_cedi: Decimal,

    /// Minimum computed `amountCedi` accepted by `issue_crdn`.
    pub min_crdn_value_cedi: Decimal,

    /// Target interval between automatic sealing ticks, in milliseconds.
    pub block_interval_ms: u64,

    /// Maximum number of transactions a single sealed block may carry.
    pub max_tx_per_block: usize,

    /// Identifies the hash algorithm used throughout the engine; recorded
    /// for provenance in exports, not consulted by any code path (the
    /// engine always uses SHA-256).
    pub hash_algorithm: String,

    /// Identifier of the single authoritative validator signing sealed
    /// blocks (the central-bank node).
    pub validator_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gold_reserve_allocation_percent: Decimal::from(10),
            min_gbdc_issuance_cedi: Decimal::from(1000),
            min_crdn_value_cedi: Decimal::from(10),
            block_interval_ms: 5_000,
            max_tx_per_block: 1_000,
            hash_algorithm: "SHA-256".to_string(),
            validator_id: "BOG_VALIDATOR".to_string(),
        }
    }
}

/// Fluent builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    /// Starts a new builder pre-populated with [`Config::default`].
    pub fn new() -> Self {
        Self { inner: Config::default() }
    }

    pub fn gold_reserve_allocation_percent(mut self, pct: Decimal) -> Self {
        self.inner.gold_reserve_allocation_percent = pct;
        self
    }

    pub fn min_gbdc_issuance_cedi(mut self, amount: Decimal) -> Self {
        self.inner.min_gbdc_issuance_cedi = amount;
        self
    }

    pub fn min_crdn_value_cedi(mut self, amount: Decimal) -> Self {
        self.inner.min_crdn_value_cedi = amount;
        self
    }

    pub fn block_interval_ms(mut self, ms: u64) -> Self {
        self.inner.block_interval_ms = ms;
        self
    }

    pub fn max_tx_per_block(mut self, count: usize) -> Self {
        self.inner.max_tx_per_block = count;
        self
    }

    pub fn validator_id<S: Into<String>>(mut self, id: S) -> Self {
        self.inner.validator_id = id.into();
        self
    }

    /// Consumes the builder returning an immutable configuration value.
    pub fn finish(self) -> Config {
        self.inner
    }
}
