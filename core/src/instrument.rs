//! GBDC and CRDN instrument records.
//!
//! Per-account balances (see [`crate::account::Account`]) are the
//! authoritative ledger state; these records track provenance and
//! lifecycle status and must stay consistent with balances — every
//! mutation in [`crate::ledger`] updates both in the same critical section.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GBDC lifecycle status. MINTED -> CIRCULATING -> REDEEMED; BURNED is a
/// terminal status reachable only via administrative operations outside
/// this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GbdcStatus {
    Minted,
    Circulating,
    Redeemed,
    Burned,
}

impl GbdcStatus {
    /// Terminal statuses exclude an instrument from outstanding-supply
    /// totals and from the I2 reserve-backing sum.
    pub fn is_terminal(self) -> bool {
        matches!(self, GbdcStatus::Redeemed | GbdcStatus::Burned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdcInstrument {
    pub instrument_id: String,
    pub amount_cedi: Decimal,
    pub gold_backing_grams: Decimal,
    pub holder: String,
    pub status: GbdcStatus,
    pub minted_at: DateTime<Utc>,
    pub issuance_id: String,
}

/// CRDN lifecycle status. ISSUED -> (HELD) -> CONVERTED; EXPIRED and
/// CANCELLED are terminal statuses reachable only via administrative
/// operations outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrdnStatus {
    Issued,
    Held,
    Converted,
    Expired,
    Cancelled,
}

impl CrdnStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CrdnStatus::Converted | CrdnStatus::Expired | CrdnStatus::Cancelled
        )
    }

    /// Statuses from which conversion is permitted.
    pub fn is_convertible(self) -> bool {
        matches!(self, CrdnStatus::Issued | CrdnStatus::Held)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrdnInstrument {
    pub instrument_id: String,
    pub amount_cedi: Decimal,
    pub cocoa_weight_kg: Decimal,
    pub farmer_id: String,
    pub lbc_id: String,
    pub holder: String,
    pub status: CrdnStatus,
    pub issued_at: DateTime<Utc>,
}

/// Target asset for a CRDN conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionTarget {
    Gbdc,
    Cash,
}
