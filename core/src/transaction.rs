//! Transaction records sealed into blocks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value::Details;
use crate::HexHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Mint,
    Transfer,
    Redeem,
    Convert,
    Settle,
    Burn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    Gbdc,
    Crdn,
}

/// A single settlement transaction. Immutable once constructed; sealing
/// into a block never modifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: HexHash,
    pub tx_type: TxType,
    pub instrument_type: InstrumentType,
    pub instrument_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub data: Details,
    pub signature: HexHash,
}

#[allow(clippy::too_many_arguments)]
impl Transaction {
    pub fn new(
        tx_id: HexHash,
        tx_type: TxType,
        instrument_type: InstrumentType,
        instrument_id: impl Into<String>,
        from_account: impl Into<String>,
        to_account: impl Into<String>,
        amount: Decimal,
        timestamp: DateTime<Utc>,
        data: Details,
        signature: HexHash,
    ) -> Self {
        Self {
            tx_id,
            tx_type,
            instrument_type,
            instrument_id: instrument_id.into(),
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
            timestamp,
            data,
            signature,
        }
    }
}
