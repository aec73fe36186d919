//! Account registry entities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Roles recognized by the engine's role-gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// The central-bank administrative role; may mint GBDC and register
    /// reserves.
    Administrative,
    /// A licensed commercial bank; may redeem GBDC.
    CommercialBank,
    /// A cocoa farmer; may hold and convert CRDN.
    Farmer,
    /// A Licensed Buying Company (cocoa aggregator).
    Lbc,
}

/// A registered participant in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub role: Role,
    pub gbdc_balance: Decimal,
    pub crdn_balance: Decimal,
    pub is_active: bool,
}

impl Account {
    pub fn new(account_id: impl Into<String>, role: Role) -> Self {
        Self {
            account_id: account_id.into(),
            role,
            gbdc_balance: Decimal::ZERO,
            crdn_balance: Decimal::ZERO,
            is_active: true,
        }
    }
}

/// Names of the administrative accounts pre-created at genesis.
pub const BOG_TREASURY: &str = "BOG_TREASURY";
pub const BOG_RESERVE: &str = "BOG_RESERVE";
