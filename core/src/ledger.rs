//! The ledger engine: the central state machine holding accounts,
//! instrument registries, reserve counters, the pending transaction queue,
//! and the hash chain.
//!
//! [`LedgerEngine`] is **not** thread-safe by itself — mirroring the
//! single-writer contract the rest of this crate documents — callers must
//! wrap it in a mutex (or run it behind a single-task actor) if concurrent
//! access is required. See the `cli` demo binary for a worked example using
//! `parking_lot::Mutex` plus a `tokio` interval task for sealing.

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;

use crate::account::{Account, Role, BOG_RESERVE, BOG_TREASURY};
use crate::audit::{AuditFilter, AuditLog, ChainVerification, ExportFormat, LogParams};
use crate::block::{compute_merkle_root, create_genesis_block, validate_block, Block, BlockHeader};
use crate::config::Config;
use crate::crypto::{new_instrument_id, new_tx_id, sign_tx};
use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::instrument::{
    ConversionTarget, CrdnInstrument, CrdnStatus, GbdcInstrument, GbdcStatus,
};
use crate::time::{now_millis, now_utc};
use crate::transaction::{InstrumentType, Transaction, TxType};
use crate::value::{Details, Value};
use crate::HexHash;

/// Rounds a cedi-denominated amount to 4 fractional digits.
fn round_cedi(amount: Decimal) -> Decimal {
    amount.round_dp(4)
}

/// Rounds a gram-denominated amount to 6 fractional digits.
fn round_grams(amount: Decimal) -> Decimal {
    amount.round_dp(6)
}

/// Rounds a kilogram-denominated amount to 4 fractional digits.
fn round_kg(amount: Decimal) -> Decimal {
    amount.round_dp(4)
}

/// Parameters for [`LedgerEngine::mint_gbdc`].
#[derive(Debug, Clone)]
pub struct MintGbdcParams {
    pub amount_cedi: Decimal,
    pub gold_backing_grams: Decimal,
    pub gold_price_per_gram_usd: Decimal,
    pub exchange_rate_usd_ghs: Decimal,
    pub issuance_id: String,
    pub issued_by: String,
}

/// Parameters for [`LedgerEngine::transfer_gbdc`].
#[derive(Debug, Clone)]
pub struct TransferGbdcParams {
    pub instrument_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount_cedi: Decimal,
    pub description: Option<String>,
}

/// Parameters for [`LedgerEngine::redeem_gbdc`].
#[derive(Debug, Clone)]
pub struct RedeemGbdcParams {
    pub instrument_id: String,
    pub holder_account: String,
    pub amount_cedi: Decimal,
}

/// Parameters for [`LedgerEngine::issue_crdn`].
#[derive(Debug, Clone)]
pub struct IssueCrdnParams {
    pub farmer_id: String,
    pub lbc_id: String,
    pub cocoa_weight_kg: Decimal,
    pub price_per_kg_ghs: Decimal,
    pub warehouse_receipt_id: String,
    pub season_year: u32,
    pub attestation_hash: String,
}

/// Parameters for [`LedgerEngine::convert_crdn`].
#[derive(Debug, Clone)]
pub struct ConvertCrdnParams {
    pub instrument_id: String,
    pub farmer_id: String,
    pub target_instrument: ConversionTarget,
    pub bank_account_id: Option<String>,
}

/// Result of a sealing attempt ([`LedgerEngine::flush`] / [`LedgerEngine::tick`]).
#[derive(Debug, Clone, PartialEq)]
pub enum SealOutcome {
    /// The pending queue was empty; nothing was sealed.
    NoPendingTransactions,
    /// A new block was appended to the chain.
    Sealed { height: u64, hash: HexHash, tx_count: usize },
}

/// Reserve and supply snapshot returned by [`LedgerEngine::reserve_summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveSummary {
    pub gold_reserve_grams: Decimal,
    pub cocoa_reserve_kg: Decimal,
    pub total_gbdc_outstanding: Decimal,
    pub total_crdn_outstanding: Decimal,
    pub chain_height: u64,
    pub pending_count: usize,
    pub account_count: usize,
    pub reserve_backing_ratio: Decimal,
}

/// The central settlement-ledger state machine.
pub struct LedgerEngine {
    config: Config,
    accounts: HashMap<String, Account>,
    gbdc: HashMap<String, GbdcInstrument>,
    crdn: HashMap<String, CrdnInstrument>,
    gold_reserve_grams: Decimal,
    cocoa_reserve_kg: Decimal,
    pending: VecDeque<Transaction>,
    chain: Vec<Block>,
    audit: AuditLog,
    events: EventBus,
    initialized: bool,
}

impl LedgerEngine {
    /// Constructs an un-initialized engine. Call [`initialize`](Self::initialize)
    /// before any other mutating operation.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            accounts: HashMap::new(),
            gbdc: HashMap::new(),
            crdn: HashMap::new(),
            gold_reserve_grams: Decimal::ZERO,
            cocoa_reserve_kg: Decimal::ZERO,
            pending: VecDeque::new(),
            chain: Vec::new(),
            audit: AuditLog::new(),
            events: EventBus::new(),
            initialized: false,
        }
    }

    /// Registers an event subscriber. See [`EventBus::subscribe`] for the
    /// reentrance prohibition subscribers must honor.
    pub fn subscribe<F>(&mut self, event_name: impl Into<String>, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.subscribe(event_name, handler);
    }

    fn publish(&self, name: &str, payload: Details) {
        self.events.publish(Event { name: name.to_string(), payload });
    }

    fn record_audit(
        &mut self,
        action: &str,
        actor_id: &str,
        actor_role: &str,
        resource_type: &str,
        resource_id: &str,
        details: Details,
    ) {
        self.audit.log(LogParams {
            action: action.to_string(),
            actor_id: actor_id.to_string(),
            actor_role: actor_role.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            timestamp: now_utc(),
        });
    }

    fn require_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    // ---------------------------------------------------------------
    // Genesis / account registration
    // ---------------------------------------------------------------

    /// Creates the genesis block and pre-registers the two administrative
    /// accounts. Must be called exactly once.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        let genesis = create_genesis_block(self.config.validator_id.clone(), now_utc());
        let genesis_hash = genesis.hash.clone();
        let genesis_height = genesis.header.block_height;
        self.chain.push(genesis);
        self.initialized = true;

        self.accounts.insert(
            BOG_TREASURY.to_string(),
            Account::new(BOG_TREASURY, Role::Administrative),
        );
        self.accounts.insert(
            BOG_RESERVE.to_string(),
            Account::new(BOG_RESERVE, Role::Administrative),
        );

        tracing::info!(height = genesis_height, hash = %genesis_hash, "ledger:initialized");
        self.record_audit(
            "ledger:initialized",
            "SYSTEM",
            "SYSTEM",
            "BLOCK",
            &genesis_hash,
            Details::new(),
        );

        let mut payload = Details::new();
        payload.insert("blockHeight".into(), Value::Int(genesis_height as i64));
        payload.insert("hash".into(), Value::Text(genesis_hash));
        self.publish("ledger:initialized", payload);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers a new participant account.
    pub fn register_account(&mut self, account_id: impl Into<String>, role: Role) -> Result<()> {
        self.require_initialized()?;
        let account_id = account_id.into();
        if self.accounts.contains_key(&account_id) {
            return Err(Error::DuplicateAccount(account_id));
        }
        self.accounts.insert(account_id.clone(), Account::new(account_id.clone(), role));

        tracing::info!(account_id = %account_id, ?role, "account:registered");
        self.record_audit(
            "account:registered",
            &account_id,
            role_name(role),
            "ACCOUNT",
            &account_id,
            Details::new(),
        );

        let mut payload = Details::new();
        payload.insert("accountId".into(), Value::Text(account_id));
        payload.insert("role".into(), Value::Text(role_name(role).to_string()));
        self.publish("account:registered", payload);
        Ok(())
    }

    pub fn get_account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    pub fn list_accounts(&self) -> Vec<&Account> {
        self.accounts.values().collect()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn account_active(&self, account_id: &str) -> Result<&Account> {
        self.accounts
            .get(account_id)
            .filter(|a| a.is_active)
            .ok_or_else(|| Error::UnknownAccount(account_id.to_string()))
    }

    // ---------------------------------------------------------------
    // Reserves
    // ---------------------------------------------------------------

    pub fn register_gold_reserve(&mut self, grams: Decimal, attestation_hash: impl Into<String>) -> Result<()> {
        self.require_initialized()?;
        let grams = round_grams(grams);
        self.gold_reserve_grams += grams;
        let attestation_hash = attestation_hash.into();

        tracing::info!(added = %grams, total = %self.gold_reserve_grams, "reserve:gold:updated");
        let mut details = Details::new();
        details.insert("addedGrams".into(), Value::Decimal(grams));
        details.insert("attestationHash".into(), Value::Text(attestation_hash.clone()));
        self.record_audit(
            "reserve:gold:updated",
            "BOG_RESERVE",
            role_name(Role::Administrative),
            "RESERVE",
            "GOLD",
            details,
        );

        let mut payload = Details::new();
        payload.insert("totalGrams".into(), Value::Decimal(self.gold_reserve_grams));
        payload.insert("addedGrams".into(), Value::Decimal(grams));
        payload.insert("attestationHash".into(), Value::Text(attestation_hash));
        self.publish("reserve:gold:updated", payload);
        Ok(())
    }

    pub fn register_cocoa_reserve(&mut self, kg: Decimal, attestation_hash: impl Into<String>) -> Result<()> {
        self.require_initialized()?;
        let kg = round_kg(kg);
        self.cocoa_reserve_kg += kg;
        let attestation_hash = attestation_hash.into();

        tracing::info!(added = %kg, total = %self.cocoa_reserve_kg, "reserve:cocoa:updated");
        let mut details = Details::new();
        details.insert("addedKg".into(), Value::Decimal(kg));
        details.insert("attestationHash".into(), Value::Text(attestation_hash.clone()));
        self.record_audit(
            "reserve:cocoa:updated",
            "BOG_RESERVE",
            role_name(Role::Administrative),
            "RESERVE",
            "COCOA",
            details,
        );

        let mut payload = Details::new();
        payload.insert("totalKg".into(), Value::Decimal(self.cocoa_reserve_kg));
        payload.insert("addedKg".into(), Value::Decimal(kg));
        payload.insert("attestationHash".into(), Value::Text(attestation_hash));
        self.publish("reserve:cocoa:updated", payload);
        Ok(())
    }

    fn current_gbdc_backing_grams(&self) -> Decimal {
        self.gbdc
            .values()
            .filter(|g| !g.status.is_terminal())
            .map(|g| g.gold_backing_grams)
            .sum()
    }

    // ---------------------------------------------------------------
    // GBDC lifecycle
    // ---------------------------------------------------------------

    pub fn mint_gbdc(&mut self, params: MintGbdcParams) -> Result<String> {
        self.require_initialized()?;

        let issuer = self
            .accounts
            .get(&params.issued_by)
            .ok_or_else(|| Error::UnknownAccount(params.issued_by.clone()))?;
        if issuer.role != Role::Administrative {
            tracing::warn!(issuer = %params.issued_by, "gbdc:mint unauthorized");
            return Err(Error::Unauthorized(params.issued_by.clone()));
        }

        let amount_cedi = round_cedi(params.amount_cedi);
        if amount_cedi < self.config.min_gbdc_issuance_cedi {
            tracing::warn!(amount = %amount_cedi, "gbdc:mint amount below minimum");
            return Err(Error::AmountBelowMinimum);
        }

        let gold_backing_grams = round_grams(params.gold_backing_grams);
        let allocation_limit =
            self.gold_reserve_grams * self.config.gold_reserve_allocation_percent / Decimal::from(100);
        if self.current_gbdc_backing_grams() + gold_backing_grams > allocation_limit {
            tracing::warn!("gbdc:mint insufficient reserve");
            return Err(Error::InsufficientReserve);
        }

        let instrument_id = new_instrument_id("GBDC", now_millis());
        let now = now_utc();
        self.gbdc.insert(
            instrument_id.clone(),
            GbdcInstrument {
                instrument_id: instrument_id.clone(),
                amount_cedi,
                gold_backing_grams,
                holder: BOG_TREASURY.to_string(),
                status: GbdcStatus::Minted,
                minted_at: now,
                issuance_id: params.issuance_id.clone(),
            },
        );

        self.accounts.get_mut(BOG_TREASURY).expect("treasury exists").gbdc_balance += amount_cedi;

        let tx_id = new_tx_id();
        let signature = sign_tx(&tx_id, &self.config.validator_id, now_millis());
        let mut data = Details::new();
        data.insert("issuanceId".into(), Value::Text(params.issuance_id.clone()));
        data.insert(
            "goldPricePerGramUSD".into(),
            Value::Decimal(params.gold_price_per_gram_usd),
        );
        data.insert(
            "exchangeRateUSDGHS".into(),
            Value::Decimal(params.exchange_rate_usd_ghs),
        );
        self.pending.push_back(Transaction::new(
            tx_id.clone(),
            TxType::Mint,
            InstrumentType::Gbdc,
            instrument_id.clone(),
            BOG_RESERVE,
            BOG_TREASURY,
            amount_cedi,
            now,
            data.clone(),
            signature,
        ));

        tracing::info!(instrument_id = %instrument_id, amount = %amount_cedi, "gbdc:minted");
        self.record_audit(
            "gbdc:minted",
            &params.issued_by,
            role_name(Role::Administrative),
            "GBDC_INSTRUMENT",
            &instrument_id,
            data,
        );

        let mut payload = Details::new();
        payload.insert("instrumentId".into(), Value::Text(instrument_id.clone()));
        payload.insert("amountCedi".into(), Value::Decimal(amount_cedi));
        payload.insert("goldBackingGrams".into(), Value::Decimal(gold_backing_grams));
        self.publish("gbdc:minted", payload);
        self.publish("transaction:created", tx_created_payload(&tx_id, TxType::Mint));

        Ok(instrument_id)
    }

    pub fn transfer_gbdc(&mut self, params: TransferGbdcParams) -> Result<String> {
        self.require_initialized()?;

        self.account_active(&params.from_account)?;
        self.account_active(&params.to_account)?;

        let amount_cedi = round_cedi(params.amount_cedi);
        {
            let from = self.accounts.get(&params.from_account).expect("checked above");
            if from.gbdc_balance < amount_cedi {
                return Err(Error::InsufficientBalance(params.from_account.clone()));
            }
        }

        {
            let instrument = self
                .gbdc
                .get(&params.instrument_id)
                .ok_or_else(|| Error::InvalidState(format!("unknown GBDC instrument: {}", params.instrument_id)))?;
            if instrument.status.is_terminal() {
                return Err(Error::InvalidState(format!(
                    "GBDC instrument {} is in terminal status",
                    params.instrument_id
                )));
            }
        }

        self.accounts.get_mut(&params.from_account).unwrap().gbdc_balance -= amount_cedi;
        self.accounts.get_mut(&params.to_account).unwrap().gbdc_balance += amount_cedi;

        let instrument = self.gbdc.get_mut(&params.instrument_id).unwrap();
        instrument.holder = params.to_account.clone();
        instrument.status = GbdcStatus::Circulating;

        let tx_id = new_tx_id();
        let now = now_utc();
        let signature = sign_tx(&tx_id, &self.config.validator_id, now_millis());
        let mut data = Details::new();
        if let Some(description) = &params.description {
            data.insert("description".into(), Value::Text(description.clone()));
        }
        self.pending.push_back(Transaction::new(
            tx_id.clone(),
            TxType::Transfer,
            InstrumentType::Gbdc,
            params.instrument_id.clone(),
            params.from_account.clone(),
            params.to_account.clone(),
            amount_cedi,
            now,
            data.clone(),
            signature,
        ));

        tracing::info!(
            instrument_id = %params.instrument_id,
            from = %params.from_account,
            to = %params.to_account,
            amount = %amount_cedi,
            "gbdc:transferred"
        );
        self.record_audit(
            "gbdc:transferred",
            &params.from_account,
            "ACCOUNT",
            "GBDC_INSTRUMENT",
            &params.instrument_id,
            data,
        );

        let mut payload = Details::new();
        payload.insert("instrumentId".into(), Value::Text(params.instrument_id));
        payload.insert("fromAccount".into(), Value::Text(params.from_account));
        payload.insert("toAccount".into(), Value::Text(params.to_account));
        payload.insert("amountCedi".into(), Value::Decimal(amount_cedi));
        self.publish("gbdc:transferred", payload);
        self.publish("transaction:created", tx_created_payload(&tx_id, TxType::Transfer));

        Ok(tx_id)
    }

    pub fn redeem_gbdc(&mut self, params: RedeemGbdcParams) -> Result<String> {
        self.require_initialized()?;

        let holder = self
            .accounts
            .get(&params.holder_account)
            .ok_or_else(|| Error::UnknownAccount(params.holder_account.clone()))?;
        if holder.role != Role::CommercialBank {
            return Err(Error::Unauthorized(params.holder_account.clone()));
        }

        let amount_cedi = round_cedi(params.amount_cedi);
        if holder.gbdc_balance < amount_cedi {
            return Err(Error::InsufficientBalance(params.holder_account.clone()));
        }

        {
            let instrument = self
                .gbdc
                .get(&params.instrument_id)
                .ok_or_else(|| Error::InvalidState(format!("unknown GBDC instrument: {}", params.instrument_id)))?;
            if instrument.status.is_terminal() {
                return Err(Error::InvalidState(format!(
                    "GBDC instrument {} is already terminal",
                    params.instrument_id
                )));
            }
        }

        self.accounts.get_mut(&params.holder_account).unwrap().gbdc_balance -= amount_cedi;
        let instrument = self.gbdc.get_mut(&params.instrument_id).unwrap();
        instrument.status = GbdcStatus::Redeemed;
        instrument.holder = BOG_TREASURY.to_string();

        let tx_id = new_tx_id();
        let now = now_utc();
        let signature = sign_tx(&tx_id, &self.config.validator_id, now_millis());
        self.pending.push_back(Transaction::new(
            tx_id.clone(),
            TxType::Redeem,
            InstrumentType::Gbdc,
            params.instrument_id.clone(),
            params.holder_account.clone(),
            BOG_TREASURY,
            amount_cedi,
            now,
            Details::new(),
            signature,
        ));

        tracing::info!(
            instrument_id = %params.instrument_id,
            holder = %params.holder_account,
            amount = %amount_cedi,
            "gbdc:redeemed"
        );
        self.record_audit(
            "gbdc:redeemed",
            &params.holder_account,
            role_name(Role::CommercialBank),
            "GBDC_INSTRUMENT",
            &params.instrument_id,
            Details::new(),
        );

        let mut payload = Details::new();
        payload.insert("instrumentId".into(), Value::Text(params.instrument_id));
        payload.insert("holderAccount".into(), Value::Text(params.holder_account));
        payload.insert("amountCedi".into(), Value::Decimal(amount_cedi));
        self.publish("gbdc:redeemed", payload);
        self.publish("transaction:created", tx_created_payload(&tx_id, TxType::Redeem));

        Ok(tx_id)
    }

    // ---------------------------------------------------------------
    // CRDN lifecycle
    // ---------------------------------------------------------------

    pub fn issue_crdn(&mut self, params: IssueCrdnParams) -> Result<String> {
        self.require_initialized()?;

        let farmer = self
            .accounts
            .get(&params.farmer_id)
            .ok_or_else(|| Error::UnknownAccount(params.farmer_id.clone()))?;
        if farmer.role != Role::Farmer {
            return Err(Error::Unauthorized(params.farmer_id.clone()));
        }
        let lbc = self
            .accounts
            .get(&params.lbc_id)
            .ok_or_else(|| Error::UnknownAccount(params.lbc_id.clone()))?;
        if lbc.role != Role::Lbc {
            return Err(Error::Unauthorized(params.lbc_id.clone()));
        }

        let cocoa_weight_kg = round_kg(params.cocoa_weight_kg);
        let amount_cedi = round_cedi(cocoa_weight_kg * params.price_per_kg_ghs);
        if amount_cedi < self.config.min_crdn_value_cedi {
            return Err(Error::AmountBelowMinimum);
        }

        let instrument_id = new_instrument_id("CRDN", now_millis());
        let now = now_utc();
        self.crdn.insert(
            instrument_id.clone(),
            CrdnInstrument {
                instrument_id: instrument_id.clone(),
                amount_cedi,
                cocoa_weight_kg,
                farmer_id: params.farmer_id.clone(),
                lbc_id: params.lbc_id.clone(),
                holder: params.farmer_id.clone(),
                status: CrdnStatus::Issued,
                issued_at: now,
            },
        );

        self.accounts.get_mut(&params.farmer_id).unwrap().crdn_balance += amount_cedi;

        let tx_id = new_tx_id();
        let signature = sign_tx(&tx_id, &self.config.validator_id, now_millis());
        let mut data = Details::new();
        data.insert("lbcId".into(), Value::Text(params.lbc_id.clone()));
        data.insert("warehouseReceiptId".into(), Value::Text(params.warehouse_receipt_id.clone()));
        data.insert("seasonYear".into(), Value::Int(params.season_year as i64));
        data.insert("attestationHash".into(), Value::Text(params.attestation_hash.clone()));
        self.pending.push_back(Transaction::new(
            tx_id.clone(),
            TxType::Mint,
            InstrumentType::Crdn,
            instrument_id.clone(),
            BOG_RESERVE,
            params.farmer_id.clone(),
            amount_cedi,
            now,
            data.clone(),
            signature,
        ));

        tracing::info!(instrument_id = %instrument_id, amount = %amount_cedi, "crdn:issued");
        self.record_audit(
            "crdn:issued",
            &params.lbc_id,
            role_name(Role::Lbc),
            "CRDN_INSTRUMENT",
            &instrument_id,
            data,
        );

        let mut payload = Details::new();
        payload.insert("instrumentId".into(), Value::Text(instrument_id.clone()));
        payload.insert("farmerId".into(), Value::Text(params.farmer_id));
        payload.insert("amountCedi".into(), Value::Decimal(amount_cedi));
        self.publish("crdn:issued", payload);
        self.publish("transaction:created", tx_created_payload(&tx_id, TxType::Mint));

        Ok(instrument_id)
    }

    pub fn convert_crdn(&mut self, params: ConvertCrdnParams) -> Result<String> {
        self.require_initialized()?;

        let crdn = self
            .crdn
            .get(&params.instrument_id)
            .ok_or_else(|| Error::InvalidState(format!("unknown CRDN instrument: {}", params.instrument_id)))?;

        if crdn.holder != params.farmer_id {
            return Err(Error::NotHolder(params.farmer_id.clone()));
        }
        if !crdn.status.is_convertible() {
            return Err(Error::InvalidState(format!(
                "CRDN instrument {} is not convertible from status {:?}",
                params.instrument_id, crdn.status
            )));
        }

        let amount_cedi = crdn.amount_cedi;

        self.accounts.get_mut(&params.farmer_id).unwrap().crdn_balance -= amount_cedi;
        self.crdn.get_mut(&params.instrument_id).unwrap().status = CrdnStatus::Converted;

        if params.target_instrument == ConversionTarget::Gbdc {
            self.accounts.get_mut(&params.farmer_id).unwrap().gbdc_balance += amount_cedi;
        }

        let tx_id = new_tx_id();
        let now = now_utc();
        let signature = sign_tx(&tx_id, &self.config.validator_id, now_millis());
        let mut data = Details::new();
        data.insert(
            "targetInstrument".into(),
            Value::Text(match params.target_instrument {
                ConversionTarget::Gbdc => "GBDC".to_string(),
                ConversionTarget::Cash => "CASH".to_string(),
            }),
        );
        if let Some(bank_account_id) = &params.bank_account_id {
            data.insert("bankAccountId".into(), Value::Text(bank_account_id.clone()));
        }
        self.pending.push_back(Transaction::new(
            tx_id.clone(),
            TxType::Convert,
            InstrumentType::Crdn,
            params.instrument_id.clone(),
            params.farmer_id.clone(),
            params.bank_account_id.clone().unwrap_or_else(|| params.farmer_id.clone()),
            amount_cedi,
            now,
            data.clone(),
            signature,
        ));

        tracing::info!(instrument_id = %params.instrument_id, farmer = %params.farmer_id, "crdn:converted");
        self.record_audit(
            "crdn:converted",
            &params.farmer_id,
            role_name(Role::Farmer),
            "CRDN_INSTRUMENT",
            &params.instrument_id,
            data,
        );

        let mut payload = Details::new();
        payload.insert("instrumentId".into(), Value::Text(params.instrument_id));
        payload.insert("farmerId".into(), Value::Text(params.farmer_id));
        payload.insert("amountCedi".into(), Value::Decimal(amount_cedi));
        self.publish("crdn:converted", payload);
        self.publish("transaction:created", tx_created_payload(&tx_id, TxType::Convert));

        Ok(tx_id)
    }

    // ---------------------------------------------------------------
    // Block sealing
    // ---------------------------------------------------------------

    fn tip(&self) -> &Block {
        self.chain.last().expect("chain has at least a genesis block once initialized")
    }

    /// Drains up to `max_tx_per_block` pending transactions and attempts to
    /// seal them into a new block. No-op if the pending queue is empty.
    fn seal_once(&mut self) -> Result<SealOutcome> {
        self.require_initialized()?;

        if self.pending.is_empty() {
            return Ok(SealOutcome::NoPendingTransactions);
        }

        let max = self.config.max_tx_per_block;
        let drain_count = self.pending.len().min(max);
        let drained: Vec<Transaction> = self.pending.drain(..drain_count).collect();

        let tip = self.tip();
        let header = BlockHeader {
            block_height: tip.header.block_height + 1,
            previous_hash: tip.hash.clone(),
            timestamp: now_utc(),
            merkle_root: compute_merkle_root(&drained),
            transaction_count: drained.len(),
            validator_id: self.config.validator_id.clone(),
            validator_signature: String::new(),
            nonce: 0,
        };
        let hash = crate::block::compute_block_hash(&header);
        let height = header.block_height;
        let block = Block { header, transactions: drained, hash: hash.clone() };

        let predecessor = self.chain.last().cloned();
        if validate_block(&block, predecessor.as_ref(), max) {
            let tx_count = block.transactions.len();
            self.chain.push(block);

            tracing::info!(height, hash = %hash, tx_count, "block:generated");
            self.record_audit(
                "block:generated",
                "SYSTEM",
                "SYSTEM",
                "BLOCK",
                &hash,
                Details::new(),
            );

            let mut payload = Details::new();
            payload.insert("blockHeight".into(), Value::Int(height as i64));
            payload.insert("hash".into(), Value::Text(hash.clone()));
            payload.insert("txCount".into(), Value::Int(tx_count as i64));
            self.publish("block:generated", payload);

            Ok(SealOutcome::Sealed { height, hash, tx_count })
        } else {
            // re-queue in original order at the head
            for tx in block.transactions.into_iter().rev() {
                self.pending.push_front(tx);
            }

            tracing::warn!(height, "block:validation_failed");
            let mut payload = Details::new();
            payload.insert("blockHeight".into(), Value::Int(height as i64));
            self.publish("block:validation_failed", payload);

            Err(Error::BlockValidationFailed(height))
        }
    }

    /// Explicit flush: seals whatever is currently pending.
    pub fn flush(&mut self) -> Result<SealOutcome> {
        self.seal_once()
    }

    /// Periodic sealing tick, intended to be driven by an external timer
    /// every `config.block_interval_ms`. Identical semantics to [`flush`](Self::flush).
    pub fn tick(&mut self) -> Result<SealOutcome> {
        self.seal_once()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ---------------------------------------------------------------
    // Query surface
    // ---------------------------------------------------------------

    pub fn chain_height(&self) -> u64 {
        self.chain.last().map(|b| b.header.block_height).unwrap_or(0)
    }

    pub fn get_block(&self, height: u64) -> Option<&Block> {
        self.chain.iter().find(|b| b.header.block_height == height)
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    pub fn account_balance(&self, account_id: &str) -> Result<(Decimal, Decimal)> {
        let account = self
            .accounts
            .get(account_id)
            .ok_or_else(|| Error::UnknownAccount(account_id.to_string()))?;
        Ok((account.gbdc_balance, account.crdn_balance))
    }

    pub fn get_gbdc_record(&self, instrument_id: &str) -> Option<&GbdcInstrument> {
        self.gbdc.get(instrument_id)
    }

    pub fn get_crdn_record(&self, instrument_id: &str) -> Option<&CrdnInstrument> {
        self.crdn.get(instrument_id)
    }

    pub fn total_gbdc_outstanding(&self) -> Decimal {
        self.gbdc
            .values()
            .filter(|g| matches!(g.status, GbdcStatus::Minted | GbdcStatus::Circulating))
            .map(|g| g.amount_cedi)
            .sum()
    }

    pub fn total_crdn_outstanding(&self) -> Decimal {
        self.crdn
            .values()
            .filter(|c| matches!(c.status, CrdnStatus::Issued | CrdnStatus::Held))
            .map(|c| c.amount_cedi)
            .sum()
    }

    pub fn reserve_summary(&self) -> ReserveSummary {
        let total_gbdc = self.total_gbdc_outstanding();
        let total_crdn = self.total_crdn_outstanding();
        let denominator = total_gbdc + total_crdn;
        let reserve_backing_ratio = if denominator.is_zero() {
            Decimal::ZERO
        } else {
            (self.gold_reserve_grams + self.cocoa_reserve_kg) / denominator
        };

        ReserveSummary {
            gold_reserve_grams: self.gold_reserve_grams,
            cocoa_reserve_kg: self.cocoa_reserve_kg,
            total_gbdc_outstanding: total_gbdc,
            total_crdn_outstanding: total_crdn,
            chain_height: self.chain_height(),
            pending_count: self.pending.len(),
            account_count: self.accounts.len(),
            reserve_backing_ratio,
        }
    }

    // ---------------------------------------------------------------
    // Audit surface
    // ---------------------------------------------------------------

    pub fn audit_query(&self, filter: &AuditFilter) -> Vec<&crate::audit::AuditEntry> {
        self.audit.query(filter)
    }

    pub fn audit_verify_chain(&self) -> ChainVerification {
        self.audit.verify_chain()
    }

    pub fn audit_export(
        &self,
        start: Option<chrono::DateTime<chrono::Utc>>,
        end: Option<chrono::DateTime<chrono::Utc>>,
        format: ExportFormat,
    ) -> String {
        self.audit.export_for_regulator(start, end, format, now_utc())
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Administrative => "ADMINISTRATIVE",
        Role::CommercialBank => "COMMERCIAL_BANK",
        Role::Farmer => "FARMER",
        Role::Lbc => "LBC",
    }
}

fn tx_created_payload(tx_id: &str, tx_type: TxType) -> Details {
    let mut payload = Details::new();
    payload.insert("txId".into(), Value::Text(tx_id.to_string()));
    payload.insert("txType".into(), Value::Text(format!("{tx_type:?}").to_uppercase()));
    payload
}
