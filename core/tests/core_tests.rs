use std::str::FromStr;

use rust_decimal::Decimal;

use govres_core::account::Role;
use govres_core::config::ConfigBuilder;
use govres_core::error::Error;
use govres_core::instrument::ConversionTarget;
use govres_core::ledger::{
    ConvertCrdnParams, IssueCrdnParams, LedgerEngine, MintGbdcParams, RedeemGbdcParams,
    SealOutcome, TransferGbdcParams,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn engine() -> LedgerEngine {
    let mut engine = LedgerEngine::new(ConfigBuilder::new().finish());
    engine.initialize().unwrap();
    engine
}

#[test]
fn genesis_only_chain_has_height_zero_and_verifying_audit_chain() {
    let engine = engine();
    assert_eq!(engine.chain_height(), 0);
    assert!(engine.latest_block().is_some());
    assert!(engine.audit_verify_chain().valid);
}

#[test]
fn initialize_twice_is_rejected() {
    let mut engine = LedgerEngine::new(ConfigBuilder::new().finish());
    engine.initialize().unwrap();
    assert_eq!(engine.initialize(), Err(Error::AlreadyInitialized));
}

#[test]
fn mint_within_reserve_limit_succeeds_and_credits_treasury() {
    let mut engine = engine();
    engine.register_gold_reserve(dec("10000"), "ATTEST-1").unwrap();

    let instrument_id = engine
        .mint_gbdc(MintGbdcParams {
            amount_cedi: dec("5000"),
            gold_backing_grams: dec("500"),
            gold_price_per_gram_usd: dec("75"),
            exchange_rate_usd_ghs: dec("15.5"),
            issuance_id: "ISS-1".to_string(),
            issued_by: "BOG_TREASURY".to_string(),
        })
        .expect("mint within allocation succeeds");

    let record = engine.get_gbdc_record(&instrument_id).unwrap();
    assert_eq!(record.amount_cedi, dec("5000"));
    let (gbdc_balance, _) = engine.account_balance("BOG_TREASURY").unwrap();
    assert_eq!(gbdc_balance, dec("5000"));
}

#[test]
fn mint_over_reserve_allocation_is_rejected() {
    let mut engine = engine();
    engine.register_gold_reserve(dec("100"), "ATTEST-1").unwrap();

    // 10% of 100g allocation cap == 10g; requesting 50g backing must fail.
    let result = engine.mint_gbdc(MintGbdcParams {
        amount_cedi: dec("5000"),
        gold_backing_grams: dec("50"),
        gold_price_per_gram_usd: dec("75"),
        exchange_rate_usd_ghs: dec("15.5"),
        issuance_id: "ISS-2".to_string(),
        issued_by: "BOG_TREASURY".to_string(),
    });
    assert_eq!(result, Err(Error::InsufficientReserve));
}

#[test]
fn mint_requires_administrative_issuer() {
    let mut engine = engine();
    engine.register_account("BANK-1", Role::CommercialBank).unwrap();
    engine.register_gold_reserve(dec("10000"), "ATTEST-1").unwrap();

    let result = engine.mint_gbdc(MintGbdcParams {
        amount_cedi: dec("5000"),
        gold_backing_grams: dec("500"),
        gold_price_per_gram_usd: dec("75"),
        exchange_rate_usd_ghs: dec("15.5"),
        issuance_id: "ISS-3".to_string(),
        issued_by: "BANK-1".to_string(),
    });
    assert_eq!(result, Err(Error::Unauthorized("BANK-1".to_string())));
}

#[test]
fn transfer_then_redeem_moves_balances_and_terminates_instrument() {
    let mut engine = engine();
    engine.register_account("BANK-1", Role::CommercialBank).unwrap();
    engine.register_gold_reserve(dec("10000"), "ATTEST-1").unwrap();

    let instrument_id = engine
        .mint_gbdc(MintGbdcParams {
            amount_cedi: dec("2000"),
            gold_backing_grams: dec("200"),
            gold_price_per_gram_usd: dec("75"),
            exchange_rate_usd_ghs: dec("15.5"),
            issuance_id: "ISS-4".to_string(),
            issued_by: "BOG_TREASURY".to_string(),
        })
        .unwrap();

    engine
        .transfer_gbdc(TransferGbdcParams {
            instrument_id: instrument_id.clone(),
            from_account: "BOG_TREASURY".to_string(),
            to_account: "BANK-1".to_string(),
            amount_cedi: dec("2000"),
            description: Some("initial distribution".to_string()),
        })
        .unwrap();

    let (bank_balance, _) = engine.account_balance("BANK-1").unwrap();
    assert_eq!(bank_balance, dec("2000"));

    engine
        .redeem_gbdc(RedeemGbdcParams {
            instrument_id: instrument_id.clone(),
            holder_account: "BANK-1".to_string(),
            amount_cedi: dec("2000"),
        })
        .unwrap();

    let (bank_balance_after, _) = engine.account_balance("BANK-1").unwrap();
    assert_eq!(bank_balance_after, dec("0"));

    // a second redemption on the now-terminal instrument must fail
    let result = engine.redeem_gbdc(RedeemGbdcParams {
        instrument_id,
        holder_account: "BANK-1".to_string(),
        amount_cedi: dec("0"),
    });
    assert!(matches!(result, Err(Error::InvalidState(_))));
}

#[test]
fn crdn_issue_and_convert_to_gbdc_credits_farmer() {
    let mut engine = engine();
    engine.register_account("FARMER-1", Role::Farmer).unwrap();
    engine.register_account("LBC-1", Role::Lbc).unwrap();

    let instrument_id = engine
        .issue_crdn(IssueCrdnParams {
            farmer_id: "FARMER-1".to_string(),
            lbc_id: "LBC-1".to_string(),
            cocoa_weight_kg: dec("100"),
            price_per_kg_ghs: dec("20"),
            warehouse_receipt_id: "WR-1".to_string(),
            season_year: 2026,
            attestation_hash: "hash-1".to_string(),
        })
        .unwrap();

    let (_, crdn_balance) = engine.account_balance("FARMER-1").unwrap();
    assert_eq!(crdn_balance, dec("2000"));

    engine
        .convert_crdn(ConvertCrdnParams {
            instrument_id: instrument_id.clone(),
            farmer_id: "FARMER-1".to_string(),
            target_instrument: ConversionTarget::Gbdc,
            bank_account_id: None,
        })
        .unwrap();

    let (gbdc_balance, crdn_balance_after) = engine.account_balance("FARMER-1").unwrap();
    assert_eq!(gbdc_balance, dec("2000"));
    assert_eq!(crdn_balance_after, dec("0"));

    let record = engine.get_crdn_record(&instrument_id).unwrap();
    assert!(record.status.is_terminal());
}

#[test]
fn convert_crdn_rejects_non_holder() {
    let mut engine = engine();
    engine.register_account("FARMER-1", Role::Farmer).unwrap();
    engine.register_account("FARMER-2", Role::Farmer).unwrap();
    engine.register_account("LBC-1", Role::Lbc).unwrap();

    let instrument_id = engine
        .issue_crdn(IssueCrdnParams {
            farmer_id: "FARMER-1".to_string(),
            lbc_id: "LBC-1".to_string(),
            cocoa_weight_kg: dec("50"),
            price_per_kg_ghs: dec("20"),
            warehouse_receipt_id: "WR-2".to_string(),
            season_year: 2026,
            attestation_hash: "hash-2".to_string(),
        })
        .unwrap();

    let result = engine.convert_crdn(ConvertCrdnParams {
        instrument_id,
        farmer_id: "FARMER-2".to_string(),
        target_instrument: ConversionTarget::Cash,
        bank_account_id: None,
    });
    assert_eq!(result, Err(Error::NotHolder("FARMER-2".to_string())));
}

#[test]
fn convert_crdn_twice_is_rejected_on_the_second_attempt() {
    let mut engine = engine();
    engine.register_account("FARMER-1", Role::Farmer).unwrap();
    engine.register_account("LBC-1", Role::Lbc).unwrap();

    let instrument_id = engine
        .issue_crdn(IssueCrdnParams {
            farmer_id: "FARMER-1".to_string(),
            lbc_id: "LBC-1".to_string(),
            cocoa_weight_kg: dec("100"),
            price_per_kg_ghs: dec("20"),
            warehouse_receipt_id: "WR-3".to_string(),
            season_year: 2026,
            attestation_hash: "hash-3".to_string(),
        })
        .unwrap();

    engine
        .convert_crdn(ConvertCrdnParams {
            instrument_id: instrument_id.clone(),
            farmer_id: "FARMER-1".to_string(),
            target_instrument: ConversionTarget::Gbdc,
            bank_account_id: None,
        })
        .expect("first conversion from ISSUED succeeds");

    // the instrument is now CONVERTED (terminal); a second conversion attempt
    // must fail regardless of holder correctness.
    let result = engine.convert_crdn(ConvertCrdnParams {
        instrument_id,
        farmer_id: "FARMER-1".to_string(),
        target_instrument: ConversionTarget::Gbdc,
        bank_account_id: None,
    });
    assert!(matches!(result, Err(Error::InvalidState(_))));
}

#[test]
fn flush_with_no_pending_transactions_is_a_no_op() {
    let mut engine = engine();
    assert_eq!(engine.flush(), Ok(SealOutcome::NoPendingTransactions));
    assert_eq!(engine.chain_height(), 0);
}

#[test]
fn sealing_over_capacity_splits_across_two_blocks() {
    let mut engine = LedgerEngine::new(ConfigBuilder::new().max_tx_per_block(1000).finish());
    engine.initialize().unwrap();
    engine.register_gold_reserve(dec("1000000"), "ATTEST-BULK").unwrap();

    for i in 0..1500 {
        engine
            .mint_gbdc(MintGbdcParams {
                amount_cedi: dec("1000"),
                gold_backing_grams: dec("1"),
                gold_price_per_gram_usd: dec("75"),
                exchange_rate_usd_ghs: dec("15.5"),
                issuance_id: format!("ISS-BULK-{i}"),
                issued_by: "BOG_TREASURY".to_string(),
            })
            .unwrap();
    }
    assert_eq!(engine.pending_count(), 1500);

    let first = engine.flush().unwrap();
    assert!(matches!(first, SealOutcome::Sealed { tx_count: 1000, height: 1, .. }));
    assert_eq!(engine.pending_count(), 500);

    let second = engine.flush().unwrap();
    assert!(matches!(second, SealOutcome::Sealed { tx_count: 500, height: 2, .. }));
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.chain_height(), 2);
}

#[test]
fn audit_trail_verifies_after_a_sequence_of_operations() {
    let mut engine = engine();
    engine.register_account("BANK-1", Role::CommercialBank).unwrap();
    engine.register_gold_reserve(dec("10000"), "ATTEST-1").unwrap();
    engine
        .mint_gbdc(MintGbdcParams {
            amount_cedi: dec("1000"),
            gold_backing_grams: dec("100"),
            gold_price_per_gram_usd: dec("75"),
            exchange_rate_usd_ghs: dec("15.5"),
            issuance_id: "ISS-5".to_string(),
            issued_by: "BOG_TREASURY".to_string(),
        })
        .unwrap();
    engine.flush().unwrap();

    let verification = engine.audit_verify_chain();
    assert!(verification.valid);
    assert!(verification.total_entries >= 3);
}
