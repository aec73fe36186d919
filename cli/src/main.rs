//! Scripted demo driver for the GOVRES settlement ledger.
//!
//! Wraps [`LedgerEngine`] in `Arc<parking_lot::Mutex<_>>` and runs a
//! background `tokio` interval task that calls [`LedgerEngine::tick`] every
//! `block_interval_ms`, while the command-dispatch scenario below mutates the
//! engine synchronously from the main task. This realizes the "single
//! exclusive lock" option described for the engine's concurrency model:
//! sealing and command dispatch never run on the same data without holding
//! the same mutex.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use govres_core::account::Role;
use govres_core::audit::ExportFormat;
use govres_core::config::ConfigBuilder;
use govres_core::instrument::ConversionTarget;
use govres_core::ledger::{
    ConvertCrdnParams, IssueCrdnParams, LedgerEngine, MintGbdcParams, RedeemGbdcParams,
    TransferGbdcParams,
};

#[derive(Parser)]
#[command(name = "govres")]
#[command(about = "GOVRES settlement ledger demo", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted mint/transfer/redeem/issue/convert scenario against
    /// a fresh in-process engine and print a closing summary.
    Demo {
        /// Sealing-tick cadence in milliseconds (overrides the configured default).
        #[arg(long, default_value_t = 200)]
        seal_interval_ms: u64,
        /// Regulator export format printed at the end of the run.
        #[arg(long, value_enum, default_value_t = ExportFormatArg::Json)]
        export_format: ExportFormatArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormatArg {
    Csv,
    Json,
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("literal decimal")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo { seal_interval_ms, export_format } => {
            run_demo(seal_interval_ms, export_format).await;
        }
    }
}

async fn run_demo(seal_interval_ms: u64, export_format: ExportFormatArg) {
    let config = ConfigBuilder::new().block_interval_ms(seal_interval_ms).finish();
    let mut engine = LedgerEngine::new(config);

    engine.subscribe("block:generated", |event| {
        tracing::info!(payload = ?event.payload, "observed block:generated");
    });
    engine.subscribe("block:validation_failed", |event| {
        tracing::warn!(payload = ?event.payload, "observed block:validation_failed");
    });

    engine.initialize().expect("genesis initializes exactly once");
    engine.register_account("BANK-A", Role::CommercialBank).unwrap();
    engine.register_account("FARMER-1", Role::Farmer).unwrap();
    engine.register_account("LBC-1", Role::Lbc).unwrap();

    engine.register_gold_reserve(dec("1000000"), "attestation-gold-001").unwrap();
    engine.register_cocoa_reserve(dec("500000"), "attestation-cocoa-001").unwrap();

    let engine = Arc::new(Mutex::new(engine));

    let sealing_engine = Arc::clone(&engine);
    let sealer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(seal_interval_ms));
        loop {
            interval.tick().await;
            let outcome = sealing_engine.lock().tick();
            if let Ok(outcome) = outcome {
                tracing::debug!(?outcome, "sealing tick");
            }
        }
    });

    let gbdc_instrument_id = {
        let mut engine = engine.lock();
        engine
            .mint_gbdc(MintGbdcParams {
                amount_cedi: dec("10000"),
                gold_backing_grams: dec("500"),
                gold_price_per_gram_usd: dec("80"),
                exchange_rate_usd_ghs: dec("15"),
                issuance_id: "ISS-DEMO-1".to_string(),
                issued_by: "BOG_TREASURY".to_string(),
            })
            .expect("mint within reserve allocation")
    };

    {
        let mut engine = engine.lock();
        engine
            .transfer_gbdc(TransferGbdcParams {
                instrument_id: gbdc_instrument_id.clone(),
                from_account: "BOG_TREASURY".to_string(),
                to_account: "BANK-A".to_string(),
                amount_cedi: dec("5000"),
                description: Some("initial distribution".to_string()),
            })
            .expect("treasury holds sufficient balance");
    }

    {
        let mut engine = engine.lock();
        engine
            .redeem_gbdc(RedeemGbdcParams {
                instrument_id: gbdc_instrument_id,
                holder_account: "BANK-A".to_string(),
                amount_cedi: dec("5000"),
            })
            .expect("bank holds sufficient balance to redeem");
    }

    let crdn_instrument_id = {
        let mut engine = engine.lock();
        engine
            .issue_crdn(IssueCrdnParams {
                farmer_id: "FARMER-1".to_string(),
                lbc_id: "LBC-1".to_string(),
                cocoa_weight_kg: dec("640"),
                price_per_kg_ghs: dec("50"),
                warehouse_receipt_id: "WR-DEMO-1".to_string(),
                season_year: 2026,
                attestation_hash: "attestation-cocoa-wr-1".to_string(),
            })
            .expect("issuance clears the minimum value threshold")
    };

    {
        let mut engine = engine.lock();
        engine
            .convert_crdn(ConvertCrdnParams {
                instrument_id: crdn_instrument_id,
                farmer_id: "FARMER-1".to_string(),
                target_instrument: ConversionTarget::Gbdc,
                bank_account_id: None,
            })
            .expect("farmer holds the instrument and it is still convertible");
    }

    // give the background sealer a couple of ticks to drain the queue, then
    // flush explicitly so the demo does not race the interval task on exit.
    tokio::time::sleep(Duration::from_millis(seal_interval_ms * 3)).await;
    {
        let mut engine = engine.lock();
        let _ = engine.flush();
    }
    sealer.abort();

    let engine = engine.lock();
    let summary = engine.reserve_summary();
    println!(
        "chain height: {}  accounts: {}  pending: {}",
        summary.chain_height, summary.account_count, summary.pending_count
    );
    println!(
        "gold reserve: {}g  cocoa reserve: {}kg  reserve backing ratio: {}",
        summary.gold_reserve_grams, summary.cocoa_reserve_kg, summary.reserve_backing_ratio
    );
    println!(
        "GBDC outstanding: {}  CRDN outstanding: {}",
        summary.total_gbdc_outstanding, summary.total_crdn_outstanding
    );

    let verification = engine.audit_verify_chain();
    println!(
        "audit chain: valid={} entries={}",
        verification.valid, verification.total_entries
    );

    let format = match export_format {
        ExportFormatArg::Csv => ExportFormat::Csv,
        ExportFormatArg::Json => ExportFormat::Json,
    };
    println!("--- regulator export ---");
    println!("{}", engine.audit_export(None, None, format));
}
