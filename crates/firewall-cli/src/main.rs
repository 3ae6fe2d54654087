mod gate;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use alloy::hex;
use alloy::primitives::{Address, Bytes, U256};
use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use firewall_data::etherscan::{EtherscanVerifier, UnconfiguredVerifier};
use firewall_data::rpc::{CallSimulator, RpcClient};
use firewall_data::{RiskAssessment, SourceVerifier, Transaction};
use firewall_engine::decoder::{CallParams, DecodeOutcome};
use firewall_engine::format::{format_units, parse_units, DEFAULT_DECIMALS};
use firewall_engine::{decode, ConfirmationGate, FirewallConfig, RiskEngine};
use gate::{assessment_table, TerminalGate};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const GWEI_DECIMALS: u8 = 9;
/// Fetched gas prices are bumped by this percentage so the transaction lands.
const GAS_PRICE_BUMP_PERCENT: u64 = 20;
const DEFAULT_CHAIN_ID: u64 = 1;

#[derive(Debug, Clone)]
struct AppContext {
    rpc_url: Option<String>,
    etherscan_api_key: Option<String>,
    chain_id: u64,
}

#[derive(Parser, Debug)]
#[command(name = "tx-firewall")]
#[command(about = "Pre-signing risk analysis for outgoing Ethereum transactions")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the risk of a proposed transaction.
    Analyze(AnalyzeArgs),
    /// Decode calldata offline.
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Recipient address.
    #[arg(long)]
    to: Address,

    /// Value in ETH.
    #[arg(long, default_value = "0")]
    value: String,

    /// Calldata as hex (`0x` prefix optional).
    #[arg(long)]
    data: Option<String>,

    /// Gas price in gwei; fetched from the node when omitted.
    #[arg(long)]
    gas_price: Option<String>,

    #[arg(long)]
    gas_limit: Option<u64>,

    /// Nonce; the sender's pending count when omitted.
    #[arg(long)]
    nonce: Option<u64>,

    /// Sender address, used for simulation and nonce lookup.
    #[arg(long)]
    from: Option<Address>,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,

    /// Ask for authorization after the analysis (replaces --output).
    #[arg(long)]
    confirm: bool,

    /// Flag transfers above this many ETH.
    #[arg(long)]
    large_value_eth: Option<String>,

    #[arg(long, default_value_t = 5_000)]
    oracle_timeout_ms: u64,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Calldata as hex (`0x` prefix optional).
    #[arg(long)]
    data: String,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let ctx = AppContext {
        rpc_url: std::env::var("FW_RPC_URL").ok(),
        etherscan_api_key: std::env::var("ETHERSCAN_API_KEY").ok(),
        chain_id: match std::env::var("FW_CHAIN_ID") {
            Ok(raw) => raw
                .parse()
                .wrap_err_with(|| format!("FW_CHAIN_ID must be an integer, got '{raw}'"))?,
            Err(_) => DEFAULT_CHAIN_ID,
        },
    };

    match cli.command {
        Commands::Analyze(args) => handle_analyze(&ctx, args).await,
        Commands::Decode(args) => handle_decode(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

async fn handle_analyze(ctx: &AppContext, args: AnalyzeArgs) -> Result<()> {
    if !args.confirm && !matches!(args.output.to_lowercase().as_str(), "table" | "json") {
        return Err(eyre!(
            "unknown output format '{}'; use 'table' or 'json'",
            args.output
        ));
    }

    let rpc_url = ctx
        .rpc_url
        .as_deref()
        .ok_or_else(|| eyre!("FW_RPC_URL is required for analyze command"))?;
    let rpc = RpcClient::new(rpc_url)?;

    let tx = build_transaction(&rpc, &args).await?;

    let verifier: Arc<dyn SourceVerifier> = match &ctx.etherscan_api_key {
        Some(key) => Arc::new(EtherscanVerifier::new(key.clone(), ctx.chain_id)),
        None => {
            tracing::warn!("ETHERSCAN_API_KEY not set; contract verification will be unknown");
            Arc::new(UnconfiguredVerifier)
        }
    };

    let large_value_wei = args
        .large_value_eth
        .as_deref()
        .map(|eth| parse_amount(eth, DEFAULT_DECIMALS, "--large-value-eth"))
        .transpose()?;
    let config = FirewallConfig::default()
        .with_oracle_timeout(Duration::from_millis(args.oracle_timeout_ms))
        .with_large_value_wei(large_value_wei);

    let engine = RiskEngine::new(Arc::new(rpc.clone()), verifier)
        .with_simulator(Arc::new(CallSimulator::new(rpc)))
        .with_config(config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message(format!("analyzing transaction to {}", tx.to));
    pb.enable_steady_tick(Duration::from_millis(100));

    let assessment = engine.analyze(&tx).await;
    pb.finish_and_clear();

    if args.confirm {
        let stdin = io::stdin();
        let mut gate = TerminalGate::new(stdin.lock(), io::stdout());
        if !gate.confirm(&assessment, &tx)? {
            return Err(eyre!("transaction was not authorized"));
        }
        info!(to = %tx.to, level = assessment.level().label(), "transaction authorized");
        println!("Authorized.");
        return Ok(());
    }

    match args.output.to_lowercase().as_str() {
        "json" => print_assessment_json(&assessment, &tx)?,
        _ => println!("\n{}\n", assessment_table(&assessment, &tx)),
    }

    info!(
        to = %tx.to,
        level = assessment.level().label(),
        score = assessment.score(),
        "analyze command completed"
    );

    Ok(())
}

async fn build_transaction(rpc: &RpcClient, args: &AnalyzeArgs) -> Result<Transaction> {
    let value = parse_amount(&args.value, DEFAULT_DECIMALS, "--value")?;
    let data = match args.data.as_deref() {
        Some(raw) => parse_calldata(raw)?,
        None => Bytes::new(),
    };

    let mut tx = if data.is_empty() {
        Transaction::transfer(args.to, value)
    } else {
        Transaction {
            value,
            ..Transaction::call(args.to, data)
        }
    };

    if let Some(gas_limit) = args.gas_limit {
        tx.gas_limit = gas_limit;
    }

    tx.gas_price = match args.gas_price.as_deref() {
        Some(gwei) => parse_amount(gwei, GWEI_DECIMALS, "--gas-price")?,
        None => {
            let network = rpc.gas_price().await.wrap_err("failed to fetch gas price")?;
            network * U256::from(100 + GAS_PRICE_BUMP_PERCENT) / U256::from(100u64)
        }
    };

    tx.nonce = match (args.nonce, args.from) {
        (Some(nonce), _) => nonce,
        (None, Some(from)) => rpc
            .pending_nonce(from)
            .await
            .wrap_err("failed to fetch pending nonce")?,
        (None, None) => 0,
    };

    if let Some(from) = args.from {
        tx = tx.with_from(from);
    }

    tracing::debug!(?tx, "transaction built");
    Ok(tx)
}

fn parse_amount(raw: &str, decimals: u8, flag: &str) -> Result<U256> {
    parse_units(raw, decimals)
        .ok_or_else(|| eyre!("invalid amount for {flag}: '{raw}' (at most {decimals} decimals)"))
}

fn parse_calldata(raw: &str) -> Result<Bytes> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits)
        .map(Bytes::from)
        .wrap_err_with(|| format!("invalid calldata hex: {raw}"))
}

fn print_assessment_json(assessment: &RiskAssessment, tx: &Transaction) -> Result<()> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        assessment: &'a RiskAssessment,
        transaction: JsonTransaction,
    }

    #[derive(Serialize)]
    struct JsonTransaction {
        from: Option<String>,
        to: String,
        value_wei: String,
        data: String,
        gas_price_wei: String,
        gas_limit: u64,
        nonce: u64,
    }

    let report = JsonReport {
        assessment,
        transaction: JsonTransaction {
            from: tx.from.map(|from| from.to_checksum(None)),
            to: tx.to.to_checksum(None),
            value_wei: tx.value.to_string(),
            data: tx.data.to_string(),
            gas_price_wei: tx.gas_price.to_string(),
            gas_limit: tx.gas_limit,
            nonce: tx.nonce,
        },
    };

    let json = serde_json::to_string_pretty(&report).wrap_err("failed to serialize JSON")?;
    println!("{json}");
    Ok(())
}

fn handle_decode(args: DecodeArgs) -> Result<()> {
    let data = parse_calldata(&args.data)?;
    let decoded = decode(&data);

    let mut rows: Vec<(&str, String)> = vec![
        ("Function", decoded.function().label().to_string()),
        (
            "Selector",
            decoded.selector_hex().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    match &decoded.outcome {
        DecodeOutcome::Decoded(CallParams::Transfer { to, amount }) => {
            rows.push(("To", to.to_checksum(None)));
            rows.push(("Amount", describe_amount(*amount)));
        }
        DecodeOutcome::Decoded(CallParams::Approve { spender, amount }) => {
            rows.push(("Spender", spender.to_checksum(None)));
            rows.push(("Amount", describe_amount(*amount)));
        }
        DecodeOutcome::Decoded(CallParams::SetApprovalForAll { operator, approved }) => {
            rows.push(("Operator", operator.to_checksum(None)));
            rows.push(("Approved", approved.to_string()));
        }
        DecodeOutcome::DecodedNoPayload(_) => {
            rows.push(("Parameters", "not decoded".to_string()));
        }
        DecodeOutcome::Empty | DecodeOutcome::Unrecognized => {}
    }

    match args.output.to_lowercase().as_str() {
        "table" => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Field", "Value"]);
            for (label, value) in rows {
                table.add_row(vec![label.to_string(), value]);
            }
            println!("\n{table}\n");
        }
        "json" => {
            let object: serde_json::Map<String, serde_json::Value> = rows
                .into_iter()
                .map(|(label, value)| (label.to_lowercase(), serde_json::Value::String(value)))
                .collect();
            let json =
                serde_json::to_string_pretty(&object).wrap_err("failed to serialize JSON")?;
            println!("{json}");
        }
        _ => {
            return Err(eyre!(
                "unknown output format '{}'; use 'table' or 'json'",
                args.output
            ))
        }
    }

    Ok(())
}

/// Raw amount plus its 18-decimal reading; `U256::MAX` reads as unlimited.
fn describe_amount(amount: U256) -> String {
    if amount == U256::MAX {
        return format!("{amount} (unlimited)");
    }
    format!("{amount} (~{} at 18 decimals)", format_units(amount, DEFAULT_DECIMALS))
}
