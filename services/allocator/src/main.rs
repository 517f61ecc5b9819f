//! Allocator command line
//!
//! Runs one allocation from flags or a JSON request file and prints the report.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use discrete_allocator::{AllocationRequest, Allocator, AllocatorConfig, AssetId};
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "discrete-allocator";

#[derive(Parser, Debug)]
#[command(name = "allocate")]
#[command(about = "Allocate a cash budget into whole shares tracking target weights")]
#[command(version)]
struct Cli {
    /// JSON request file with budget, target_weights and prices
    #[arg(long, conflicts_with_all = ["budget", "weight", "price"])]
    input: Option<PathBuf>,

    /// Cash available
    #[arg(long, required_unless_present = "input")]
    budget: Option<f64>,

    /// Target weight as ASSET=WEIGHT (repeatable)
    #[arg(long, value_parser = parse_pair)]
    weight: Vec<(AssetId, f64)>,

    /// Unit price as ASSET=PRICE (repeatable)
    #[arg(long, value_parser = parse_pair)]
    price: Vec<(AssetId, f64)>,

    /// JSON allocator configuration; defaults to ALLOCATOR_* environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the allocation as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AllocatorConfig::from_json_file(path)?,
        None => AllocatorConfig::from_env()?,
    };
    let request = load_request(&cli)?;

    info!(
        "Allocating {:.2} across {} assets",
        request.budget,
        request.target_weights.len()
    );

    let allocator = Allocator::new(config);
    let allocation = allocator.allocate(request.budget, &request.target_weights, &request.prices)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&allocation)?);
    } else {
        println!("{allocation}");
    }
    Ok(())
}

/// Initialize tracing
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", SERVICE_NAME.replace('-', "_")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
}

fn load_request(cli: &Cli) -> Result<AllocationRequest> {
    if let Some(path) = &cli.input {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read request {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("Invalid request in {}", path.display()));
    }

    let budget = cli.budget.context("--budget is required without --input")?;
    let target_weights = unique_pairs(&cli.weight, "--weight")?;
    let prices = unique_pairs(&cli.price, "--price")?;
    Ok(AllocationRequest {
        budget,
        target_weights,
        prices,
    })
}

/// Map repeated ASSET=VALUE flags, rejecting an asset given twice
fn unique_pairs(pairs: &[(AssetId, f64)], flag: &str) -> Result<FxHashMap<AssetId, f64>> {
    let mut map = FxHashMap::default();
    for (asset, value) in pairs {
        if map.insert(asset.clone(), *value).is_some() {
            bail!("Duplicate {} for asset {}", flag, asset);
        }
    }
    Ok(map)
}

fn parse_pair(raw: &str) -> Result<(AssetId, f64), String> {
    let (asset, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ASSET=VALUE, got '{raw}'"))?;
    let asset = asset.trim();
    if asset.is_empty() {
        return Err(format!("missing asset in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid number in '{raw}': {e}"))?;
    Ok((AssetId::from(asset), value))
}
