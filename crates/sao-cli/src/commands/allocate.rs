//! `sao allocate`: targets + prices + settings → purchase plan outcome.
//!
//! Flags override config (`/allocation/*`, `/prices/*`); config overrides
//! built-in defaults. `--prices` forces the static resolver.

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use std::collections::BTreeSet;

use sao_config::{
    report_unused_keys, resolve_price_secrets, AllocationSettings, LoadedConfig, PriceSettings,
    PriceSource, UnusedKeyPolicy,
};
use sao_md::{
    CachedPriceResolver, PriceResolver, StaticPriceResolver, TwelveDataPriceResolver,
    DEFAULT_PRICE_TTL_SECS, DEFAULT_TWELVEDATA_BASE_URL,
};
use sao_portfolio::{
    normalize_symbol, AllocationError, AllocationMode, Allocator, AllocatorConfig, RequestBuilder,
};

use super::report::Outcome;
use super::{load_targets, read_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct AllocateArgs {
    /// CSV with `symbol,target_allocation[,max_units]` columns
    #[arg(long, conflicts_with = "target")]
    pub targets: Option<String>,

    /// Manual target `SYM=WEIGHT[:MAX_UNITS]` (repeatable, comma lists allowed)
    #[arg(long)]
    pub target: Vec<String>,

    /// Total investment amount (> 0)
    #[arg(long)]
    pub investment: Option<f64>,

    /// Shared per-instrument unit cap
    #[arg(long)]
    pub max_units: Option<u64>,

    /// Objective: deviation | deployment
    #[arg(long)]
    pub mode: Option<String>,

    /// Allowed undeployed cash in deviation mode
    #[arg(long)]
    pub band: Option<f64>,

    /// Static `symbol,price` CSV instead of the configured price source
    #[arg(long)]
    pub prices: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Treat unused config keys as an error
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,
}

/// Settings after flags, config and defaults are merged.
#[derive(Debug, Clone, PartialEq)]
struct Effective {
    investment: f64,
    max_units: Option<u64>,
    mode: AllocationMode,
    band: f64,
}

fn effective_settings(args: &AllocateArgs, cfg: &AllocationSettings) -> Result<Effective> {
    let investment = args
        .investment
        .or(cfg.investment)
        .context("investment is required: pass --investment or set allocation.investment")?;

    let mode = match args.mode.as_deref() {
        Some(m) => match AllocationMode::parse(m) {
            Some(mode) => mode,
            None => bail!("invalid --mode '{m}'. expected one of: deviation | deployment"),
        },
        None => cfg.mode,
    };

    Ok(Effective {
        investment,
        max_units: args.max_units.or(cfg.max_units),
        mode,
        band: args.band.unwrap_or(cfg.deployment_band),
    })
}

fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return LoadedConfig::empty();
    }
    let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    sao_config::load_layered_yaml(&refs)
}

fn build_resolver(
    args: &AllocateArgs,
    prices: &PriceSettings,
    source: PriceSource,
) -> Result<Box<dyn PriceResolver>> {
    match source {
        PriceSource::Static => {
            let path = args
                .prices
                .as_deref()
                .context("prices.source=static requires --prices <csv>")?;
            let raw = read_text(path, "prices csv")?;
            let r = StaticPriceResolver::from_csv_str(&raw)
                .with_context(|| format!("invalid prices csv: {path}"))?;
            Ok(Box::new(r))
        }
        PriceSource::TwelveData => {
            let secrets = resolve_price_secrets(prices, source)?;
            let key = secrets
                .twelvedata_api_key
                .context("twelvedata api key missing")?;
            let base_url = prices
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_TWELVEDATA_BASE_URL.to_string());
            let ttl = prices.cache_ttl_seconds.unwrap_or(DEFAULT_PRICE_TTL_SECS);
            let inner = TwelveDataPriceResolver::new_with_base_url(key, base_url)?;
            Ok(Box::new(CachedPriceResolver::new(
                inner,
                chrono::Duration::seconds(ttl),
            )))
        }
    }
}

pub async fn run(args: AllocateArgs) -> Result<Outcome> {
    let loaded = load_config(&args.config_paths)?;
    let alloc_cfg = AllocationSettings::from_config_json(&loaded.config_json)?;
    let price_cfg = PriceSettings::from_config_json(&loaded.config_json)?;
    let eff = effective_settings(&args, &alloc_cfg)?;

    let source = if args.prices.is_some() {
        PriceSource::Static
    } else {
        price_cfg.source
    };

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = report_unused_keys(source, &loaded.config_json, policy)?;
    for p in &unused.unused_leaf_pointers {
        tracing::warn!(pointer = %p, "unused config key");
    }

    let targets = load_targets(args.targets.as_deref(), &args.target)?;
    let symbols: BTreeSet<String> = targets.iter().map(|t| normalize_symbol(&t.symbol)).collect();

    tracing::info!(
        config_hash = %loaded.config_hash,
        targets = targets.len(),
        investment = eff.investment,
        mode = %eff.mode,
        prices = source.as_str(),
        "allocate"
    );

    let resolver = build_resolver(&args, &price_cfg, source)?;
    let price_map = resolver
        .resolve(&symbols)
        .await
        .with_context(|| format!("price resolution via {} failed", resolver.name()))?;

    let request = match RequestBuilder::new(eff.investment, eff.mode)
        .max_units(eff.max_units)
        .targets(targets)
        .build(&price_map)
    {
        Ok(r) => r,
        Err(AllocationError::UnresolvedPrice { symbols }) => {
            return Ok(Outcome::UnresolvedPrices { symbols })
        }
        Err(e) => return Err(e).context("invalid allocation request"),
    };

    let allocator = Allocator::new(AllocatorConfig {
        deployment_band: eff.band,
    });
    match allocator.allocate(request) {
        Ok(plan) => Ok(Outcome::Plan { plan }),
        Err(AllocationError::NoPlan { status }) => Ok(Outcome::NoPlan { status }),
        Err(e) => Err(e).context("allocation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AllocateArgs,
    }

    fn parse(argv: &[&str]) -> AllocateArgs {
        Harness::parse_from(std::iter::once("sao").chain(argv.iter().copied())).args
    }

    #[test]
    fn flags_override_config() {
        let cfg = AllocationSettings {
            investment: Some(500.0),
            max_units: Some(30),
            mode: AllocationMode::MinimizeDeviation,
            deployment_band: 100.0,
        };
        let args = parse(&["--investment", "1000", "--mode", "deployment", "--band", "25"]);
        let eff = effective_settings(&args, &cfg).unwrap();
        assert_eq!(
            eff,
            Effective {
                investment: 1000.0,
                max_units: Some(30),
                mode: AllocationMode::MaximizeDeployment,
                band: 25.0,
            }
        );
    }

    #[test]
    fn missing_investment_is_an_error() {
        let args = parse(&["--target", "AAA=1"]);
        let err = effective_settings(&args, &AllocationSettings::default()).unwrap_err();
        assert!(err.to_string().contains("investment is required"));
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let args = parse(&["--investment", "10", "--mode", "balanced"]);
        assert!(effective_settings(&args, &AllocationSettings::default()).is_err());
    }

    #[test]
    fn targets_and_target_conflict() {
        let res = Harness::try_parse_from(["sao", "--targets", "a.csv", "--target", "AAA=1"]);
        assert!(res.is_err());
    }

    #[test]
    fn format_defaults_to_table() {
        assert_eq!(parse(&[]).format, OutputFormat::Table);
        assert_eq!(parse(&["--format", "json"]).format, OutputFormat::Json);
    }
}
