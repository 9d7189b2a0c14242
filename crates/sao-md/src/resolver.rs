//! Price-resolver boundary.
//!
//! This module defines the resolver trait, its error type, and the in-memory
//! [`StaticPriceResolver`]. Network-backed resolvers live in sibling modules.
//!
//! # Contract
//! `resolve` returns an entry for **every** requested symbol: either a price
//! or `Unresolved { reason }`. Whole-call failures (transport down, missing
//! API key) are `Err`. Resolvers never retry.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use sao_portfolio::{normalize_symbol, PriceMap, ResolvedPrice};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that a [`PriceResolver`] implementation may return.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API returned an application-level error for the call.
    Api { code: Option<i64>, message: String },
    /// A payload (response body, price table) could not be decoded.
    Decode(String),
    /// A required configuration value (e.g. API key) is missing or invalid.
    Config(String),
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::Transport(msg) => write!(f, "transport error: {msg}"),
            ResolverError::Api {
                code: Some(c),
                message,
            } => {
                write!(f, "price api error code={c}: {message}")
            }
            ResolverError::Api {
                code: None,
                message,
            } => {
                write!(f, "price api error: {message}")
            }
            ResolverError::Decode(msg) => write!(f, "decode error: {msg}"),
            ResolverError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for ResolverError {}

// ---------------------------------------------------------------------------
// Resolver trait
// ---------------------------------------------------------------------------

/// Current-price lookup for a set of symbols.
///
/// Object-safe so callers can hold a `Box<dyn PriceResolver>`.
#[async_trait::async_trait]
pub trait PriceResolver: Send + Sync {
    /// Human-readable name identifying this resolver (e.g. `"twelvedata"`).
    fn name(&self) -> &'static str;

    /// Resolve every symbol in `symbols` (already normalised, upper-case).
    async fn resolve(&self, symbols: &BTreeSet<String>) -> Result<PriceMap, ResolverError>;
}

/// Fill in `Unresolved` for any requested symbol the resolver left out.
pub fn complete_resolution(
    resolver: &str,
    symbols: &BTreeSet<String>,
    mut resolved: PriceMap,
) -> PriceMap {
    for s in symbols {
        resolved
            .entry(s.clone())
            .or_insert_with(|| ResolvedPrice::unresolved(format!("not returned by {resolver}")));
    }
    resolved
}

/// Symbols in `map` that did not resolve to a usable price.
pub fn unresolved_symbols(map: &PriceMap) -> Vec<String> {
    map.iter()
        .filter(|(_, p)| p.usable().is_none())
        .map(|(s, _)| s.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Static resolver
// ---------------------------------------------------------------------------

/// Fixed price table (offline runs, operator overrides, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticPriceResolver {
    prices: BTreeMap<String, f64>,
}

impl StaticPriceResolver {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self {
            prices: items
                .into_iter()
                .map(|(s, p)| (normalize_symbol(s.as_ref()), p))
                .collect(),
        }
    }

    /// Parse a `symbol,price` table (header required, columns
    /// case-insensitive and order-independent, blank lines skipped).
    pub fn from_csv_str(src: &str) -> Result<Self, ResolverError> {
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(src.as_bytes());

        let mut cols: Option<(usize, usize)> = None;
        let mut prices = BTreeMap::new();

        for rec in rdr.records() {
            let rec = rec.map_err(|e| ResolverError::Decode(format!("price table: {e}")))?;
            if rec.iter().all(str::is_empty) {
                continue;
            }
            let (sym_i, px_i) = match cols {
                Some(c) => c,
                None => {
                    let idx: HashMap<String, usize> = rec
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (c.to_ascii_lowercase(), i))
                        .collect();
                    match (idx.get("symbol"), idx.get("price")) {
                        (Some(&s), Some(&p)) => cols = Some((s, p)),
                        _ => {
                            return Err(ResolverError::Decode(
                                "price table needs 'symbol' and 'price' columns".to_string(),
                            ))
                        }
                    }
                    continue;
                }
            };

            let line = rec.position().map_or(0, |p| p.line());
            let sym = rec.get(sym_i).unwrap_or("");
            let raw = rec.get(px_i).unwrap_or("");
            let price: f64 = raw.parse().map_err(|_| {
                ResolverError::Decode(format!("price row {line}: bad price '{raw}'"))
            })?;
            if sym.is_empty() {
                return Err(ResolverError::Decode(format!(
                    "price row {line}: empty symbol"
                )));
            }
            prices.insert(normalize_symbol(sym), price);
        }

        if cols.is_none() {
            return Err(ResolverError::Decode("price table is empty".to_string()));
        }
        Ok(Self { prices })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[async_trait::async_trait]
impl PriceResolver for StaticPriceResolver {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self, symbols: &BTreeSet<String>) -> Result<PriceMap, ResolverError> {
        let found: PriceMap = symbols
            .iter()
            .filter_map(|s| {
                self.prices
                    .get(s)
                    .map(|&p| (s.clone(), ResolvedPrice::Price(p)))
            })
            .collect();
        Ok(complete_resolution(self.name(), symbols, found))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
