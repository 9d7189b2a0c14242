//! sao-portfolio: request
//!
//! Validation + normalisation of raw targets into a priced
//! [`AllocationRequest`]. Pure: no IO, no logging above `debug`.
//!
//! Check order (first failure wins):
//! 1. budget finite and > 0
//! 2. symbols non-empty and unique after trim + upper-case
//! 3. weights finite, ≥ 0, sum > 0
//! 4. unit caps ≥ 1
//! 5. every symbol has a usable price (all offenders reported together)

use std::collections::{BTreeMap, BTreeSet};

use crate::error::AllocationError;
use crate::types::{normalize_symbol, AllocationMode, InstrumentTarget, PriceMap, RawTarget};

/// A fully validated, price-complete allocation problem.
///
/// Only [`RequestBuilder::build`] constructs this; it is consumed by value by
/// [`crate::Allocator::allocate`].
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationRequest {
    targets: Vec<InstrumentTarget>,
    index: BTreeMap<String, usize>,
    budget: f64,
    mode: AllocationMode,
}

impl AllocationRequest {
    /// Targets in input order.
    pub fn targets(&self) -> &[InstrumentTarget] {
        &self.targets
    }

    pub fn get(&self, symbol: &str) -> Option<&InstrumentTarget> {
        self.index.get(symbol).map(|&i| &self.targets[i])
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Divide every weight by the sum so the result totals 1.0.
///
/// Fails when any weight is negative or non-finite, or the sum is ≤ 0.
/// Idempotent on already-normalised input (within float tolerance).
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>, AllocationError> {
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(AllocationError::invalid(format!(
            "weights must be finite and >= 0 (got {w})"
        )));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(AllocationError::invalid(format!(
            "sum of target weights must be > 0 (got {total})"
        )));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

/// Collects raw targets and scalar settings, then joins prices.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    budget: f64,
    mode: AllocationMode,
    max_units: Option<u64>,
    targets: Vec<RawTarget>,
}

impl RequestBuilder {
    pub fn new(budget: f64, mode: AllocationMode) -> Self {
        Self {
            budget,
            mode,
            max_units: None,
            targets: Vec::new(),
        }
    }

    /// Shared unit cap applied to every target without its own `max_units`.
    pub fn max_units(mut self, max_units: Option<u64>) -> Self {
        self.max_units = max_units;
        self
    }

    pub fn target(mut self, target: RawTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn targets<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = RawTarget>,
    {
        self.targets.extend(targets);
        self
    }

    /// Validate everything and attach prices from `prices`.
    ///
    /// `prices` is keyed by normalised (upper-case) symbol.
    pub fn build(self, prices: &PriceMap) -> Result<AllocationRequest, AllocationError> {
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(AllocationError::invalid(format!(
                "budget must be finite and > 0 (got {})",
                self.budget
            )));
        }

        if self.targets.is_empty() {
            return Err(AllocationError::invalid("no targets supplied"));
        }

        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut symbols: Vec<String> = Vec::with_capacity(self.targets.len());
        for t in &self.targets {
            let sym = normalize_symbol(&t.symbol);
            if sym.is_empty() {
                return Err(AllocationError::invalid("symbol must not be empty"));
            }
            if !seen.insert(sym.clone()) {
                return Err(AllocationError::invalid(format!("duplicate symbol '{sym}'")));
            }
            symbols.push(sym);
        }

        for (sym, t) in symbols.iter().zip(&self.targets) {
            if !t.weight.is_finite() || t.weight < 0.0 {
                return Err(AllocationError::invalid(format!(
                    "target weight for '{sym}' must be finite and >= 0 (got {})",
                    t.weight
                )));
            }
        }
        let raw_weights: Vec<f64> = self.targets.iter().map(|t| t.weight).collect();
        let weights = normalize_weights(&raw_weights)?;

        if self.max_units == Some(0) {
            return Err(AllocationError::invalid("max_units must be >= 1"));
        }
        for (sym, t) in symbols.iter().zip(&self.targets) {
            if t.max_units == Some(0) {
                return Err(AllocationError::invalid(format!(
                    "max_units for '{sym}' must be >= 1"
                )));
            }
        }

        let mut missing: Vec<String> = Vec::new();
        let mut targets: Vec<InstrumentTarget> = Vec::with_capacity(symbols.len());
        for ((sym, raw), weight) in symbols.into_iter().zip(&self.targets).zip(weights) {
            match prices.get(&sym).and_then(|p| p.usable()) {
                Some(price) => targets.push(InstrumentTarget {
                    symbol: sym,
                    target_weight: weight,
                    price,
                    unit_cap: raw.max_units.or(self.max_units),
                }),
                None => missing.push(sym),
            }
        }
        if !missing.is_empty() {
            return Err(AllocationError::UnresolvedPrice { symbols: missing });
        }

        let index = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.symbol.clone(), i))
            .collect();

        tracing::debug!(
            instruments = targets.len(),
            budget = self.budget,
            mode = %self.mode,
            "allocation request built"
        );

        Ok(AllocationRequest {
            targets,
            index,
            budget: self.budget,
            mode: self.mode,
        })
    }
}
