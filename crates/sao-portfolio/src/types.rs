use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Objective selector for one allocation run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationMode {
    /// Minimise Σ|target_value − cost| while deploying at least
    /// `budget − deployment_band`.
    MinimizeDeviation,
    /// Maximise Σcost subject only to the budget.
    MaximizeDeployment,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::MinimizeDeviation => "MinimizeDeviation",
            AllocationMode::MaximizeDeployment => "MaximizeDeployment",
        }
    }

    /// Accepts the canonical names plus the short CLI/config spellings
    /// `deviation` and `deployment` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimizedeviation" | "minimize_deviation" | "deviation" => {
                Some(AllocationMode::MinimizeDeviation)
            }
            "maximizedeployment" | "maximize_deployment" | "deployment" => {
                Some(AllocationMode::MaximizeDeployment)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome reported by the integer-program solve.
///
/// Only `Optimal` ever accompanies a [`crate::PurchasePlan`]; the others are
/// carried by [`crate::AllocationError::NoPlan`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::NotSolved => "NotSolved",
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-supplied target row, before normalisation.
///
/// `weight` may be on any non-negative scale (0.25, 25, ...); the builder
/// divides by the sum.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTarget {
    pub symbol: String,
    pub weight: f64,
    /// Per-instrument unit cap; overrides the request-level cap.
    pub max_units: Option<u64>,
}

impl RawTarget {
    pub fn new<S: Into<String>>(symbol: S, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
            max_units: None,
        }
    }

    pub fn with_max_units(mut self, max_units: u64) -> Self {
        self.max_units = Some(max_units);
        self
    }
}

/// Outcome of a price lookup for one symbol.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedPrice {
    Price(f64),
    Unresolved { reason: String },
}

impl ResolvedPrice {
    pub fn unresolved<S: Into<String>>(reason: S) -> Self {
        ResolvedPrice::Unresolved {
            reason: reason.into(),
        }
    }

    /// The price if it is usable for allocation (finite and > 0).
    pub fn usable(&self) -> Option<f64> {
        match self {
            ResolvedPrice::Price(p) if p.is_finite() && *p > 0.0 => Some(*p),
            _ => None,
        }
    }
}

/// Canonical price map type (symbol -> lookup outcome).
pub type PriceMap = BTreeMap<String, ResolvedPrice>;

/// Helper to build a PriceMap of resolved prices with minimal boilerplate.
pub fn prices<I, S>(items: I) -> PriceMap
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let mut m = PriceMap::new();
    for (sym, px) in items {
        m.insert(sym.into(), ResolvedPrice::Price(px));
    }
    m
}

/// A validated, priced instrument inside an [`crate::AllocationRequest`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InstrumentTarget {
    /// Upper-case, trimmed, unique within the request.
    pub symbol: String,
    /// Normalised weight in [0, 1].
    pub target_weight: f64,
    /// Unit price, finite and > 0.
    pub price: f64,
    pub unit_cap: Option<u64>,
}

impl InstrumentTarget {
    /// Dollar value this instrument should receive: `target_weight × budget`.
    pub fn target_value(&self, budget: f64) -> f64 {
        self.target_weight * budget
    }
}

/// Canonical symbol form: trimmed, ASCII upper-case.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
