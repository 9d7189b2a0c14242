//! sao-portfolio: plan
//!
//! Post-solve derivation: integer units → costs, realized weights, totals.

use serde::Serialize;

use crate::request::AllocationRequest;
use crate::types::{AllocationMode, SolveStatus};

/// One instrument's line in a [`PurchasePlan`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanEntry {
    pub symbol: String,
    pub price: f64,
    pub units: u64,
    /// `units × price`.
    pub cost: f64,
    pub target_weight: f64,
    /// `cost / total_invested`; 0.0 when nothing was invested.
    pub realized_weight: f64,
    pub unit_cap: Option<u64>,
}

/// Output of one successful allocation run. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PurchasePlan {
    pub status: SolveStatus,
    pub mode: AllocationMode,
    pub budget: f64,
    /// Entries in request order.
    pub entries: Vec<PlanEntry>,
    pub total_invested: f64,
    pub leftover_cash: f64,
    /// Σ |target_weight × budget − cost|.
    pub total_deviation: f64,
}

impl PurchasePlan {
    /// Derive the plan from a request and the integer units chosen per target
    /// (same order as `request.targets()`).
    pub(crate) fn derive(request: &AllocationRequest, units: &[u64]) -> Self {
        debug_assert_eq!(units.len(), request.len());

        let budget = request.budget();
        let costs: Vec<f64> = request
            .targets()
            .iter()
            .zip(units)
            .map(|(t, &u)| u as f64 * t.price)
            .collect();
        let total_invested: f64 = costs.iter().sum();

        let entries: Vec<PlanEntry> = request
            .targets()
            .iter()
            .zip(units)
            .zip(&costs)
            .map(|((t, &u), &cost)| PlanEntry {
                symbol: t.symbol.clone(),
                price: t.price,
                units: u,
                cost,
                target_weight: t.target_weight,
                realized_weight: if total_invested > 0.0 {
                    cost / total_invested
                } else {
                    0.0
                },
                unit_cap: t.unit_cap,
            })
            .collect();

        let total_deviation = request
            .targets()
            .iter()
            .zip(&costs)
            .map(|(t, cost)| (t.target_value(budget) - cost).abs())
            .sum();

        Self {
            status: SolveStatus::Optimal,
            mode: request.mode(),
            budget,
            entries,
            total_invested,
            // Float summation can overshoot an exactly spent budget by ~1e-11.
            leftover_cash: (budget - total_invested).max(0.0),
            total_deviation,
        }
    }

    pub fn entry(&self, symbol: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn units(&self, symbol: &str) -> Option<u64> {
        self.entry(symbol).map(|e| e.units)
    }

    /// True when the optimum buys nothing (e.g. every price exceeds budget).
    pub fn is_zero_spend(&self) -> bool {
        self.entries.iter().all(|e| e.units == 0)
    }

    /// Number of instruments with at least one unit bought.
    pub fn position_count(&self) -> usize {
        self.entries.iter().filter(|e| e.units > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBuilder;
    use crate::types::{prices, RawTarget};

    fn request(budget: f64) -> AllocationRequest {
        RequestBuilder::new(budget, AllocationMode::MaximizeDeployment)
            .target(RawTarget::new("AAA", 0.5))
            .target(RawTarget::new("BBB", 0.5))
            .build(&prices([("AAA", 100.0), ("BBB", 50.0)]))
            .unwrap()
    }

    #[test]
    fn derives_costs_weights_and_leftover() {
        let plan = PurchasePlan::derive(&request(500.0), &[3, 2]);
        assert_eq!(plan.total_invested, 400.0);
        assert_eq!(plan.leftover_cash, 100.0);
        assert_eq!(plan.entry("AAA").unwrap().cost, 300.0);
        assert!((plan.entry("AAA").unwrap().realized_weight - 0.75).abs() < 1e-12);
        assert!((plan.entry("BBB").unwrap().realized_weight - 0.25).abs() < 1e-12);
        // targets 250/250 vs costs 300/100
        assert!((plan.total_deviation - 200.0).abs() < 1e-9);
        assert_eq!(plan.position_count(), 2);
    }

    #[test]
    fn zero_spend_has_zero_realized_weights() {
        let plan = PurchasePlan::derive(&request(500.0), &[0, 0]);
        assert!(plan.is_zero_spend());
        assert_eq!(plan.total_invested, 0.0);
        assert_eq!(plan.leftover_cash, 500.0);
        assert!(plan.entries.iter().all(|e| e.realized_weight == 0.0));
    }

    #[test]
    fn leftover_cash_never_goes_negative_on_float_overshoot() {
        // 0.1 + 0.2 sums to 0.30000000000000004 > 0.3.
        let req = RequestBuilder::new(0.3, AllocationMode::MaximizeDeployment)
            .target(RawTarget::new("AAA", 0.5))
            .target(RawTarget::new("BBB", 0.5))
            .build(&prices([("AAA", 0.1), ("BBB", 0.2)]))
            .unwrap();
        let plan = PurchasePlan::derive(&req, &[1, 1]);
        assert!(plan.total_invested > 0.3);
        assert_eq!(plan.leftover_cash, 0.0);
        assert!(!plan.leftover_cash.is_sign_negative());
    }

    #[test]
    fn plan_serializes_status_and_entries() {
        let plan = PurchasePlan::derive(&request(500.0), &[0, 10]);
        let v = serde_json::to_value(&plan).unwrap();
        assert_eq!(v["status"], "Optimal");
        assert_eq!(v["mode"], "MaximizeDeployment");
        assert_eq!(v["entries"][1]["units"], 10);
    }
}
