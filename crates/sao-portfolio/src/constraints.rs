//! sao-portfolio: constraints
//!
//! After-the-fact verification of a [`PurchasePlan`]:
//!   - Budget       (Σcost ≤ budget)
//!   - Deployment   (Σcost ≥ budget − band, MinimizeDeviation only)
//!   - Unit caps    (units ≤ cap per instrument)
//!
//! The `Allocator` runs these against every rounded solver solution before
//! handing a plan out; callers may run them again for compliance gating.

use crate::plan::PurchasePlan;
use crate::types::AllocationMode;

/// Absolute slack (currency units) tolerated on the money constraints.
const MONEY_EPS: f64 = 1e-6;

// ─── PlanViolation ────────────────────────────────────────────────────────────

/// A single constraint breach detected in a plan.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanViolation {
    /// Σcost exceeds the budget.
    BudgetExceeded { total_invested: f64, budget: f64 },
    /// Σcost is below the near-full-deployment floor.
    DeploymentFloorMissed { total_invested: f64, floor: f64 },
    /// An instrument bought more units than its cap allows.
    UnitCapExceeded { symbol: String, units: u64, cap: u64 },
}

impl std::fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BudgetExceeded {
                total_invested,
                budget,
            } => write!(f, "invested {total_invested:.2} exceeds budget {budget:.2}"),
            Self::DeploymentFloorMissed {
                total_invested,
                floor,
            } => write!(
                f,
                "invested {total_invested:.2} below deployment floor {floor:.2}"
            ),
            Self::UnitCapExceeded { symbol, units, cap } => {
                write!(f, "{units} units of '{symbol}' exceeds cap {cap}")
            }
        }
    }
}

// ─── PlanLimits ───────────────────────────────────────────────────────────────

/// The money limits a plan must satisfy.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanLimits {
    pub budget: f64,
    /// `Some(budget − band)` in MinimizeDeviation mode, `None` otherwise.
    pub deployment_floor: Option<f64>,
}

impl PlanLimits {
    pub fn new(budget: f64, mode: AllocationMode, deployment_band: f64) -> Self {
        let deployment_floor = match mode {
            AllocationMode::MinimizeDeviation => Some(budget - deployment_band),
            AllocationMode::MaximizeDeployment => None,
        };
        Self {
            budget,
            deployment_floor,
        }
    }
}

// ─── Checks ───────────────────────────────────────────────────────────────────

pub fn check_budget(plan: &PurchasePlan, limits: &PlanLimits) -> Vec<PlanViolation> {
    if plan.total_invested > limits.budget + MONEY_EPS {
        vec![PlanViolation::BudgetExceeded {
            total_invested: plan.total_invested,
            budget: limits.budget,
        }]
    } else {
        Vec::new()
    }
}

pub fn check_deployment_floor(plan: &PurchasePlan, limits: &PlanLimits) -> Vec<PlanViolation> {
    match limits.deployment_floor {
        Some(floor) if plan.total_invested < floor - MONEY_EPS => {
            vec![PlanViolation::DeploymentFloorMissed {
                total_invested: plan.total_invested,
                floor,
            }]
        }
        _ => Vec::new(),
    }
}

pub fn check_unit_caps(plan: &PurchasePlan) -> Vec<PlanViolation> {
    plan.entries
        .iter()
        .filter_map(|e| match e.unit_cap {
            Some(cap) if e.units > cap => Some(PlanViolation::UnitCapExceeded {
                symbol: e.symbol.clone(),
                units: e.units,
                cap,
            }),
            _ => None,
        })
        .collect()
}

/// Run every check; empty ⇒ plan satisfies all constraints.
pub fn check_plan(plan: &PurchasePlan, limits: &PlanLimits) -> Vec<PlanViolation> {
    let mut out = check_budget(plan, limits);
    out.extend(check_deployment_floor(plan, limits));
    out.extend(check_unit_caps(plan));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanEntry;
    use crate::request::RequestBuilder;
    use crate::types::{prices, RawTarget, SolveStatus};

    fn plan(units_a: u64, units_b: u64) -> PurchasePlan {
        let entries = vec![
            PlanEntry {
                symbol: "AAA".into(),
                price: 100.0,
                units: units_a,
                cost: units_a as f64 * 100.0,
                target_weight: 0.5,
                realized_weight: 0.0,
                unit_cap: Some(4),
            },
            PlanEntry {
                symbol: "BBB".into(),
                price: 50.0,
                units: units_b,
                cost: units_b as f64 * 50.0,
                target_weight: 0.5,
                realized_weight: 0.0,
                unit_cap: None,
            },
        ];
        let total_invested = entries.iter().map(|e| e.cost).sum();
        PurchasePlan {
            status: SolveStatus::Optimal,
            mode: AllocationMode::MinimizeDeviation,
            budget: 500.0,
            entries,
            total_invested,
            leftover_cash: 500.0 - total_invested,
            total_deviation: 0.0,
        }
    }

    #[test]
    fn clean_plan_has_no_violations() {
        let limits = PlanLimits::new(500.0, AllocationMode::MinimizeDeviation, 100.0);
        assert!(check_plan(&plan(2, 5), &limits).is_empty());
    }

    #[test]
    fn detects_budget_and_cap_breaches() {
        let limits = PlanLimits::new(500.0, AllocationMode::MaximizeDeployment, 100.0);
        let v = check_plan(&plan(5, 1), &limits);
        assert!(v.contains(&PlanViolation::BudgetExceeded {
            total_invested: 550.0,
            budget: 500.0
        }));
        assert!(v.contains(&PlanViolation::UnitCapExceeded {
            symbol: "AAA".into(),
            units: 5,
            cap: 4
        }));
    }

    #[test]
    fn floor_only_applies_to_deviation_mode() {
        let p = plan(1, 1); // 150 invested
        let dev = PlanLimits::new(500.0, AllocationMode::MinimizeDeviation, 100.0);
        let dep = PlanLimits::new(500.0, AllocationMode::MaximizeDeployment, 100.0);
        assert_eq!(
            check_deployment_floor(&p, &dev),
            vec![PlanViolation::DeploymentFloorMissed {
                total_invested: 150.0,
                floor: 400.0
            }]
        );
        assert!(check_deployment_floor(&p, &dep).is_empty());
    }

    #[test]
    fn derived_plan_over_cap_is_flagged() {
        let req = RequestBuilder::new(500.0, AllocationMode::MaximizeDeployment)
            .max_units(Some(10))
            .target(RawTarget::new("AAA", 1.0))
            .build(&prices([("AAA", 33.33)]))
            .unwrap();
        let limits = PlanLimits::new(500.0, AllocationMode::MaximizeDeployment, 100.0);
        assert!(check_plan(&PurchasePlan::derive(&req, &[10]), &limits).is_empty());
        assert_eq!(
            check_unit_caps(&PurchasePlan::derive(&req, &[11])),
            vec![PlanViolation::UnitCapExceeded {
                symbol: "AAA".into(),
                units: 11,
                cap: 10
            }]
        );
    }

    #[test]
    fn violation_display() {
        let v = PlanViolation::UnitCapExceeded {
            symbol: "X".into(),
            units: 3,
            cap: 2,
        };
        assert_eq!(v.to_string(), "3 units of 'X' exceeds cap 2");
    }
}
