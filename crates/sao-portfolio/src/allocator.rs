//! sao-portfolio: allocator
//!
//! Responsibilities (pure, no IO, no price lookups):
//! - Accept a validated [`AllocationRequest`] (built by `RequestBuilder`).
//! - Formulate and solve the integer program for the request's mode.
//! - Produce a [`PurchasePlan`] with whole units, realized weights and
//!   leftover cash, or surface the solver status verbatim.
//!
//! Design notes:
//! - A plan only exists for an optimal solve. Infeasible / Unbounded /
//!   NotSolved never produce a partial or zero plan.
//! - Rounded solver output is re-checked with `constraints::check_plan`; a
//!   solution that fails the checks is reported as `NotSolved`.
//! - No constraint relaxation or retry happens here.

use crate::constraints::{check_plan, PlanLimits};
use crate::error::AllocationError;
use crate::plan::PurchasePlan;
use crate::program::IntegerProgram;
use crate::request::AllocationRequest;
use crate::types::SolveStatus;

/// Default width of the near-full-deployment band (currency units).
pub const DEFAULT_DEPLOYMENT_BAND: f64 = 100.0;

// ─── AllocatorConfig ─────────────────────────────────────────────────────────

/// Solver-side settings shared by every request an allocator handles.
///
/// `deployment_band`: in MinimizeDeviation mode, Σcost must be at least
/// `budget − deployment_band`. Ignored in MaximizeDeployment mode.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocatorConfig {
    pub deployment_band: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            deployment_band: DEFAULT_DEPLOYMENT_BAND,
        }
    }
}

// ─── Allocator ───────────────────────────────────────────────────────────────

/// Integer allocation optimizer.
///
/// Stateless between calls: the same request always yields the same plan
/// (modulo the solver's choice among equally optimal integer solutions).
#[derive(Clone, Debug, Default)]
pub struct Allocator {
    config: AllocatorConfig,
}

impl Allocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Solve one request. The request is consumed: one request, one outcome.
    pub fn allocate(&self, request: AllocationRequest) -> Result<PurchasePlan, AllocationError> {
        let band = self.config.deployment_band;
        if !band.is_finite() || band < 0.0 {
            return Err(AllocationError::invalid(format!(
                "deployment_band must be finite and >= 0 (got {band})"
            )));
        }

        let units = match IntegerProgram::new(&request, band).solve() {
            Ok(u) => u,
            Err(e) => {
                tracing::info!(mode = %request.mode(), error = %e, "allocation produced no plan");
                return Err(e);
            }
        };

        let plan = PurchasePlan::derive(&request, &units);

        let limits = PlanLimits::new(request.budget(), request.mode(), band);
        let violations = check_plan(&plan, &limits);
        if !violations.is_empty() {
            for v in &violations {
                tracing::warn!(violation = %v, "rounded solver solution rejected");
            }
            return Err(AllocationError::NoPlan {
                status: SolveStatus::NotSolved,
            });
        }

        tracing::info!(
            mode = %plan.mode,
            status = %plan.status,
            total_invested = plan.total_invested,
            leftover_cash = plan.leftover_cash,
            positions = plan.position_count(),
            "allocation solved"
        );

        Ok(plan)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
