//! sao-portfolio: program
//!
//! Integer-program formulation of one [`AllocationRequest`].
//!
//! Variables (one pass over the indexed targets):
//! - `units[s]`      integer, ≥ 0, ≤ `unit_cap[s]` when capped
//! - `deviation[s]`  continuous, ≥ 0 (MinimizeDeviation only)
//!
//! | Mode               | Objective          | Constraints                                   |
//! |--------------------|--------------------|-----------------------------------------------|
//! | MinimizeDeviation  | min Σ deviation[s] | deviation[s] ≥ ±(target_value[s] − cost[s]);  |
//! |                    |                    | Σcost ≤ budget; Σcost ≥ budget − band         |
//! | MaximizeDeployment | max Σcost          | Σcost ≤ budget                                |
//!
//! where `cost[s] = units[s] × price[s]` and
//! `target_value[s] = target_weight[s] × budget`.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use crate::error::AllocationError;
use crate::request::AllocationRequest;
use crate::types::{AllocationMode, SolveStatus};

/// Formulation of one request, ready to solve.
pub(crate) struct IntegerProgram<'a> {
    request: &'a AllocationRequest,
    deployment_band: f64,
}

impl<'a> IntegerProgram<'a> {
    pub(crate) fn new(request: &'a AllocationRequest, deployment_band: f64) -> Self {
        Self {
            request,
            deployment_band,
        }
    }

    /// Solve and return whole units per target, in request order.
    ///
    /// Solver values are rounded to the nearest integer; the caller is
    /// responsible for re-checking the rounded plan.
    pub(crate) fn solve(&self) -> Result<Vec<u64>, AllocationError> {
        let targets = self.request.targets();
        let budget = self.request.budget();

        let mut vars = ProblemVariables::new();

        let units: Vec<Variable> = targets
            .iter()
            .map(|t| {
                let def = variable().integer().min(0.0);
                let def = match t.unit_cap {
                    Some(cap) => def.max(cap as f64),
                    None => def,
                };
                vars.add(def)
            })
            .collect();

        let costs: Vec<Expression> = targets
            .iter()
            .zip(&units)
            .map(|(t, &u)| t.price * u)
            .collect();

        let spend: Expression = costs
            .iter()
            .fold(Expression::from(0.0), |acc, c| acc + c.clone());

        tracing::debug!(
            mode = %self.request.mode(),
            instruments = targets.len(),
            capped = targets.iter().filter(|t| t.unit_cap.is_some()).count(),
            budget,
            "solving allocation program"
        );

        let values = match self.request.mode() {
            AllocationMode::MaximizeDeployment => {
                let problem = vars
                    .maximise(spend.clone())
                    .using(default_solver)
                    .with(constraint!(spend <= budget));

                let solution = problem.solve().map_err(resolution_to_error)?;
                units.iter().map(|&u| solution.value(u)).collect::<Vec<f64>>()
            }

            AllocationMode::MinimizeDeviation => {
                let deviation: Vec<Variable> = targets
                    .iter()
                    .map(|_| vars.add(variable().min(0.0)))
                    .collect();

                let objective = deviation
                    .iter()
                    .fold(Expression::from(0.0), |acc, &d| acc + d);

                let mut problem = vars.minimise(objective).using(default_solver);

                for ((t, cost), &d) in targets.iter().zip(&costs).zip(&deviation) {
                    let target_value = t.target_value(budget);
                    // d ≥ target_value − cost
                    let under = Expression::from(d) + cost.clone();
                    problem = problem.with(constraint!(under >= target_value));
                    // d ≥ cost − target_value
                    let over = Expression::from(d) - cost.clone();
                    let neg_target = -target_value;
                    problem = problem.with(constraint!(over >= neg_target));
                }

                let floor = budget - self.deployment_band;
                problem = problem.with(constraint!(spend.clone() <= budget));
                problem = problem.with(constraint!(spend >= floor));

                let solution = problem.solve().map_err(resolution_to_error)?;
                units.iter().map(|&u| solution.value(u)).collect::<Vec<f64>>()
            }
        };

        Ok(values.into_iter().map(round_units).collect())
    }
}

fn round_units(v: f64) -> u64 {
    let r = v.round();
    if r.is_finite() && r > 0.0 {
        r as u64
    } else {
        0
    }
}

fn resolution_to_error(e: ResolutionError) -> AllocationError {
    match e {
        ResolutionError::Infeasible => AllocationError::NoPlan {
            status: SolveStatus::Infeasible,
        },
        ResolutionError::Unbounded => AllocationError::NoPlan {
            status: SolveStatus::Unbounded,
        },
        other => AllocationError::SolverError {
            message: other.to_string(),
        },
    }
}
