//! sao-portfolio
//!
//! Integer share allocation core:
//! - Target input parsing (CSV table / manual `SYM=W` entries)
//! - Request validation + weight normalisation + price join
//! - Integer-program allocator with two objectives
//!   (MinimizeDeviation, MaximizeDeployment)
//! - Purchase plan derivation (costs, realized weights, leftover cash)
//! - Post-solve constraint checks
//! - Pure deterministic logic (no IO, no network, no clock)

mod error;
mod plan;
mod program;
mod types;

pub mod allocator;
pub mod constraints;
pub mod input;
pub mod request;

pub use allocator::{Allocator, AllocatorConfig, DEFAULT_DEPLOYMENT_BAND};
pub use constraints::{
    check_budget, check_deployment_floor, check_plan, check_unit_caps, PlanLimits, PlanViolation,
};
pub use error::AllocationError;
pub use input::{parse_manual_target, parse_manual_targets, parse_targets_csv, InputError};
pub use plan::{PlanEntry, PurchasePlan};
pub use request::{normalize_weights, AllocationRequest, RequestBuilder};
pub use types::{
    normalize_symbol, prices, AllocationMode, InstrumentTarget, PriceMap, RawTarget,
    ResolvedPrice, SolveStatus,
};
