//! Plan reporter.
//!
//! Every report opens with an `outcome=` line so scripts can tell a plan
//! (including an all-zero one) from missing prices and from a solve with no
//! plan. Only `PLAN` exits 0.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::process::ExitCode;

use sao_portfolio::{PurchasePlan, SolveStatus};

use super::allocate::OutputFormat;

/// Exit code for UNRESOLVED_PRICES and NO_PLAN. Input and config errors exit 1.
const EXIT_NO_PLAN: u8 = 2;

/// Width of a 100% pie bar.
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Plan { plan: PurchasePlan },
    UnresolvedPrices { symbols: Vec<String> },
    NoPlan { status: SolveStatus },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Plan { .. } => "PLAN",
            Outcome::UnresolvedPrices { .. } => "UNRESOLVED_PRICES",
            Outcome::NoPlan { .. } => "NO_PLAN",
        }
    }

    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::Plan { .. } => 0,
            _ => EXIT_NO_PLAN,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

pub fn print(outcome: &Outcome, format: OutputFormat) -> Result<()> {
    let out = match format {
        OutputFormat::Table => render_table(outcome),
        OutputFormat::Json => {
            serde_json::to_string_pretty(outcome).context("serialize outcome json failed")?
        }
    };
    println!("{}", out.trim_end());
    Ok(())
}

pub fn render_table(outcome: &Outcome) -> String {
    let mut s = String::new();
    match outcome {
        Outcome::Plan { plan } => {
            let _ = writeln!(
                s,
                "outcome={} status={} mode={}",
                outcome.label(),
                plan.status,
                plan.mode
            );
            s.push_str(&render_plan(plan));
        }
        Outcome::UnresolvedPrices { symbols } => {
            let _ = writeln!(s, "outcome={} symbols={}", outcome.label(), symbols.join(","));
        }
        Outcome::NoPlan { status } => {
            let _ = writeln!(s, "outcome={} status={}", outcome.label(), status);
        }
    }
    s
}

fn render_plan(plan: &PurchasePlan) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{:<10} {:>8} {:>12} {:>14} {:>8} {:>8}",
        "SYMBOL", "UNITS", "PRICE", "COST", "TARGET", "ACTUAL"
    );
    for e in &plan.entries {
        let _ = writeln!(
            s,
            "{:<10} {:>8} {:>12.2} {:>14.2} {:>7.1}% {:>7.1}%",
            e.symbol,
            e.units,
            e.price,
            e.cost,
            e.target_weight * 100.0,
            e.realized_weight * 100.0
        );
    }
    let _ = writeln!(
        s,
        "budget={:.2} total_invested={:.2} leftover_cash={:.2} total_deviation={:.2}",
        plan.budget, plan.total_invested, plan.leftover_cash, plan.total_deviation
    );

    if plan.is_zero_spend() {
        let _ = writeln!(
            s,
            "note=zero_spend no instrument is affordable within the budget"
        );
        return s;
    }

    let _ = writeln!(s, "actual allocation:");
    for e in plan.entries.iter().filter(|e| e.units > 0) {
        let _ = writeln!(
            s,
            "{:<10} {} {:>5.1}%",
            e.symbol,
            pie_bar(e.realized_weight),
            e.realized_weight * 100.0
        );
    }
    s
}

/// Proportional bar: `#` for the share, `.` for the rest.
fn pie_bar(weight: f64) -> String {
    let filled = (weight.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sao_portfolio::{prices, AllocationMode, Allocator, RawTarget, RequestBuilder};

    fn plan(budget: f64, items: &[(&str, f64, f64)]) -> PurchasePlan {
        let req = RequestBuilder::new(budget, AllocationMode::MaximizeDeployment)
            .max_units(Some(30))
            .targets(items.iter().map(|(s, w, _)| RawTarget::new(*s, *w)))
            .build(&prices(items.iter().map(|(s, _, p)| (*s, *p))))
            .unwrap();
        Allocator::default().allocate(req).unwrap()
    }

    // ── outcome lines ──

    #[test]
    fn three_outcomes_are_distinguishable() {
        let p = render_table(&Outcome::Plan {
            plan: plan(100.0, &[("AAA", 1.0, 10.0)]),
        });
        let u = render_table(&Outcome::UnresolvedPrices {
            symbols: vec!["BBB".into(), "CCC".into()],
        });
        let n = render_table(&Outcome::NoPlan {
            status: SolveStatus::Infeasible,
        });

        assert!(p.starts_with("outcome=PLAN status=Optimal mode=MaximizeDeployment"));
        assert_eq!(u, "outcome=UNRESOLVED_PRICES symbols=BBB,CCC\n");
        assert_eq!(n, "outcome=NO_PLAN status=Infeasible\n");
    }

    #[test]
    fn only_plan_exits_zero() {
        assert_eq!(
            Outcome::NoPlan {
                status: SolveStatus::Unbounded
            }
            .exit_status(),
            EXIT_NO_PLAN
        );
        assert_eq!(
            Outcome::UnresolvedPrices { symbols: vec![] }.exit_status(),
            EXIT_NO_PLAN
        );
    }

    // ── plan body ──

    #[test]
    fn zero_spend_plan_gets_a_note_and_no_bars() {
        let out = render_table(&Outcome::Plan {
            plan: plan(50.0, &[("AAA", 1.0, 75.0)]),
        });
        assert!(out.contains("note=zero_spend"), "{out}");
        assert!(!out.contains("actual allocation:"), "{out}");
        assert!(out.contains("leftover_cash=50.00"), "{out}");
    }

    #[test]
    fn bars_follow_realized_weight() {
        assert_eq!(pie_bar(1.0), "#".repeat(BAR_WIDTH));
        assert_eq!(pie_bar(0.0), ".".repeat(BAR_WIDTH));
        assert_eq!(pie_bar(0.5).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn json_outcome_is_tagged() {
        let v = serde_json::to_value(Outcome::NoPlan {
            status: SolveStatus::Infeasible,
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({"outcome": "NO_PLAN", "status": "Infeasible"}));

        let v = serde_json::to_value(Outcome::Plan {
            plan: plan(100.0, &[("AAA", 1.0, 10.0)]),
        })
        .unwrap();
        assert_eq!(v["outcome"], "PLAN");
        assert_eq!(v["plan"]["entries"][0]["units"], 10);
    }
}
