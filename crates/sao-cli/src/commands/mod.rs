//! Command handler modules for the `sao` CLI.
//!
//! Shared input helpers live here; command logic lives in the submodules.

pub mod allocate;
pub mod report;

use anyhow::{bail, Context, Result};
use std::fs;

use sao_portfolio::{parse_manual_targets, parse_targets_csv, RawTarget};

/// Read a text file, tolerating a UTF-8 BOM.
pub fn read_text(path: &str, what: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {what} failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    String::from_utf8(bytes.to_vec()).with_context(|| format!("{what} must be UTF-8 text: {path}"))
}

/// Exactly one of `--targets <csv>` or `--target SYM=W[:CAP]` (repeatable).
pub fn load_targets(csv_path: Option<&str>, manual: &[String]) -> Result<Vec<RawTarget>> {
    match (csv_path, manual.is_empty()) {
        (Some(path), true) => {
            let raw = read_text(path, "targets csv")?;
            parse_targets_csv(&raw).with_context(|| format!("invalid targets csv: {path}"))
        }
        (None, false) => {
            let mut out = Vec::new();
            for entry in manual {
                out.extend(
                    parse_manual_targets(entry)
                        .with_context(|| format!("invalid --target '{entry}'"))?,
                );
            }
            Ok(out)
        }
        (Some(_), false) => bail!("use either --targets or --target, not both"),
        (None, true) => bail!("no targets: pass --targets <csv> or --target SYM=WEIGHT[:MAX_UNITS]"),
    }
}
