//! Target-allocation input parsing (CSV upload and manual entry).
//!
//! Both shapes collapse to `Vec<RawTarget>` before reaching the request
//! builder. Parsing is pure; file reads belong to the caller.
//!
//! ## CSV column contract (case-insensitive, order-independent)
//!
//! | Column              | Type / example | Notes                           |
//! |---------------------|----------------|---------------------------------|
//! | `symbol`            | `VTI`          | required                        |
//! | `target_allocation` | `0.25`         | required, any non-negative scale |
//! | `max_units`         | `30`           | optional per-instrument cap     |
//!
//! Fields may be RFC 4180 quoted (`"VTI","0.6"`); surrounding whitespace is
//! trimmed.
//!
//! ## Manual form
//!
//! `VTI=0.6,BND=0.4:20` — comma-separated `SYMBOL=WEIGHT[:MAX_UNITS]`.

use std::collections::HashMap;
use std::fmt;

use crate::types::RawTarget;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while parsing target input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// The header row is missing a required column.
    MissingHeader(String),
    /// A record field could not be parsed into the expected type.
    ParseField {
        row: usize,
        field: &'static str,
        raw: String,
    },
    /// A manual entry did not match `SYMBOL=WEIGHT[:MAX_UNITS]`.
    MalformedEntry(String),
    /// No data rows / entries at all.
    Empty,
    /// The CSV reader rejected the input (e.g. an unterminated quote).
    Csv(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingHeader(col) => {
                write!(f, "csv missing required header column: '{col}'")
            }
            InputError::ParseField { row, field, raw } => {
                write!(
                    f,
                    "csv row {row}: cannot parse field '{field}' from value '{raw}'"
                )
            }
            InputError::MalformedEntry(raw) => {
                write!(f, "expected SYMBOL=WEIGHT[:MAX_UNITS], got '{raw}'")
            }
            InputError::Empty => write!(f, "no target rows supplied"),
            InputError::Csv(msg) => write!(f, "csv read error: {msg}"),
        }
    }
}

impl std::error::Error for InputError {}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse an uploaded target table.
///
/// Blank lines are skipped. A bad number is a hard error; rows are never
/// dropped. Row numbers are 1-based source lines.
pub fn parse_targets_csv(src: &str) -> Result<Vec<RawTarget>, InputError> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(src.as_bytes());

    let mut col_idx: Option<HashMap<String, usize>> = None;
    let mut out = Vec::new();

    for rec in rdr.records() {
        let rec = rec.map_err(|e| InputError::Csv(e.to_string()))?;
        if rec.iter().all(str::is_empty) {
            continue;
        }
        let idx = match &col_idx {
            Some(idx) => idx,
            None => {
                col_idx = Some(build_col_index(&rec)?);
                continue;
            }
        };
        let row_num = rec.position().map_or(0, |p| p.line() as usize);

        let get = |name: &'static str| -> Option<&str> {
            idx.get(name)
                .and_then(|&i| rec.get(i))
                .filter(|s| !s.is_empty())
        };

        let symbol = get("symbol")
            .ok_or_else(|| InputError::ParseField {
                row: row_num,
                field: "symbol",
                raw: String::new(),
            })?
            .to_string();

        let weight_raw = get("target_allocation").unwrap_or("");
        let weight: f64 = weight_raw.parse().map_err(|_| InputError::ParseField {
            row: row_num,
            field: "target_allocation",
            raw: weight_raw.to_string(),
        })?;

        let max_units = match get("max_units") {
            None => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| InputError::ParseField {
                row: row_num,
                field: "max_units",
                raw: raw.to_string(),
            })?),
        };

        out.push(RawTarget {
            symbol,
            weight,
            max_units,
        });
    }

    if out.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(out)
}

/// Parse a single manual entry `SYMBOL=WEIGHT[:MAX_UNITS]`.
pub fn parse_manual_target(entry: &str) -> Result<RawTarget, InputError> {
    let malformed = || InputError::MalformedEntry(entry.trim().to_string());

    let (symbol, rest) = entry.split_once('=').ok_or_else(malformed)?;
    let (weight_s, cap_s) = match rest.split_once(':') {
        Some((w, c)) => (w, Some(c)),
        None => (rest, None),
    };

    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(malformed());
    }
    let weight: f64 = weight_s.trim().parse().map_err(|_| malformed())?;
    let max_units = match cap_s {
        Some(c) => Some(c.trim().parse::<u64>().map_err(|_| malformed())?),
        None => None,
    };

    Ok(RawTarget {
        symbol: symbol.to_string(),
        weight,
        max_units,
    })
}

/// Parse a comma-separated list of manual entries.
pub fn parse_manual_targets(src: &str) -> Result<Vec<RawTarget>, InputError> {
    let out = src
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_manual_target)
        .collect::<Result<Vec<_>, _>>()?;
    if out.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a case-insensitive column-name → index map from a CSV header record.
fn build_col_index(header: &csv::StringRecord) -> Result<HashMap<String, usize>, InputError> {
    let required = ["symbol", "target_allocation"];

    let mut idx: HashMap<String, usize> = HashMap::new();
    for (i, col) in header.iter().enumerate() {
        idx.insert(col.to_ascii_lowercase(), i);
    }

    for req in required {
        if !idx.contains_key(req) {
            return Err(InputError::MissingHeader(req.to_string()));
        }
    }

    Ok(idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
