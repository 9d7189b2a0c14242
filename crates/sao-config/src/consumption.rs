//! Unused-key guard.
//!
//! "Consumed pointers" are JSON Pointer prefixes the CLI actually reads. A
//! leaf under any consumed prefix is consumed; every other leaf is reported
//! as unused. Callers pick whether that is a warning or an error.
//!
//! The registry depends on the price source: TwelveData settings are only
//! read when prices come from TwelveData.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::settings::PriceSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub price_source: String,
    /// Sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

const ALLOCATION_POINTERS: &[&str] = &[
    "/allocation/investment",
    "/allocation/max_units",
    "/allocation/mode",
    "/allocation/deployment_band",
    "/prices/source",
];

const TWELVEDATA_POINTERS: &[&str] = &[
    "/prices/api_key_env",
    "/prices/base_url",
    "/prices/cache_ttl_seconds",
];

/// Pointers read by `sao allocate` for the given price source.
pub fn consumed_pointers(source: PriceSource) -> Vec<&'static str> {
    let mut out = ALLOCATION_POINTERS.to_vec();
    if source == PriceSource::TwelveData {
        out.extend_from_slice(TWELVEDATA_POINTERS);
    }
    out
}

/// `Warn` always returns the report; `Fail` errors when anything is unused.
pub fn report_unused_keys(
    source: PriceSource,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers(source)
        .into_iter()
        .map(normalize_pointer)
        .collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        price_source: source.as_str().to_string(),
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (prices={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {}",
            report.price_source,
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but not "/a/bc"; "/" consumes all.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map_or(false, |rest| rest.starts_with('/'))
}

pub(crate) fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_respects_segment_boundary() {
        assert!(is_prefix_pointer("/prices", "/prices/source"));
        assert!(is_prefix_pointer("/prices/source", "/prices/source"));
        assert!(!is_prefix_pointer("/prices", "/prices_old/source"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let mut out = Vec::new();
        collect_leaf_pointers(&serde_json::json!({"a/b": {"c~d": 1}}), "", &mut out);
        assert_eq!(out, vec!["/a~1b/c~0d".to_string()]);
    }

    #[test]
    fn normalize_adds_leading_and_strips_trailing_slash() {
        assert_eq!(normalize_pointer("allocation/mode/"), "/allocation/mode");
        assert_eq!(normalize_pointer(""), "/");
    }

    #[test]
    fn twelvedata_registry_is_a_superset() {
        let s = consumed_pointers(PriceSource::Static);
        let t = consumed_pointers(PriceSource::TwelveData);
        assert!(s.iter().all(|p| t.contains(p)));
        assert!(t.contains(&"/prices/api_key_env"));
        assert!(!s.contains(&"/prices/api_key_env"));
    }
}
