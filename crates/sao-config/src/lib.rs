//! sao-config
//!
//! Layered YAML configuration for the allocator CLI.
//!
//! - Docs merge in order (later overrides earlier) into one JSON tree
//! - Canonical JSON + SHA-256 hash identifies the effective config
//! - Literal secrets are rejected at load (`CONFIG_SECRET_DETECTED`)
//! - [`consumption`]: unused-key report against what the CLI reads
//! - [`settings`]: typed `/allocation` and `/prices` extraction
//! - [`secrets`]: API keys resolved from env var NAMES

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

pub mod consumption;
pub mod secrets;
pub mod settings;

pub use consumption::{consumed_pointers, report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
pub use secrets::{resolve_price_secrets, PriceSecrets, DEFAULT_TWELVEDATA_KEY_ENV};
pub use settings::{AllocationSettings, PriceSettings, PriceSource};

/// Secret-looking prefixes. A leaf string starting with one of these aborts
/// the load.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Config used when no YAML paths are given: `{}`, all defaults apply.
    pub fn empty() -> Result<Self> {
        load_layered_yaml_from_strings(&[])
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses to null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json::Map is key-sorted, so serialization order is independent of
    // YAML key order.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    consumption::collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_override_scalars_and_keep_siblings() {
        let merged = deep_merge(
            serde_json::json!({"allocation": {"investment": 1000, "mode": "deviation"}}),
            serde_json::json!({"allocation": {"investment": 2500}}),
        );
        assert_eq!(merged["allocation"]["investment"], 2500);
        assert_eq!(merged["allocation"]["mode"], "deviation");
    }

    #[test]
    fn short_strings_are_never_secrets() {
        assert!(!looks_like_secret("sk-1"));
        assert!(looks_like_secret("sk-live-abcdef"));
        assert!(!looks_like_secret("TWELVEDATA_API_KEY"));
    }

    #[test]
    fn empty_config_hashes_to_empty_object() {
        let loaded = LoadedConfig::empty().unwrap();
        assert_eq!(loaded.canonical_json, "{}");
        assert_eq!(loaded.config_hash.len(), 64);
    }

    #[test]
    fn blank_yaml_layer_is_ignored() {
        let a = load_layered_yaml_from_strings(&["allocation:\n  investment: 10\n"]).unwrap();
        let b = load_layered_yaml_from_strings(&["allocation:\n  investment: 10\n", ""]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
    }
}
