//! Scenario: typed settings come out of layered YAML
//!
//! # Invariants under test
//!
//! 1. Overlays change only what they name.
//! 2. `mode` accepts the short spellings.
//! 3. Out-of-range values fail with CONFIG_INVALID naming the pointer.

use sao_config::{load_layered_yaml_from_strings, AllocationSettings, PriceSettings, PriceSource};
use sao_portfolio::AllocationMode;

const BASE: &str = include_str!("../../../config/defaults/base.yaml");

#[test]
fn shipped_defaults_load() {
    let loaded = load_layered_yaml_from_strings(&[BASE]).unwrap();
    let a = AllocationSettings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(a.mode, AllocationMode::MinimizeDeviation);
    assert_eq!(a.deployment_band, 100.0);
    assert_eq!(a.max_units, Some(30));
    assert_eq!(a.investment, None);

    let p = PriceSettings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(p.source, PriceSource::TwelveData);
    assert_eq!(p.cache_ttl_seconds, Some(3600));
}

#[test]
fn overlay_switches_mode_and_keeps_cap() {
    let overlay = "allocation:\n  mode: Deployment\n  investment: 1500.5\n";
    let loaded = load_layered_yaml_from_strings(&[BASE, overlay]).unwrap();
    let a = AllocationSettings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(a.mode, AllocationMode::MaximizeDeployment);
    assert_eq!(a.investment, Some(1500.5));
    assert_eq!(a.max_units, Some(30));
}

#[test]
fn out_of_range_values_fail() {
    for (yaml, pointer) in [
        ("allocation:\n  investment: 0\n", "/allocation/investment"),
        ("allocation:\n  investment: -5\n", "/allocation/investment"),
        ("allocation:\n  max_units: -1\n", "/allocation/max_units"),
        ("allocation:\n  deployment_band: -0.5\n", "/allocation/deployment_band"),
        ("allocation:\n  mode: balanced\n", "/allocation/mode"),
    ] {
        let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
        let msg = AllocationSettings::from_config_json(&loaded.config_json)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("CONFIG_INVALID"), "{yaml}: {msg}");
        assert!(msg.contains(pointer), "{yaml}: {msg}");
    }
}

#[test]
fn bad_price_settings_fail() {
    for yaml in [
        "prices:\n  source: yahoo\n",
        "prices:\n  cache_ttl_seconds: -1\n",
        "prices:\n  base_url: 42\n",
    ] {
        let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
        assert!(PriceSettings::from_config_json(&loaded.config_json).is_err(), "{yaml}");
    }
}
