//! Scenario: `sao` reads layered YAML the same way the library does
//!
//! # Invariants under test
//!
//! 1. `config-hash` prints the hash and canonical JSON.
//! 2. `allocate` takes investment and mode from config when flags are absent.
//! 3. `--strict-config` fails on unused keys.
//! 4. TwelveData without its key fails before any request, naming the env var.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn scratch(name: &str, body: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("sao-cli-config");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn sao() -> Command {
    let mut cmd = Command::cargo_bin("sao").unwrap();
    cmd.current_dir(env!("CARGO_TARGET_TMPDIR"))
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn config_hash_prints_hash_and_json() {
    let base = scratch("hash_base.yaml", "allocation:\n  investment: 100\n");
    let over = scratch("hash_over.yaml", "allocation:\n  investment: 200\n");

    sao()
        .arg("config-hash")
        .arg(&base)
        .arg(&over)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^config_hash=[0-9a-f]{64}\n").unwrap())
        .stdout(predicate::str::contains(r#"{"allocation":{"investment":200}}"#));
}

#[test]
fn allocation_settings_come_from_config() {
    let cfg = scratch(
        "settings.yaml",
        "allocation:\n  investment: 29\n  mode: deployment\nprices:\n  source: static\n",
    );
    let prices = scratch("settings_prices.csv", "symbol,price\nAAA,7\nBBB,11\n");

    sao()
        .args(["allocate", "--target", "AAA=1,BBB=1"])
        .arg("--config")
        .arg(&cfg)
        .arg("--prices")
        .arg(&prices)
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=MaximizeDeployment"))
        .stdout(predicate::str::contains("total_invested=29.00"));
}

#[test]
fn strict_config_rejects_unused_keys() {
    let cfg = scratch("unused.yaml", "allocation:\n  investment: 100\nchart:\n  kind: pie\n");
    let prices = scratch("unused_prices.csv", "symbol,price\nAAA,10\n");

    sao()
        .args(["allocate", "--target", "AAA=1", "--strict-config"])
        .arg("--config")
        .arg(&cfg)
        .arg("--prices")
        .arg(&prices)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"))
        .stderr(predicate::str::contains("/chart/kind"));
}

#[test]
fn twelvedata_without_key_names_the_env_var() {
    let cfg = scratch(
        "td.yaml",
        "allocation:\n  investment: 100\nprices:\n  source: twelvedata\n  api_key_env: SAO_SENTINEL_CLI_TD_KEY\n",
    );

    sao()
        .args(["allocate", "--target", "AAA=1"])
        .arg("--config")
        .arg(&cfg)
        .env_remove("SAO_SENTINEL_CLI_TD_KEY")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SECRETS_MISSING"))
        .stderr(predicate::str::contains("SAO_SENTINEL_CLI_TD_KEY"));
}
