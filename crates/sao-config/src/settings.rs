//! Typed views over the effective config.
//!
//! ```yaml
//! allocation:
//!   investment: 10000        # > 0; CLI flag may supply it instead
//!   max_units: 30            # optional, >= 1
//!   mode: deviation          # deviation | deployment
//!   deployment_band: 100     # >= 0
//! prices:
//!   source: twelvedata       # static | twelvedata
//!   api_key_env: TWELVEDATA_API_KEY
//!   base_url: https://api.twelvedata.com
//!   cache_ttl_seconds: 3600
//! ```
//!
//! Every key is optional. Wrong types and out-of-range values are errors
//! (`CONFIG_INVALID`), never silently defaulted.

use anyhow::{bail, Result};
use serde_json::Value;

use sao_portfolio::{AllocationMode, DEFAULT_DEPLOYMENT_BAND};

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSettings {
    pub investment: Option<f64>,
    pub max_units: Option<u64>,
    pub mode: AllocationMode,
    pub deployment_band: f64,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            investment: None,
            max_units: None,
            mode: AllocationMode::MinimizeDeviation,
            deployment_band: DEFAULT_DEPLOYMENT_BAND,
        }
    }
}

impl AllocationSettings {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let mut out = Self::default();

        if let Some(v) = read_f64(config, "/allocation/investment")? {
            if v <= 0.0 {
                bail!("CONFIG_INVALID /allocation/investment: must be > 0, got {v}");
            }
            out.investment = Some(v);
        }

        if let Some(v) = config.pointer("/allocation/max_units") {
            match v.as_u64() {
                Some(n) if n >= 1 => out.max_units = Some(n),
                _ => bail!("CONFIG_INVALID /allocation/max_units: expected integer >= 1, got {v}"),
            }
        }

        if let Some(s) = read_str(config, "/allocation/mode")? {
            out.mode = match AllocationMode::parse(&s) {
                Some(m) => m,
                None => bail!(
                    "CONFIG_INVALID /allocation/mode: '{s}'; expected deviation | deployment"
                ),
            };
        }

        if let Some(v) = read_f64(config, "/allocation/deployment_band")? {
            if v < 0.0 {
                bail!("CONFIG_INVALID /allocation/deployment_band: must be >= 0, got {v}");
            }
            out.deployment_band = v;
        }

        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Static,
    TwelveData,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Static => "static",
            PriceSource::TwelveData => "twelvedata",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Some(PriceSource::Static),
            "twelvedata" => Some(PriceSource::TwelveData),
            _ => None,
        }
    }
}

/// `/prices/*`. `base_url` and `cache_ttl_seconds` stay `None` when absent so
/// the resolver crate's defaults apply.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSettings {
    pub source: PriceSource,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub cache_ttl_seconds: Option<i64>,
}

impl PriceSettings {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let source = match read_str(config, "/prices/source")? {
            None => PriceSource::TwelveData,
            Some(s) => match PriceSource::parse(&s) {
                Some(src) => src,
                None => bail!("CONFIG_INVALID /prices/source: '{s}'; expected static | twelvedata"),
            },
        };

        let cache_ttl_seconds = match config.pointer("/prices/cache_ttl_seconds") {
            None => None,
            Some(v) => match v.as_i64() {
                Some(n) if n >= 0 => Some(n),
                _ => bail!(
                    "CONFIG_INVALID /prices/cache_ttl_seconds: expected integer >= 0, got {v}"
                ),
            },
        };

        Ok(Self {
            source,
            api_key_env: read_str(config, "/prices/api_key_env")?,
            base_url: read_str(config, "/prices/base_url")?,
            cache_ttl_seconds,
        })
    }
}

fn read_f64(config: &Value, pointer: &str) -> Result<Option<f64>> {
    match config.pointer(pointer) {
        None => Ok(None),
        Some(v) => match v.as_f64() {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => bail!("CONFIG_INVALID {pointer}: expected a number, got {v}"),
        },
    }
}

/// Blank strings count as absent.
fn read_str(config: &Value, pointer: &str) -> Result<Option<String>> {
    match config.pointer(pointer) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(v) => bail!("CONFIG_INVALID {pointer}: expected a string, got {v}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let a = AllocationSettings::from_config_json(&json!({})).unwrap();
        assert_eq!(a, AllocationSettings::default());
        assert_eq!(a.deployment_band, 100.0);

        let p = PriceSettings::from_config_json(&json!({})).unwrap();
        assert_eq!(p.source, PriceSource::TwelveData);
        assert_eq!(p.api_key_env, None);
    }

    #[test]
    fn integer_investment_is_accepted() {
        let a = AllocationSettings::from_config_json(&json!({"allocation": {"investment": 1000}}))
            .unwrap();
        assert_eq!(a.investment, Some(1000.0));
    }

    #[test]
    fn string_investment_is_rejected() {
        let err =
            AllocationSettings::from_config_json(&json!({"allocation": {"investment": "1000"}}))
                .unwrap_err();
        assert!(err.to_string().contains("CONFIG_INVALID /allocation/investment"));
    }

    #[test]
    fn zero_max_units_is_rejected() {
        assert!(
            AllocationSettings::from_config_json(&json!({"allocation": {"max_units": 0}}))
                .is_err()
        );
    }

    #[test]
    fn blank_strings_are_absent() {
        let p = PriceSettings::from_config_json(&json!({"prices": {"base_url": "  "}})).unwrap();
        assert_eq!(p.base_url, None);
    }

    #[test]
    fn price_source_parse_is_case_insensitive() {
        assert_eq!(PriceSource::parse("TwelveData"), Some(PriceSource::TwelveData));
        assert_eq!(PriceSource::parse(" STATIC "), Some(PriceSource::Static));
        assert_eq!(PriceSource::parse("yahoo"), None);
    }
}
