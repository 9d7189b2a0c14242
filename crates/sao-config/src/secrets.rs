//! Price-provider secret resolution.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (`prices.api_key_env`).
//! - The CLI calls [`resolve_price_secrets`] once and passes the result into
//!   resolver constructors; nothing else reads the environment for keys.
//! - `Debug` redacts values. Error messages name the variable, never the value.
//!
//! | Price source | TwelveData key |
//! |--------------|----------------|
//! | twelvedata   | required       |
//! | static       | optional       |

use anyhow::{bail, Result};

use crate::settings::{PriceSettings, PriceSource};

pub const DEFAULT_TWELVEDATA_KEY_ENV: &str = "TWELVEDATA_API_KEY";

#[derive(Clone)]
pub struct PriceSecrets {
    /// Name of the env var the key was read from.
    pub twelvedata_api_key_var: String,
    /// `None` if the named env var was absent or blank.
    pub twelvedata_api_key: Option<String>,
}

impl std::fmt::Debug for PriceSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceSecrets")
            .field("twelvedata_api_key_var", &self.twelvedata_api_key_var)
            .field(
                "twelvedata_api_key",
                &self.twelvedata_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve provider keys for the effective price source. The key's env var
/// name comes from `prices.api_key_env`, falling back to
/// [`DEFAULT_TWELVEDATA_KEY_ENV`].
///
/// # Errors
/// `SECRETS_MISSING` naming the env var when the source needs a key that is
/// not set.
pub fn resolve_price_secrets(prices: &PriceSettings, source: PriceSource) -> Result<PriceSecrets> {
    let var = prices
        .api_key_env
        .clone()
        .unwrap_or_else(|| DEFAULT_TWELVEDATA_KEY_ENV.to_string());
    let key = resolve_env(&var);

    if source == PriceSource::TwelveData && key.is_none() {
        bail!(
            "SECRETS_MISSING prices=twelvedata: required env var '{}' \
             (TwelveData api_key) is not set or empty",
            var,
        );
    }

    Ok(PriceSecrets {
        twelvedata_api_key_var: var,
        twelvedata_api_key: key,
    })
}
