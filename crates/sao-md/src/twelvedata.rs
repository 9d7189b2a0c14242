//! TwelveData-backed latest-price resolver.
//!
//! One `GET {base}/price?symbol=S&apikey=K` per symbol, in symbol order.
//!
//! | Upstream outcome                          | Result                         |
//! |-------------------------------------------|--------------------------------|
//! | `{"price": "187.42"}` (finite, > 0)       | `Price(187.42)`                |
//! | unknown symbol / no data / bad price      | `Unresolved { reason }`        |
//! | auth failure (401/403) or rate limit (429) | `Err(ResolverError::Api)`     |
//! | connection / timeout                      | `Err(ResolverError::Transport)` |

use std::collections::BTreeSet;

use serde::Deserialize;

use sao_portfolio::{PriceMap, ResolvedPrice};

use crate::resolver::{complete_resolution, PriceResolver, ResolverError};

pub const DEFAULT_TWELVEDATA_BASE_URL: &str = "https://api.twelvedata.com";

/// API key is read by the caller (CLI) and passed in; do not log it.
#[derive(Clone)]
pub struct TwelveDataPriceResolver {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for TwelveDataPriceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwelveDataPriceResolver")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TwelveDataPriceResolver {
    pub fn new(api_key: String) -> Result<Self, ResolverError> {
        Self::new_with_base_url(api_key, DEFAULT_TWELVEDATA_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, ResolverError> {
        if api_key.trim().is_empty() {
            return Err(ResolverError::Config(
                "twelvedata api key is empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn build_price_url(&self) -> String {
        format!("{}/price", self.base_url.trim_end_matches('/'))
    }

    async fn resolve_one(&self, symbol: &str) -> Result<ResolvedPrice, ResolverError> {
        let resp = self
            .http
            .get(self.build_price_url())
            .query(&[("symbol", symbol), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ResolverError::Transport(format!("twelvedata request failed: {e}")))?;

        let status = resp.status();
        let body: Option<TwelveDataPriceResponse> = resp.json().await.ok();

        let call_level = matches!(status.as_u16(), 401 | 403 | 429)
            || body
                .as_ref()
                .and_then(|b| b.code)
                .map_or(false, |c| matches!(c, 401 | 403 | 429));
        if call_level {
            return Err(ResolverError::Api {
                code: body
                    .as_ref()
                    .and_then(|b| b.code)
                    .or(Some(i64::from(status.as_u16()))),
                message: body
                    .as_ref()
                    .map(|b| b.status_message())
                    .unwrap_or_else(|| status.to_string()),
            });
        }

        let body = match body {
            Some(b) => b,
            None => {
                return Ok(ResolvedPrice::unresolved(format!(
                    "undecodable twelvedata response (http {})",
                    status.as_u16()
                )))
            }
        };

        if !status.is_success() {
            return Ok(ResolvedPrice::unresolved(format!(
                "http {}: {}",
                status.as_u16(),
                body.status_message()
            )));
        }
        if let Some(err) = body.error_message() {
            return Ok(ResolvedPrice::unresolved(err));
        }

        let raw = body.price.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(ResolvedPrice::unresolved("no price in response"));
        }
        match raw.parse::<f64>() {
            Ok(p) if p.is_finite() && p > 0.0 => Ok(ResolvedPrice::Price(p)),
            _ => Ok(ResolvedPrice::unresolved(format!("unusable price '{raw}'"))),
        }
    }
}

#[async_trait::async_trait]
impl PriceResolver for TwelveDataPriceResolver {
    fn name(&self) -> &'static str {
        "twelvedata"
    }

    async fn resolve(&self, symbols: &BTreeSet<String>) -> Result<PriceMap, ResolverError> {
        let mut out = PriceMap::new();
        for sym in symbols {
            let resolved = self.resolve_one(sym).await?;
            match &resolved {
                ResolvedPrice::Price(p) => {
                    tracing::debug!(symbol = %sym, price = p, "twelvedata price")
                }
                ResolvedPrice::Unresolved { reason } => {
                    tracing::warn!(symbol = %sym, reason = %reason, "twelvedata price unresolved")
                }
            }
            out.insert(sym.clone(), resolved);
        }
        Ok(complete_resolution(self.name(), symbols, out))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TwelveDataPriceResponse {
    price: Option<String>,
    status: Option<String>,
    message: Option<String>,
    code: Option<i64>,
}

impl TwelveDataPriceResponse {
    fn error_message(&self) -> Option<String> {
        // TwelveData signals errors with "status":"error" plus code/message.
        match self.status.as_deref() {
            Some("error") => Some(self.status_message()),
            _ => None,
        }
    }

    fn status_message(&self) -> String {
        match (&self.code, &self.message) {
            (Some(c), Some(m)) => format!("code={} {}", c, m),
            (_, Some(m)) => m.clone(),
            _ => "unknown".to_string(),
        }
    }
}
