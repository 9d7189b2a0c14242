//! Time-bounded reuse of resolved prices.
//!
//! Wraps any [`PriceResolver`]. Only usable prices are cached; unresolved
//! symbols are asked for again on every call. The mutex is never held across
//! an `.await`.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use sao_portfolio::{PriceMap, ResolvedPrice};

use crate::resolver::{PriceResolver, ResolverError};

/// Default reuse window: one hour.
pub const DEFAULT_PRICE_TTL_SECS: i64 = 3_600;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct CachedPriceResolver<R> {
    inner: R,
    ttl: Duration,
    clock: Clock,
    entries: Mutex<HashMap<String, (f64, DateTime<Utc>)>>,
}

impl<R: PriceResolver> CachedPriceResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            clock: Arc::new(Utc::now),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of cached entries, fresh or stale.
    pub fn cached_len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }
}

#[async_trait::async_trait]
impl<R: PriceResolver> PriceResolver for CachedPriceResolver<R> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn resolve(&self, symbols: &BTreeSet<String>) -> Result<PriceMap, ResolverError> {
        let now = (self.clock)();
        let mut out = PriceMap::new();
        let mut misses: BTreeSet<String> = BTreeSet::new();

        {
            let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
            for s in symbols {
                match entries.get(s) {
                    Some((price, at)) if now - *at < self.ttl => {
                        out.insert(s.clone(), ResolvedPrice::Price(*price));
                    }
                    _ => {
                        misses.insert(s.clone());
                    }
                }
            }
        }

        tracing::debug!(
            resolver = self.inner.name(),
            hits = out.len(),
            misses = misses.len(),
            "price cache lookup"
        );

        if misses.is_empty() {
            return Ok(out);
        }

        let fetched = self.inner.resolve(&misses).await?;

        {
            let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
            for (s, r) in &fetched {
                if let Some(p) = r.usable() {
                    entries.insert(s.clone(), (p, now));
                }
            }
        }

        out.extend(fetched);
        Ok(out)
    }
}
