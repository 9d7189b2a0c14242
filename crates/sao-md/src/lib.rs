//! sao-md
//!
//! Current-price resolution for allocation requests.
//!
//! - [`PriceResolver`] trait: one entry per requested symbol, price or
//!   `Unresolved { reason }`
//! - [`StaticPriceResolver`]: fixed table (CSV file, tests)
//! - [`TwelveDataPriceResolver`]: latest price over HTTP
//! - [`CachedPriceResolver`]: TTL reuse in front of any resolver

pub mod cache;
pub mod resolver;
pub mod twelvedata;

pub use cache::{CachedPriceResolver, Clock, DEFAULT_PRICE_TTL_SECS};
pub use resolver::{
    complete_resolution, unresolved_symbols, PriceResolver, ResolverError, StaticPriceResolver,
};
pub use twelvedata::{TwelveDataPriceResolver, DEFAULT_TWELVEDATA_BASE_URL};
