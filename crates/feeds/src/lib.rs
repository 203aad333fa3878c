//! Price collection from the public quote provider.
//!
//! - `rest` - CoinGecko `simple/price` client behind the `QuoteProvider` trait
//! - `source` - `PriceSource`: retries, last-known snapshot cache, stale fallback

pub mod error;
pub mod rest;
pub mod source;

pub use error::*;
pub use rest::*;
pub use source::*;
