//! Price data structures.

/// One consistent read of the quote provider.
///
/// All three prices come from the same response. A snapshot is replaced as a
/// whole; fields are never updated individually.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    /// Base asset price in USD (ERG/USD).
    pub base_usd: f64,
    /// Quote asset price in USD (ETH/USD).
    pub quote_usd: f64,
    /// Base asset price expressed in the quote asset (ERG/ETH).
    pub base_in_quote: f64,
}

impl PriceSnapshot {
    pub fn new(base_usd: f64, quote_usd: f64, base_in_quote: f64) -> Self {
        Self {
            base_usd,
            quote_usd,
            base_in_quote,
        }
    }

    /// Units of base asset one quote asset buys (ETH/ERG).
    pub fn cross_rate(&self) -> f64 {
        cross_rate(self.base_in_quote)
    }
}

/// Reciprocal of a directly reported ratio. A zero ratio yields 0.
pub fn cross_rate(ratio: f64) -> f64 {
    if ratio == 0.0 {
        0.0
    } else {
        1.0 / ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_rate_reciprocal() {
        let snapshot = PriceSnapshot::new(1.0, 4000.0, 0.00025);
        assert!((snapshot.cross_rate() - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_rate_zero_divisor() {
        assert_eq!(cross_rate(0.0), 0.0);
        assert_eq!(PriceSnapshot::new(1.0, 1.0, 0.0).cross_rate(), 0.0);
    }
}
