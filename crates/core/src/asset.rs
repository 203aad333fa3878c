//! Asset identifiers used when querying the quote provider.

/// The two assets being watched and how the quote provider names them.
///
/// `base` is priced in `quote` (ERG in ETH); the cross-rate shown to the
/// user is the reciprocal, i.e. how many `base` units one `quote` buys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    /// Provider id of the base asset (e.g. "ergo").
    pub base_id: String,
    /// Provider id of the quote asset (e.g. "ethereum").
    pub quote_id: String,
    /// Ticker of the base asset for display.
    pub base_symbol: String,
    /// Ticker of the quote asset for display.
    pub quote_symbol: String,
    /// Fiat currency both assets are priced in.
    pub fiat: String,
    /// Currency code the provider uses for the quote asset (e.g. "eth").
    pub quote_currency: String,
}

impl AssetPair {
    pub fn new(
        base_id: impl Into<String>,
        quote_id: impl Into<String>,
        base_symbol: impl Into<String>,
        quote_symbol: impl Into<String>,
    ) -> Self {
        let quote_symbol = quote_symbol.into();
        Self {
            base_id: base_id.into(),
            quote_id: quote_id.into(),
            base_symbol: base_symbol.into(),
            quote_currency: quote_symbol.to_lowercase(),
            quote_symbol,
            fiat: "usd".to_string(),
        }
    }

    /// ERG priced against ETH.
    pub fn erg_eth() -> Self {
        Self::new("ergo", "ethereum", "ERG", "ETH")
    }

    /// Label of the derived cross-rate, e.g. "ETH/ERG".
    pub fn cross_label(&self) -> String {
        format!("{}/{}", self.quote_symbol, self.base_symbol)
    }

    /// Comma separated provider ids, in request order.
    pub fn ids_param(&self) -> String {
        format!("{},{}", self.base_id, self.quote_id)
    }

    /// Comma separated vs currencies, in request order.
    pub fn vs_currencies_param(&self) -> String {
        format!("{},{}", self.fiat, self.quote_currency)
    }
}

impl Default for AssetPair {
    fn default() -> Self {
        Self::erg_eth()
    }
}
