//! Price source with retries and last-known fallback.

use crate::error::FeedError;
use crate::rest::QuoteProvider;
use ratewatch_core::{AssetPair, PriceSnapshot, RetryPolicy};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, warn};

/// Whether a reading came from the provider just now or from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Result of a successful `PriceSource::fetch`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceReading {
    pub snapshot: PriceSnapshot,
    pub freshness: Freshness,
}

impl PriceReading {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

/// Fetches the watched pair and remembers the last good snapshot.
///
/// The cache holds a whole `PriceSnapshot` behind one lock, so concurrent
/// readers see either the previous snapshot or the new one, never a mix.
pub struct PriceSource {
    provider: Arc<dyn QuoteProvider>,
    pair: AssetPair,
    retry: RetryPolicy,
    last_known: RwLock<Option<PriceSnapshot>>,
}

impl PriceSource {
    pub fn new(provider: Arc<dyn QuoteProvider>, pair: AssetPair, retry: RetryPolicy) -> Self {
        Self {
            provider,
            pair,
            retry,
            last_known: RwLock::new(None),
        }
    }

    pub fn pair(&self) -> &AssetPair {
        &self.pair
    }

    /// Last snapshot successfully fetched, if any.
    pub fn last_known(&self) -> Option<PriceSnapshot> {
        *self.last_known.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch fresh prices, retrying transient failures per policy.
    ///
    /// After the final failed attempt the cached snapshot is returned as
    /// `Freshness::Stale`; with nothing cached the result is
    /// `FeedError::Unavailable`.
    pub async fn fetch(&self) -> Result<PriceReading, FeedError> {
        let provider = &self.provider;
        let pair = &self.pair;
        let result = self
            .retry
            .run_while(
                "fetch_quotes",
                move || provider.fetch_quotes(pair),
                FeedError::is_transient,
            )
            .await;

        match result {
            Ok(snapshot) => {
                *self.last_known.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
                Ok(PriceReading {
                    snapshot,
                    freshness: Freshness::Fresh,
                })
            }
            Err(e) => match self.last_known() {
                Some(snapshot) => {
                    warn!(error = %e, "Max retries reached, using last known prices");
                    Ok(PriceReading {
                        snapshot,
                        freshness: Freshness::Stale,
                    })
                }
                None => {
                    error!(error = %e, "Max retries reached and no prices cached");
                    Err(match e {
                        FeedError::Unavailable(_) => e,
                        other => FeedError::Unavailable(other.to_string()),
                    })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider that replays a scripted sequence of responses.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<PriceSnapshot, FeedError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<PriceSnapshot, FeedError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl QuoteProvider for ScriptedProvider {
        async fn fetch_quotes(&self, _pair: &AssetPair) -> Result<PriceSnapshot, FeedError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FeedError::ConnectionFailed("script exhausted".into())))
        }
    }

    fn source(provider: Arc<ScriptedProvider>) -> PriceSource {
        PriceSource::new(
            provider,
            AssetPair::erg_eth(),
            RetryPolicy::new(3, Duration::from_secs(30)),
        )
    }

    fn timeout() -> Result<PriceSnapshot, FeedError> {
        Err(FeedError::Timeout("10s".into()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_fetch_updates_cache() {
        let snapshot = PriceSnapshot::new(1.0, 4000.0, 0.00025);
        let provider = ScriptedProvider::new(vec![Ok(snapshot)]);
        let source = source(provider.clone());

        let reading = source.fetch().await.unwrap();
        assert_eq!(reading.snapshot, snapshot);
        assert_eq!(reading.freshness, Freshness::Fresh);
        assert_eq!(source.last_known(), Some(snapshot));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_retries() {
        let snapshot = PriceSnapshot::new(1.2, 3500.0, 0.0003);
        let provider =
            ScriptedProvider::new(vec![timeout(), Err(FeedError::HttpStatus(502)), Ok(snapshot)]);
        let source = source(provider.clone());

        let reading = source.fetch().await.unwrap();
        assert!(!reading.is_stale());
        assert_eq!(reading.snapshot, snapshot);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_without_cache() {
        let provider = ScriptedProvider::new(vec![timeout(), timeout(), timeout()]);
        let source = source(provider.clone());

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Unavailable(_)));
        assert_eq!(source.last_known(), None);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fallback_returns_prior_snapshot_unchanged() {
        let first = PriceSnapshot::new(1.0, 4000.0, 0.00025);
        let provider = ScriptedProvider::new(vec![
            Ok(first),
            timeout(),
            Err(FeedError::ParseError("missing ergo.eth".into())),
            timeout(),
        ]);
        let source = source(provider.clone());

        source.fetch().await.unwrap();
        let reading = source.fetch().await.unwrap();

        assert_eq!(reading.freshness, Freshness::Stale);
        assert_eq!(reading.snapshot, first);
        assert_eq!(source.last_known(), Some(first));
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(FeedError::Unavailable(
            "pair delisted".into(),
        ))]);
        let source = source(provider.clone());

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Unavailable(ref msg) if msg == "pair delisted"));
        assert_eq!(provider.calls(), 1);
    }
}
