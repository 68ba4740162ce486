//! On-disk cache in front of a price-history source.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fs;
use std::path::PathBuf;

use crate::core::currency::CurrencyPair;
use crate::core::error::{HedgingError, HedgingResult};
use crate::core::series::PriceSeries;
use crate::data::csv_file::{read_price_csv, write_price_csv};
use crate::data::source::PriceHistorySource;

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding one `<ticker>.csv` per cached series.
    pub cache_dir: PathBuf,
    /// Age after which a cached series is refreshed from upstream.
    pub max_age: Duration,
    /// Whether to use cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data_cache"),
            max_age: Duration::days(1),
            enabled: true,
        }
    }
}

/// Where a series handed out by [`CachedPriceSource`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Fresh,
    Downloaded,
    /// Upstream failed and an expired cache entry was served instead.
    Stale,
}

/// Serves a fresh cached series when available, otherwise asks `upstream`
/// and rewrites the cache. If upstream fails, an expired cache entry is
/// served as last-known-good data.
///
/// The cache always stores the full upstream response for the requested
/// range; the series is filtered to `start..=end` on the way out.
pub struct CachedPriceSource<S> {
    upstream: S,
    config: CacheConfig,
    pair: CurrencyPair,
}

impl<S: PriceHistorySource> CachedPriceSource<S> {
    pub fn new(upstream: S, config: CacheConfig, pair: CurrencyPair) -> HedgingResult<Self> {
        if config.enabled && !config.cache_dir.exists() {
            fs::create_dir_all(&config.cache_dir)?;
        }
        Ok(Self {
            upstream,
            config,
            pair,
        })
    }

    pub fn cache_path(&self, ticker: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{}.csv", ticker))
    }

    /// True if a cache entry exists and is younger than `max_age`.
    pub fn is_fresh(&self, ticker: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        fs::metadata(self.cache_path(ticker))
            .and_then(|m| m.modified())
            .map(|modified| {
                let modified: DateTime<Utc> = modified.into();
                Utc::now() - modified < self.config.max_age
            })
            .unwrap_or(false)
    }

    /// Like [`PriceHistorySource::price_history`] but also reports where the
    /// data came from.
    pub fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<(PriceSeries, CacheOutcome)> {
        if self.is_fresh(ticker) {
            match self.read_cached(ticker, start, end) {
                Some(series) => {
                    log::info!("using cached data for {}", ticker);
                    return Ok((series, CacheOutcome::Fresh));
                }
                None => log::debug!("cache entry for {} is unusable, refreshing", ticker),
            }
        }

        log::info!("downloading fresh data for {}", ticker);
        match self.upstream.price_history(ticker, start, end) {
            Ok(series) => {
                if self.config.enabled {
                    if let Err(e) = write_price_csv(&self.cache_path(ticker), &series) {
                        log::warn!("could not cache {}: {}", ticker, e);
                    }
                }
                Ok((series, CacheOutcome::Downloaded))
            }
            Err(e) => match self.read_cached(ticker, start, end) {
                Some(series) => {
                    log::warn!(
                        "upstream failed for {} ({}); serving stale cache with {} prices",
                        ticker,
                        e,
                        series.len()
                    );
                    Ok((series, CacheOutcome::Stale))
                }
                None => Err(e),
            },
        }
    }

    fn read_cached(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Option<PriceSeries> {
        if !self.config.enabled {
            return None;
        }
        let path = self.cache_path(ticker);
        if !path.exists() {
            return None;
        }
        match read_price_csv(&path, &self.pair) {
            Ok(series) => {
                let series = series.between(start, end);
                (!series.is_empty()).then_some(series)
            }
            Err(e) => {
                log::warn!("ignoring unreadable cache '{}': {}", path.display(), e);
                None
            }
        }
    }

    /// Remove the cache entry for `ticker`, if any.
    pub fn clear(&self, ticker: &str) -> HedgingResult<()> {
        let path = self.cache_path(ticker);
        if path.exists() {
            fs::remove_file(&path).map_err(HedgingError::from)?;
        }
        Ok(())
    }
}

impl<S: PriceHistorySource> PriceHistorySource for CachedPriceSource<S> {
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<PriceSeries> {
        self.fetch(ticker, start, end).map(|(series, _)| series)
    }
}
