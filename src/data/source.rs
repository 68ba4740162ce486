use chrono::NaiveDate;

use crate::core::error::{HedgingError, HedgingResult};
use crate::core::quote::ForwardRateQuote;
use crate::core::series::PriceSeries;

/// Supplies historical closing prices.
///
/// Implementations return a chronologically sorted, de-duplicated series
/// restricted to `start..=end`. Days without a price are simply absent.
pub trait PriceHistorySource: Send + Sync {
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<PriceSeries>;
}

/// Supplies the forward quote for a maturity.
pub trait ForwardQuoteSource: Send + Sync {
    fn forward_quote(&self, maturity_months: f64) -> HedgingResult<ForwardRateQuote>;
}

impl<T: PriceHistorySource + ?Sized> PriceHistorySource for Box<T> {
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<PriceSeries> {
        (**self).price_history(ticker, start, end)
    }
}

impl<T: ForwardQuoteSource + ?Sized> ForwardQuoteSource for Box<T> {
    fn forward_quote(&self, maturity_months: f64) -> HedgingResult<ForwardRateQuote> {
        (**self).forward_quote(maturity_months)
    }
}

/// Serves one in-memory series for any ticker.
#[derive(Debug, Clone)]
pub struct StaticPriceSource {
    series: PriceSeries,
}

impl StaticPriceSource {
    pub fn new(series: PriceSeries) -> Self {
        Self { series }
    }
}

impl PriceHistorySource for StaticPriceSource {
    fn price_history(
        &self,
        _ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<PriceSeries> {
        let series = self.series.between(start, end);
        if series.is_empty() {
            return Err(HedgingError::data_source(format!(
                "no prices between {} and {}",
                start, end
            )));
        }
        Ok(series)
    }
}

/// Prices forwards by covered interest parity from fixed market inputs.
///
/// Rates are decimals (0.045 for 4.5%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParityForwardSource {
    pub spot_rate: f64,
    pub usd_rate: f64,
    pub dkk_rate: f64,
}

impl ForwardQuoteSource for ParityForwardSource {
    fn forward_quote(&self, maturity_months: f64) -> HedgingResult<ForwardRateQuote> {
        ForwardRateQuote::from_parity(self.spot_rate, self.usd_rate, self.dkk_rate, maturity_months)
    }
}

/// Returns the same forward rate for every maturity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedForwardSource {
    pub spot_rate: f64,
    pub forward_rate: f64,
}

impl ForwardQuoteSource for FixedForwardSource {
    fn forward_quote(&self, maturity_months: f64) -> HedgingResult<ForwardRateQuote> {
        if !(self.forward_rate.is_finite() && self.forward_rate > 0.0) {
            return Err(HedgingError::data_source(format!(
                "forward rate must be positive, got {}",
                self.forward_rate
            )));
        }
        Ok(ForwardRateQuote {
            spot_rate: self.spot_rate,
            usd_rate: 0.0,
            dkk_rate: 0.0,
            maturity_months,
            forward_rate: self.forward_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
    }

    #[test]
    fn test_static_source_filters_range() {
        let series = PriceSeries::from_observations(
            "USD/DKK".parse().unwrap(),
            (1..=10).map(|d| (day(d), Some(6.9))),
        );
        let source = StaticPriceSource::new(series);
        let got = source.price_history("ANY", day(3), day(6)).unwrap();
        assert_eq!(got.len(), 4);
        assert!(source.price_history("ANY", day(20), day(25)).is_err());
    }

    #[test]
    fn test_parity_source() {
        let source = ParityForwardSource {
            spot_rate: 7.0,
            usd_rate: 0.05,
            dkk_rate: 0.03,
        };
        let q = source.forward_quote(6.0).unwrap();
        assert!((q.forward_rate - 7.069).abs() < 1e-9);
        assert_eq!(q.maturity_months, 6.0);
    }

    #[test]
    fn test_boxed_sources() {
        let source: Box<dyn ForwardQuoteSource> = Box::new(FixedForwardSource {
            spot_rate: 7.0,
            forward_rate: 6.98,
        });
        assert_eq!(source.forward_quote(3.0).unwrap().forward_rate, 6.98);
    }
}
