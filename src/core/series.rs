use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::currency::CurrencyPair;
use crate::core::error::{HedgingError, HedgingResult};

/// One observed closing rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A chronological, de-duplicated series of positive FX prices quoted in
/// one convention.
///
/// Construction drops observations whose price is missing, non-finite or
/// non-positive, sorts by date and keeps the last observation for any
/// repeated date. Missing trading days stay absent; nothing is interpolated.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fx_hedging_engine::core::series::PriceSeries;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let series = PriceSeries::from_observations(
///     "USD/DKK".parse().unwrap(),
///     vec![(d(3), Some(6.9)), (d(2), None), (d(1), Some(7.0))],
/// );
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.last().unwrap().price, 6.9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pair: CurrencyPair,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw `(date, price)` observations.
    pub fn from_observations<I>(pair: CurrencyPair, observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let mut points: Vec<PricePoint> = observations
            .into_iter()
            .filter_map(|(date, price)| match price {
                Some(p) if p.is_finite() && p > 0.0 => Some(PricePoint { date, price: p }),
                _ => None,
            })
            .collect();

        // Stable sort keeps input order within a date, so the last one wins below.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            pair,
            points: deduped,
        }
    }

    /// Build a series from already-valid points.
    pub fn new(pair: CurrencyPair, points: Vec<PricePoint>) -> Self {
        Self::from_observations(pair, points.into_iter().map(|p| (p.date, Some(p.price))))
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Observations with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            pair: self.pair.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Re-express the series in `target` convention.
    ///
    /// Returns a clone when the conventions already match and the
    /// reciprocal series when `target` is the inverse pair.
    pub fn in_convention(&self, target: &CurrencyPair) -> HedgingResult<Self> {
        if &self.pair == target {
            return Ok(self.clone());
        }
        if !self.pair.is_inverse_of(target) {
            return Err(HedgingError::invalid_config(format!(
                "cannot express {} prices as {}",
                self.pair, target
            )));
        }
        Ok(Self {
            pair: target.clone(),
            points: self
                .points
                .iter()
                .map(|p| PricePoint {
                    date: p.date,
                    price: 1.0 / p.price,
                })
                .collect(),
        })
    }
}

/// Daily log-returns of a [`PriceSeries`] in the target convention.
///
/// `returns[i] = ln(price[i + 1] / price[i])`, so a series of `n` prices
/// yields `n - 1` returns. `last_rate` is the final observed price, the
/// starting point (S0) of every simulated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pair: CurrencyPair,
    returns: Vec<f64>,
    last_rate: f64,
    last_date: NaiveDate,
}

impl ReturnSeries {
    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Last observed rate in the target convention.
    pub fn last_rate(&self) -> f64 {
        self.last_rate
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// Sample mean of the returns.
    pub fn mean(&self) -> f64 {
        if self.returns.is_empty() {
            return 0.0;
        }
        self.returns.iter().sum::<f64>() / self.returns.len() as f64
    }

    /// Population variance of the returns.
    pub fn variance(&self) -> f64 {
        if self.returns.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / self.returns.len() as f64
    }
}

/// Turns a price history into the return series the volatility model is
/// fitted on, flipping the quote convention when needed.
#[derive(Debug, Clone)]
pub struct ReturnSeriesBuilder {
    target: CurrencyPair,
    min_observations: usize,
}

impl ReturnSeriesBuilder {
    pub fn new(target: CurrencyPair, min_observations: usize) -> Self {
        Self {
            target,
            min_observations,
        }
    }

    pub fn target(&self) -> &CurrencyPair {
        &self.target
    }

    /// Minimum number of returns required, never below one.
    pub fn required_returns(&self) -> usize {
        self.min_observations.max(1)
    }

    pub fn build(&self, prices: &PriceSeries) -> HedgingResult<ReturnSeries> {
        let required = self.required_returns();
        let available = prices.len().saturating_sub(1);
        if prices.len() < 2 || available < required {
            return Err(HedgingError::InsufficientData {
                required,
                available,
            });
        }

        let target = prices.in_convention(&self.target)?;
        let returns: Vec<f64> = target
            .points()
            .windows(2)
            .map(|w| (w[1].price / w[0].price).ln())
            .collect();

        // Guarded by the length check above.
        let last = target.points()[target.len() - 1];

        log::debug!(
            "built {} log-returns for {} ending {} at {:.6}",
            returns.len(),
            self.target,
            last.date,
            last.price
        );

        Ok(ReturnSeries {
            pair: self.target.clone(),
            returns,
            last_rate: last.price,
            last_date: last.date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    fn dkk_usd() -> CurrencyPair {
        "DKK/USD".parse().unwrap()
    }

    fn usd_dkk() -> CurrencyPair {
        "USD/DKK".parse().unwrap()
    }

    #[test]
    fn test_drops_invalid_prices() {
        let series = PriceSeries::from_observations(
            usd_dkk(),
            vec![
                (day(0), Some(7.0)),
                (day(1), None),
                (day(2), Some(f64::NAN)),
                (day(3), Some(-1.0)),
                (day(4), Some(0.0)),
                (day(5), Some(7.1)),
            ],
        );
        assert_eq!(series.prices(), vec![7.0, 7.1]);
    }

    #[test]
    fn test_sorts_and_dedups_last_wins() {
        let series = PriceSeries::from_observations(
            usd_dkk(),
            vec![
                (day(2), Some(7.2)),
                (day(0), Some(7.0)),
                (day(2), Some(7.25)),
                (day(1), Some(7.1)),
            ],
        );
        let dates: Vec<NaiveDate> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
        assert_eq!(series.last().unwrap().price, 7.25);
    }

    #[test]
    fn test_between_is_inclusive() {
        let series = PriceSeries::from_observations(
            usd_dkk(),
            (0..10).map(|i| (day(i), Some(7.0 + i as f64 * 0.01))),
        );
        assert_eq!(series.between(day(2), day(5)).len(), 4);
    }

    #[test]
    fn test_build_inverts_source_convention() {
        let prices = PriceSeries::from_observations(
            dkk_usd(),
            vec![(day(0), Some(0.14)), (day(1), Some(0.15)), (day(2), Some(0.145))],
        );
        let returns = ReturnSeriesBuilder::new(usd_dkk(), 1).build(&prices).unwrap();

        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns.returns()[0], (0.14f64 / 0.15).ln(), epsilon = 1e-12);
        assert_relative_eq!(returns.returns()[1], (0.15f64 / 0.145).ln(), epsilon = 1e-12);
        assert_relative_eq!(returns.last_rate(), 1.0 / 0.145, epsilon = 1e-12);
        assert_eq!(returns.pair(), &usd_dkk());
    }

    #[test]
    fn test_build_same_convention_is_untouched() {
        let prices = PriceSeries::from_observations(
            usd_dkk(),
            vec![(day(0), Some(7.0)), (day(1), Some(7.0))],
        );
        let returns = ReturnSeriesBuilder::new(usd_dkk(), 1).build(&prices).unwrap();
        assert_eq!(returns.returns(), &[0.0]);
        assert_eq!(returns.last_rate(), 7.0);
    }

    #[test]
    fn test_single_price_is_insufficient() {
        let prices = PriceSeries::from_observations(usd_dkk(), vec![(day(0), Some(7.0))]);
        let err = ReturnSeriesBuilder::new(usd_dkk(), 0).build(&prices).unwrap_err();
        assert!(matches!(
            err,
            HedgingError::InsufficientData {
                required: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_minimum_history_enforced() {
        let prices = PriceSeries::from_observations(
            usd_dkk(),
            (0..100).map(|i| (day(i), Some(7.0))),
        );
        let err = ReturnSeriesBuilder::new(usd_dkk(), 250).build(&prices).unwrap_err();
        assert!(matches!(
            err,
            HedgingError::InsufficientData {
                required: 250,
                available: 99
            }
        ));
    }

    #[test]
    fn test_unrelated_pair_rejected() {
        let prices = PriceSeries::from_observations(
            "EUR/USD".parse().unwrap(),
            vec![(day(0), Some(1.1)), (day(1), Some(1.2))],
        );
        let err = ReturnSeriesBuilder::new(usd_dkk(), 1).build(&prices).unwrap_err();
        assert!(matches!(err, HedgingError::InvalidConfig(_)));
    }
}
