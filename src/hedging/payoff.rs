//! Revenue under the three hedging strategies.
//!
//! All revenues are in DKK for a USD `exposure` converted at the simulated
//! terminal rate (DKK per USD):
//!
//! - unhedged: `exposure · S_T`
//! - forward: `exposure · F` (one number, no dispersion)
//! - put: `exposure · S_T + exposure · max(K − S_T, 0) − premium_cost`
//!
//! where `premium_cost = exposure · (premium / notional) · S0`, the USD
//! premium converted to DKK at today's rate.

use serde::{Deserialize, Serialize};

use crate::core::error::{HedgingError, HedgingResult};
use crate::core::quote::ForwardRateQuote;
use crate::hedging::catalog::OptionProduct;
use crate::hedging::stats::{DistributionStats, ForwardStats, SummaryStatistics};

/// Revenue samples per strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeOutcomes {
    pub unhedged: Vec<f64>,
    pub forward: f64,
    pub option: Vec<f64>,
    /// Option premium per unit of exposure, in DKK.
    pub premium_per_unit: f64,
    /// Total premium paid, in DKK.
    pub premium_cost: f64,
}

impl HedgeOutcomes {
    pub fn summary(&self) -> HedgingResult<SummaryStatistics> {
        let unhedged = DistributionStats::from_samples(&self.unhedged)
            .ok_or_else(|| HedgingError::invalid_exposure("no finite unhedged revenue samples"))?;
        let option = DistributionStats::from_samples(&self.option)
            .ok_or_else(|| HedgingError::invalid_exposure("no finite option revenue samples"))?;
        Ok(SummaryStatistics {
            unhedged,
            forward: ForwardStats {
                revenue: self.forward,
            },
            option,
        })
    }
}

/// Maps terminal rates to strategy revenues for one exposure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoffEngine {
    exposure: f64,
    spot: f64,
}

impl PayoffEngine {
    /// `exposure` is the USD amount to convert; `spot` is today's DKK per USD
    /// rate, used to convert the option premium.
    pub fn new(exposure: f64, spot: f64) -> HedgingResult<Self> {
        if !(exposure.is_finite() && exposure > 0.0) {
            return Err(HedgingError::invalid_exposure(format!(
                "exposure must be positive, got {}",
                exposure
            )));
        }
        if !(spot.is_finite() && spot > 0.0) {
            return Err(HedgingError::data_source(format!(
                "spot rate must be positive, got {}",
                spot
            )));
        }
        Ok(Self { exposure, spot })
    }

    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn unhedged_revenue(&self, rate: f64) -> f64 {
        self.exposure * rate
    }

    pub fn forward_revenue(&self, quote: &ForwardRateQuote) -> f64 {
        self.exposure * quote.forward_rate
    }

    /// Premium per unit of exposure in DKK.
    pub fn premium_per_unit(&self, option: &OptionProduct) -> f64 {
        option.premium_rate() * self.spot
    }

    pub fn option_revenue(&self, rate: f64, option: &OptionProduct) -> f64 {
        self.exposure * rate + option.payoff(rate) * self.exposure
            - self.premium_per_unit(option) * self.exposure
    }

    pub fn evaluate(
        &self,
        terminal_rates: &[f64],
        quote: &ForwardRateQuote,
        option: &OptionProduct,
    ) -> HedgingResult<HedgeOutcomes> {
        if terminal_rates.is_empty() {
            return Err(HedgingError::invalid_exposure("no terminal rates to evaluate"));
        }
        if !(option.notional.is_finite() && option.notional > 0.0) {
            return Err(HedgingError::InvalidNotional(option.notional));
        }

        let premium_per_unit = self.premium_per_unit(option);
        Ok(HedgeOutcomes {
            unhedged: terminal_rates
                .iter()
                .map(|&s| self.unhedged_revenue(s))
                .collect(),
            forward: self.forward_revenue(quote),
            option: terminal_rates
                .iter()
                .map(|&s| self.option_revenue(s, option))
                .collect(),
            premium_per_unit,
            premium_cost: premium_per_unit * self.exposure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quote(forward_rate: f64) -> ForwardRateQuote {
        ForwardRateQuote {
            spot_rate: 7.0,
            usd_rate: 4.5,
            dkk_rate: 2.5,
            maturity_months: 6.0,
            forward_rate,
        }
    }

    #[test]
    fn test_strategies() {
        let engine = PayoffEngine::new(1_000.0, 7.0).unwrap();
        // premium 1% of notional -> 0.07 DKK per USD.
        let option = OptionProduct::put(6, 7.0, 1_000.0, 10.0);
        let out = engine
            .evaluate(&[6.5, 7.0, 7.5], &quote(7.06), &option)
            .unwrap();

        assert_eq!(out.unhedged, vec![6_500.0, 7_000.0, 7_500.0]);
        assert_relative_eq!(out.forward, 7_060.0, epsilon = 1e-9);
        assert_relative_eq!(out.premium_per_unit, 0.07, epsilon = 1e-12);
        assert_relative_eq!(out.premium_cost, 70.0, epsilon = 1e-9);
        assert_relative_eq!(out.option[0], 6_500.0 + 500.0 - 70.0, epsilon = 1e-9);
        assert_relative_eq!(out.option[1], 7_000.0 - 70.0, epsilon = 1e-9);
        assert_relative_eq!(out.option[2], 7_500.0 - 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_put_floors_revenue() {
        let engine = PayoffEngine::new(1_000_000.0, 6.9).unwrap();
        let option = OptionProduct::put(6, 7.0105, 1_000_000.0, 22_677.0);
        let rates = [5.0, 6.0, 6.5, 7.0, 7.2, 8.0];
        let out = engine.evaluate(&rates, &quote(7.0), &option).unwrap();
        let floor = 1_000_000.0 * 7.0105 - out.premium_cost;
        for (o, u) in out.option.iter().zip(out.unhedged.iter()) {
            assert!(*o >= floor - 1e-6);
            assert!(*o >= u - out.premium_cost - 1e-6);
        }
    }

    #[test]
    fn test_forward_is_deterministic() {
        let engine = PayoffEngine::new(250_000.0, 7.0).unwrap();
        let q = quote(6.95);
        assert_eq!(engine.forward_revenue(&q), engine.forward_revenue(&q));
        assert_eq!(engine.forward_revenue(&q), 250_000.0 * 6.95);
    }

    #[test]
    fn test_summary() {
        let engine = PayoffEngine::new(1.0, 7.0).unwrap();
        let option = OptionProduct::put(6, 7.0, 1.0, 0.0);
        let out = engine
            .evaluate(&[6.0, 7.0, 8.0], &quote(7.0), &option)
            .unwrap();
        let summary = out.summary().unwrap();
        assert_relative_eq!(summary.unhedged.mean, 7.0, epsilon = 1e-12);
        assert_eq!(summary.option.min, 7.0);
        assert_eq!(summary.option.max, 8.0);
        assert_eq!(summary.forward.revenue, 7.0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            PayoffEngine::new(0.0, 7.0),
            Err(HedgingError::InvalidExposure(_))
        ));
        assert!(PayoffEngine::new(-1.0, 7.0).is_err());
        assert!(PayoffEngine::new(1.0, 0.0).is_err());

        let engine = PayoffEngine::new(1.0, 7.0).unwrap();
        let option = OptionProduct::put(6, 7.0, 1.0, 0.0);
        assert!(engine.evaluate(&[], &quote(7.0), &option).is_err());
    }
}
