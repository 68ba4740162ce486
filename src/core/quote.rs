use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::error::{HedgingError, HedgingResult};

/// A USD/DKK forward quote as consumed by the payoff engine.
///
/// `usd_rate` and `dkk_rate` are annual money-market rates in percent;
/// `spot_rate` and `forward_rate` are DKK per USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardRateQuote {
    pub spot_rate: f64,
    pub usd_rate: f64,
    pub dkk_rate: f64,
    pub maturity_months: f64,
    pub forward_rate: f64,
}

impl ForwardRateQuote {
    /// Price a forward by covered interest parity with simple compounding:
    ///
    /// `F = S · (1 + r_usd · T) / (1 + r_dkk · T)`, `T = months / 12`.
    ///
    /// `usd_rate` and `dkk_rate` are decimals (0.045 for 4.5%). The returned
    /// quote rounds spot and forward to 4 dp and reports rates in percent
    /// rounded to 2 dp.
    ///
    /// # Examples
    ///
    /// ```
    /// use fx_hedging_engine::core::quote::ForwardRateQuote;
    ///
    /// let q = ForwardRateQuote::from_parity(7.0, 0.05, 0.03, 12.0).unwrap();
    /// assert!((q.forward_rate - 7.1359).abs() < 1e-9);
    /// assert!((q.usd_rate - 5.0).abs() < 1e-9);
    /// ```
    pub fn from_parity(
        spot_rate: f64,
        usd_rate: f64,
        dkk_rate: f64,
        maturity_months: f64,
    ) -> HedgingResult<Self> {
        if !(spot_rate.is_finite() && spot_rate > 0.0) {
            return Err(HedgingError::data_source(format!(
                "spot rate must be positive, got {}",
                spot_rate
            )));
        }
        if !(maturity_months.is_finite() && maturity_months > 0.0) {
            return Err(HedgingError::invalid_exposure(format!(
                "forward maturity must be positive, got {} months",
                maturity_months
            )));
        }
        if !(usd_rate.is_finite() && dkk_rate.is_finite()) {
            return Err(HedgingError::data_source("interest rates must be finite"));
        }

        let t = maturity_months / 12.0;
        let denominator = 1.0 + dkk_rate * t;
        if denominator <= 0.0 {
            return Err(HedgingError::data_source(format!(
                "DKK rate {} makes the discount factor non-positive",
                dkk_rate
            )));
        }
        let forward = spot_rate * (1.0 + usd_rate * t) / denominator;

        Ok(Self {
            spot_rate: round_dp(spot_rate, 4)?,
            usd_rate: round_dp(usd_rate * 100.0, 2)?,
            dkk_rate: round_dp(dkk_rate * 100.0, 2)?,
            maturity_months,
            forward_rate: round_dp(forward, 4)?,
        })
    }

    /// Forward points (forward minus spot), in DKK per USD.
    pub fn forward_points(&self) -> f64 {
        self.forward_rate - self.spot_rate
    }
}

fn round_dp(value: f64, dp: u32) -> HedgingResult<f64> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(dp))
        .and_then(|d| d.to_f64())
        .ok_or_else(|| HedgingError::data_source(format!("cannot represent {} as a quote", value)))
}
