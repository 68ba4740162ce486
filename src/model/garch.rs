//! GARCH(1,1) volatility model.
//!
//! ```text
//! r_t   = μ + ε_t,          ε_t = σ_t · z_t,   z_t ~ N(0, 1)
//! σ²_t  = ω + α · ε²_{t-1} + β · σ²_{t-1}
//! ```
//!
//! Parameters are estimated by Gaussian maximum likelihood on returns
//! multiplied by `rescale_factor` (percent returns by default). Every
//! consumer of [`GarchParams`] works in that scaled space and divides the
//! factor back out, see [`crate::simulation::path::PathSimulator`].

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::error::{HedgingError, HedgingResult};
use crate::core::series::ReturnSeries;
use crate::model::optimizer::{nelder_mead, BoxConstraints, NelderMeadOptions};

const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_WINDOW: usize = 75;
const DEGENERATE_VARIANCE: f64 = 1e-14;

/// Fitted GARCH(1,1) coefficients, in rescaled return units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarchParams {
    /// Constant conditional mean μ.
    pub mu: f64,
    /// Variance intercept ω.
    pub omega: f64,
    /// ARCH coefficient α.
    pub alpha: f64,
    /// GARCH coefficient β.
    pub beta: f64,
    /// Factor the returns were multiplied by before fitting.
    pub rescale_factor: f64,
    /// One-step-ahead conditional variance at the end of the sample.
    pub terminal_variance: f64,
    /// Maximised log-likelihood; `None` for a degenerate (zero variance) fit.
    pub log_likelihood: Option<f64>,
    /// Number of returns the model was fitted on.
    pub observations: usize,
}

impl GarchParams {
    /// A model with no randomness: every simulated return equals `mu`.
    pub fn zero_volatility(mu: f64, rescale_factor: f64) -> Self {
        Self {
            mu,
            omega: 0.0,
            alpha: 0.0,
            beta: 0.0,
            rescale_factor,
            terminal_variance: 0.0,
            log_likelihood: None,
            observations: 0,
        }
    }

    /// α + β.
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    pub fn is_stationary(&self) -> bool {
        self.persistence() < 1.0
    }

    /// Long-run variance ω / (1 − α − β), if the process is stationary.
    pub fn unconditional_variance(&self) -> Option<f64> {
        if self.is_stationary() {
            Some(self.omega / (1.0 - self.persistence()))
        } else {
            None
        }
    }

    /// Variance the simulation recursion starts from.
    pub fn initial_variance(&self) -> f64 {
        self.unconditional_variance()
            .unwrap_or(self.terminal_variance)
            .max(0.0)
    }

    /// Long-run daily volatility of unscaled log-returns.
    pub fn daily_volatility(&self) -> f64 {
        self.initial_variance().sqrt() / self.rescale_factor
    }

    /// Annualised long-run volatility assuming 252 trading days.
    pub fn annualized_volatility(&self) -> f64 {
        self.daily_volatility() * 252f64.sqrt()
    }

    pub fn is_finite(&self) -> bool {
        [
            self.mu,
            self.omega,
            self.alpha,
            self.beta,
            self.terminal_variance,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Anything that can turn a return history into GARCH parameters.
///
/// Implemented by [`GarchEstimator`]; tests and batch jobs can substitute
/// pre-fitted parameters.
pub trait VolatilityModel: Send + Sync {
    fn fit(&self, returns: &ReturnSeries) -> HedgingResult<GarchParams>;
}

/// Maximum-likelihood GARCH(1,1) estimator with normal innovations.
#[derive(Debug, Clone)]
pub struct GarchEstimator {
    rescale_factor: f64,
    options: NelderMeadOptions,
}

impl Default for GarchEstimator {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl GarchEstimator {
    pub fn new(rescale_factor: f64) -> Self {
        Self {
            rescale_factor,
            options: NelderMeadOptions {
                max_iterations: 20_000,
                ..Default::default()
            },
        }
    }

    pub fn with_options(mut self, options: NelderMeadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rescale_factor(&self) -> f64 {
        self.rescale_factor
    }

    /// Fit the model to raw (unscaled) log-returns.
    pub fn fit_returns(&self, returns: &[f64]) -> HedgingResult<GarchParams> {
        if !(self.rescale_factor.is_finite() && self.rescale_factor > 0.0) {
            return Err(HedgingError::invalid_config(format!(
                "rescale factor must be positive, got {}",
                self.rescale_factor
            )));
        }
        if returns.len() < 2 {
            return Err(HedgingError::InsufficientData {
                required: 2,
                available: returns.len(),
            });
        }
        let scaled: Vec<f64> = returns.iter().map(|r| r * self.rescale_factor).collect();
        if scaled.iter().any(|r| !r.is_finite()) {
            return Err(HedgingError::model_fit("return series contains non-finite values"));
        }

        let n = scaled.len() as f64;
        let mean = scaled.iter().sum::<f64>() / n;
        let variance = scaled.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        if variance < DEGENERATE_VARIANCE {
            log::info!(
                "return series has no dispersion (variance {:e}), using zero-volatility model",
                variance
            );
            return Ok(GarchParams {
                observations: scaled.len(),
                ..GarchParams::zero_volatility(mean, self.rescale_factor)
            });
        }

        let backcast = backcast(&scaled, mean);
        let sd = variance.sqrt();
        let bounds = BoxConstraints::new(
            vec![mean - 2.0 * sd, variance * 1e-6, 0.0, 0.0],
            vec![mean + 2.0 * sd, variance * 2.0, 1.0, 1.0],
        )?;
        let initial = [mean, variance * 0.1, 0.1, 0.8];

        let minimum = nelder_mead(&initial, &bounds, self.options, |theta| {
            negative_log_likelihood(&scaled, backcast, theta)
        })?;

        if !minimum.converged {
            return Err(HedgingError::model_fit(format!(
                "optimizer did not converge within {} iterations",
                minimum.iterations
            )));
        }
        if !minimum.value.is_finite() || minimum.x.iter().any(|v| !v.is_finite()) {
            return Err(HedgingError::model_fit(format!(
                "optimizer returned non-finite parameters {:?} (objective {})",
                minimum.x, minimum.value
            )));
        }

        let (mu, omega, alpha, beta) = (minimum.x[0], minimum.x[1], minimum.x[2], minimum.x[3]);
        let terminal_variance = variance_path(&scaled, backcast, mu, omega, alpha, beta)
            .last()
            .map(|&(sigma2, eps2)| omega + alpha * eps2 + beta * sigma2)
            .unwrap_or(backcast);

        let params = GarchParams {
            mu,
            omega,
            alpha,
            beta,
            rescale_factor: self.rescale_factor,
            terminal_variance,
            log_likelihood: Some(-minimum.value),
            observations: scaled.len(),
        };
        if !params.is_finite() {
            return Err(HedgingError::model_fit("fitted parameters are not finite"));
        }

        log::info!(
            "GARCH(1,1) fit on {} obs: mu={:.6} omega={:.6} alpha={:.4} beta={:.4} llf={:.3} ({} iterations)",
            params.observations,
            mu,
            omega,
            alpha,
            beta,
            -minimum.value,
            minimum.iterations
        );
        Ok(params)
    }
}

impl VolatilityModel for GarchEstimator {
    fn fit(&self, returns: &ReturnSeries) -> HedgingResult<GarchParams> {
        self.fit_returns(returns.returns())
    }
}

/// Exponentially weighted mean of squared residuals over the first
/// observations, used for the pre-sample σ² and ε².
fn backcast(scaled: &[f64], mean: f64) -> f64 {
    let window = scaled.len().min(BACKCAST_WINDOW);
    let (weighted, total) = scaled[..window].iter().enumerate().fold(
        (0.0, 0.0),
        |(acc, total), (i, r)| {
            let w = BACKCAST_DECAY.powi(i as i32);
            (acc + w * (r - mean).powi(2), total + w)
        },
    );
    weighted / total
}

/// `(σ²_t, ε²_t)` for every observation.
fn variance_path(
    scaled: &[f64],
    backcast: f64,
    mu: f64,
    omega: f64,
    alpha: f64,
    beta: f64,
) -> Vec<(f64, f64)> {
    let mut sigma2 = backcast;
    let mut eps2 = backcast;
    scaled
        .iter()
        .map(|r| {
            sigma2 = omega + alpha * eps2 + beta * sigma2;
            eps2 = (r - mu).powi(2);
            (sigma2, eps2)
        })
        .collect()
}

pub(crate) fn negative_log_likelihood(scaled: &[f64], backcast: f64, theta: &[f64]) -> f64 {
    let (mu, omega, alpha, beta) = (theta[0], theta[1], theta[2], theta[3]);
    if omega <= 0.0 || alpha < 0.0 || beta < 0.0 || alpha + beta >= 1.0 {
        return f64::INFINITY;
    }

    let mut sigma2 = backcast;
    let mut eps2 = backcast;
    let mut acc = 0.0;
    for r in scaled {
        sigma2 = omega + alpha * eps2 + beta * sigma2;
        if !(sigma2 > 0.0 && sigma2.is_finite()) {
            return f64::INFINITY;
        }
        let eps = r - mu;
        eps2 = eps * eps;
        acc += sigma2.ln() + eps2 / sigma2;
    }
    0.5 * (scaled.len() as f64 * (2.0 * PI).ln() + acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, StandardNormal};

    /// Raw (unscaled) returns from a known GARCH(1,1) process.
    fn garch_sample(n: usize, mu: f64, omega: f64, alpha: f64, beta: f64, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sigma2 = omega / (1.0 - alpha - beta);
        let mut eps: f64 = 0.0;
        (0..n)
            .map(|_| {
                sigma2 = omega + alpha * eps * eps + beta * sigma2;
                let z: f64 = StandardNormal.sample(&mut rng);
                eps = sigma2.sqrt() * z;
                (mu + eps) / 100.0
            })
            .collect()
    }

    #[test]
    fn test_recovers_known_parameters() {
        let returns = garch_sample(4_000, 0.01, 0.05, 0.10, 0.85, 7);
        let params = GarchEstimator::default().fit_returns(&returns).unwrap();

        assert!(params.is_stationary());
        assert!((params.alpha - 0.10).abs() < 0.06, "alpha = {}", params.alpha);
        assert!((params.beta - 0.85).abs() < 0.12, "beta = {}", params.beta);
        assert!(params.log_likelihood.is_some());
        assert_eq!(params.observations, 4_000);
        assert_eq!(params.rescale_factor, 100.0);
    }

    #[test]
    fn test_fit_beats_true_parameters() {
        let returns = garch_sample(2_000, 0.0, 0.02, 0.08, 0.90, 11);
        let params = GarchEstimator::default().fit_returns(&returns).unwrap();

        let scaled: Vec<f64> = returns.iter().map(|r| r * 100.0).collect();
        let mean = scaled.iter().sum::<f64>() / scaled.len() as f64;
        let bc = backcast(&scaled, mean);
        let at_truth = negative_log_likelihood(&scaled, bc, &[0.0, 0.02, 0.08, 0.90]);
        let at_fit = -params.log_likelihood.unwrap();
        assert!(at_fit <= at_truth + 1e-6, "fit {} vs truth {}", at_fit, at_truth);
    }

    #[test]
    fn test_constant_returns_give_zero_volatility() {
        let params = GarchEstimator::default().fit_returns(&[0.0; 300]).unwrap();
        assert_eq!(params.omega, 0.0);
        assert_eq!(params.alpha, 0.0);
        assert_eq!(params.beta, 0.0);
        assert_eq!(params.mu, 0.0);
        assert_eq!(params.initial_variance(), 0.0);
        assert_eq!(params.observations, 300);
    }

    #[test]
    fn test_non_convergence_is_model_fit_error() {
        let returns = garch_sample(500, 0.0, 0.05, 0.1, 0.85, 3);
        let estimator = GarchEstimator::default().with_options(NelderMeadOptions {
            max_iterations: 2,
            ..Default::default()
        });
        let err = estimator.fit_returns(&returns).unwrap_err();
        assert!(matches!(err, HedgingError::ModelFit(_)));
    }

    #[test]
    fn test_non_finite_returns_rejected() {
        let err = GarchEstimator::default()
            .fit_returns(&[0.01, f64::NAN, -0.01])
            .unwrap_err();
        assert!(matches!(err, HedgingError::ModelFit(_)));
    }

    #[test]
    fn test_likelihood_rejects_non_stationary() {
        let scaled = [0.1, -0.2, 0.3];
        assert!(negative_log_likelihood(&scaled, 0.05, &[0.0, 0.01, 0.5, 0.5]).is_infinite());
        assert!(negative_log_likelihood(&scaled, 0.05, &[0.0, 0.0, 0.1, 0.5]).is_infinite());
        assert!(negative_log_likelihood(&scaled, 0.05, &[0.0, 0.01, 0.1, 0.5]).is_finite());
    }

    #[test]
    fn test_unconditional_variance() {
        let params = GarchParams {
            mu: 0.0,
            omega: 0.05,
            alpha: 0.1,
            beta: 0.85,
            rescale_factor: 100.0,
            terminal_variance: 2.0,
            log_likelihood: None,
            observations: 0,
        };
        assert_relative_eq!(params.unconditional_variance().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(params.daily_volatility(), 0.01, epsilon = 1e-12);

        let integrated = GarchParams {
            alpha: 0.2,
            beta: 0.8,
            ..params
        };
        assert!(integrated.unconditional_variance().is_none());
        assert_eq!(integrated.initial_variance(), 2.0);
    }
}
