//! End-to-end hedging simulation run.
//!
//! # Pipeline
//!
//! 1. Validate the request (nothing is fetched or fitted for bad input).
//! 2. Fetch the price history and build reciprocal log-returns.
//! 3. Fit the volatility model.
//! 4. Fetch the forward quote; select and scale the option product.
//! 5. Simulate terminal rates, optionally in batches with progress events.
//! 6. Evaluate the three strategies and summarise.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::error::{HedgingError, HedgingResult};
use crate::core::quote::ForwardRateQuote;
use crate::core::series::ReturnSeriesBuilder;
use crate::data::source::{ForwardQuoteSource, PriceHistorySource};
use crate::hedging::catalog::{OptionProduct, OptionProductCatalog};
use crate::hedging::payoff::PayoffEngine;
use crate::hedging::stats::SummaryStatistics;
use crate::model::garch::{GarchEstimator, GarchParams, VolatilityModel};
use crate::simulation::path::PathSimulator;
use crate::simulation::progress::{ProgressEvent, ProgressSink};

/// Run-independent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticker of the historical series.
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Convention the history is quoted in.
    pub source_pair: CurrencyPair,
    /// Convention of the exposure (DKK per USD).
    pub target_pair: CurrencyPair,
    /// Simulation steps discarded at the start of each path.
    pub burn_in: usize,
    /// Multiplier applied to returns before fitting.
    pub rescale_factor: f64,
    /// Minimum number of returns required to fit.
    pub min_observations: usize,
    /// Paths per batch; `None` simulates everything in one batch.
    pub batch_size: Option<usize>,
    /// Random seed; `None` draws one per run.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let usd = CurrencyCode::new("USD");
        let dkk = CurrencyCode::new("DKK");
        Self {
            ticker: "DKKUSD=X".to_string(),
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default(),
            source_pair: CurrencyPair::new(dkk.clone(), usd.clone()),
            target_pair: CurrencyPair::new(usd, dkk),
            burn_in: 100,
            rescale_factor: 100.0,
            min_observations: 250,
            batch_size: None,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> HedgingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HedgingError::invalid_config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            HedgingError::invalid_config(format!("cannot parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HedgingResult<()> {
        if self.start_date > self.end_date {
            return Err(HedgingError::invalid_config(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if !(self.rescale_factor.is_finite() && self.rescale_factor > 0.0) {
            return Err(HedgingError::invalid_config(format!(
                "rescale factor must be positive, got {}",
                self.rescale_factor
            )));
        }
        if self.batch_size == Some(0) {
            return Err(HedgingError::invalid_config("batch size must be at least 1"));
        }
        if self.source_pair != self.target_pair && !self.source_pair.is_inverse_of(&self.target_pair) {
            return Err(HedgingError::invalid_config(format!(
                "source pair {} and target pair {} do not share currencies",
                self.source_pair, self.target_pair
            )));
        }
        Ok(())
    }
}

/// Caller-supplied parameters of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRequest {
    /// Horizon in months.
    pub months: f64,
    /// USD amount to convert.
    pub exposure: f64,
    pub num_simulations: usize,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            months: 6.0,
            exposure: 1_000_000.0,
            num_simulations: 10_000,
        }
    }
}

impl RunRequest {
    /// Validate and return the horizon in days.
    pub fn validate(&self) -> HedgingResult<usize> {
        if !(self.exposure.is_finite() && self.exposure > 0.0) {
            return Err(HedgingError::invalid_exposure(format!(
                "exposure must be positive, got {}",
                self.exposure
            )));
        }
        if self.num_simulations == 0 {
            return Err(HedgingError::invalid_exposure(
                "number of simulations must be at least 1",
            ));
        }
        if !(self.months.is_finite() && self.months > 0.0) {
            return Err(HedgingError::invalid_exposure(format!(
                "horizon must be positive, got {} months",
                self.months
            )));
        }
        let days = horizon_days(self.months);
        if days == 0 {
            return Err(HedgingError::invalid_exposure(format!(
                "horizon of {} months is shorter than one day",
                self.months
            )));
        }
        Ok(days)
    }
}

/// Simulation horizon in days: `round(months · 365 / 12)`.
pub fn horizon_days(months: f64) -> usize {
    (months * 365.0 / 12.0).round().max(0.0) as usize
}

/// Everything a run produced. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    run_id: Uuid,
    months: f64,
    horizon_days: usize,
    exposure: f64,
    seed: u64,
    spot_rate: f64,
    model: GarchParams,
    forward_quote: ForwardRateQuote,
    option_product: OptionProduct,
    premium_per_unit: f64,
    terminal_rates: Vec<f64>,
    unhedged_revenue: Vec<f64>,
    forward_revenue: f64,
    option_revenue: Vec<f64>,
    summary_stats: SummaryStatistics,
}

impl SimulationResult {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn months(&self) -> f64 {
        self.months
    }

    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    /// Seed the run's paths were drawn with; reusing it reproduces the run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Last observed rate (DKK per USD) that every path started from.
    pub fn spot_rate(&self) -> f64 {
        self.spot_rate
    }

    pub fn model(&self) -> &GarchParams {
        &self.model
    }

    pub fn forward_quote(&self) -> &ForwardRateQuote {
        &self.forward_quote
    }

    /// The option product scaled to the exposure.
    pub fn option_product(&self) -> &OptionProduct {
        &self.option_product
    }

    pub fn premium_per_unit(&self) -> f64 {
        self.premium_per_unit
    }

    pub fn terminal_rates(&self) -> &[f64] {
        &self.terminal_rates
    }

    pub fn unhedged_revenue(&self) -> &[f64] {
        &self.unhedged_revenue
    }

    pub fn forward_revenue(&self) -> f64 {
        self.forward_revenue
    }

    pub fn option_revenue(&self) -> &[f64] {
        &self.option_revenue
    }

    pub fn summary_stats(&self) -> &SummaryStatistics {
        &self.summary_stats
    }
}

impl std::fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.summary_stats;
        writeln!(f, "=== Hedging Simulation ({}) ===", self.run_id)?;
        writeln!(f, "Horizon:      {} months ({} days)", self.months, self.horizon_days)?;
        writeln!(f, "Exposure:     {:.2} USD", self.exposure)?;
        writeln!(f, "Spot (S0):    {:.4} DKK/USD", self.spot_rate)?;
        writeln!(f, "Forward:      {:.4} DKK/USD", self.forward_quote.forward_rate)?;
        writeln!(
            f,
            "Put:          {}m strike {:.4}, premium {:.2} USD",
            self.option_product.maturity_months,
            self.option_product.strike,
            self.option_product.premium
        )?;
        writeln!(
            f,
            "GARCH(1,1):   mu={:.5} omega={:.5} alpha={:.4} beta={:.4}",
            self.model.mu, self.model.omega, self.model.alpha, self.model.beta
        )?;
        writeln!(f, "Paths:        {}", self.terminal_rates.len())?;

        writeln!(f, "\n{:<10} {:>16} {:>16} {:>16}", "", "Unhedged", "Forward", "Put option")?;
        let rows = [
            ("Mean", s.unhedged.mean, s.option.mean),
            ("Std", s.unhedged.std, s.option.std),
            ("Median", s.unhedged.median, s.option.median),
            ("95% VaR", s.unhedged.var_95, s.option.var_95),
            ("Min", s.unhedged.min, s.option.min),
            ("Max", s.unhedged.max, s.option.max),
        ];
        for (label, unhedged, option) in rows {
            let forward = if label == "Std" { 0.0 } else { s.forward.revenue };
            writeln!(f, "{:<10} {:>16.2} {:>16.2} {:>16.2}", label, unhedged, forward, option)?;
        }
        Ok(())
    }
}

/// Sequences one hedging simulation from history to summary statistics.
///
/// Holds no per-run state, so one orchestrator can serve concurrent runs.
pub struct SimulationOrchestrator {
    config: SimulationConfig,
    prices: Box<dyn PriceHistorySource>,
    forwards: Box<dyn ForwardQuoteSource>,
    model: Box<dyn VolatilityModel>,
    catalog: OptionProductCatalog,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl SimulationOrchestrator {
    /// Orchestrator using maximum-likelihood GARCH and the standard catalog.
    pub fn new(
        config: SimulationConfig,
        prices: impl PriceHistorySource + 'static,
        forwards: impl ForwardQuoteSource + 'static,
    ) -> Self {
        let model = GarchEstimator::new(config.rescale_factor);
        Self {
            config,
            prices: Box::new(prices),
            forwards: Box::new(forwards),
            model: Box::new(model),
            catalog: OptionProductCatalog::standard(),
            progress: None,
        }
    }

    pub fn with_model(mut self, model: impl VolatilityModel + 'static) -> Self {
        self.model = Box::new(model);
        self
    }

    pub fn with_catalog(mut self, catalog: OptionProductCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &OptionProductCatalog {
        &self.catalog
    }

    pub fn run(&self, request: &RunRequest) -> HedgingResult<SimulationResult> {
        self.simulate_hedging_strategy(request.months, request.exposure, request.num_simulations)
    }

    /// Simulate revenue for converting `exposure` USD in `months` months
    /// unhedged, with a forward, and with a put.
    pub fn simulate_hedging_strategy(
        &self,
        months: f64,
        exposure: f64,
        num_simulations: usize,
    ) -> HedgingResult<SimulationResult> {
        let request = RunRequest {
            months,
            exposure,
            num_simulations,
        };
        let days = request.validate()?;
        self.config.validate()?;
        let run_id = Uuid::new_v4();

        log::info!(
            "run {}: {} months ({} days), exposure {}, {} paths",
            run_id,
            months,
            days,
            exposure,
            num_simulations
        );

        self.notify(ProgressEvent::status(
            run_id,
            format!("Loading {} price history", self.config.ticker),
        ));
        let history = self.prices.price_history(
            &self.config.ticker,
            self.config.start_date,
            self.config.end_date,
        )?;
        if history.pair() != &self.config.source_pair {
            return Err(HedgingError::data_source(format!(
                "history is quoted as {}, expected {}",
                history.pair(),
                self.config.source_pair
            )));
        }
        let returns = ReturnSeriesBuilder::new(self.config.target_pair.clone(), self.config.min_observations)
            .build(&history)?;
        let spot = returns.last_rate();
        log::info!(
            "run {}: {} returns, last rate {:.4} on {}",
            run_id,
            returns.len(),
            spot,
            returns.last_date()
        );

        self.notify(ProgressEvent::status(
            run_id,
            format!("Fitting GARCH(1,1) to {} returns", returns.len()),
        ));
        let params = self.model.fit(&returns)?;

        let quote = self.forwards.forward_quote(months)?;
        let option = self.catalog.select(months)?.scaled(exposure)?;
        let engine = PayoffEngine::new(exposure, spot)?;

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let simulator = PathSimulator::new(params.clone(), spot)?
            .with_seed(seed)
            .with_burn_in(self.config.burn_in);

        let batch = self.config.batch_size.unwrap_or(num_simulations).max(1);
        let mut terminal_rates = Vec::with_capacity(num_simulations);
        let mut start = 0;
        while start < num_simulations {
            let end = (start + batch).min(num_simulations);
            terminal_rates.extend(simulator.simulate_range(days, start..end));
            self.notify(ProgressEvent::batch(run_id, end, num_simulations));
            start = end;
        }

        let outcomes = engine.evaluate(&terminal_rates, &quote, &option)?;
        let summary_stats = outcomes.summary()?;
        log::info!(
            "run {}: unhedged mean {:.2}, forward {:.2}, option mean {:.2}",
            run_id,
            summary_stats.unhedged.mean,
            summary_stats.forward.revenue,
            summary_stats.option.mean
        );
        self.notify(ProgressEvent::status(run_id, "Simulation complete"));

        Ok(SimulationResult {
            run_id,
            months,
            horizon_days: days,
            exposure,
            seed,
            spot_rate: spot,
            model: params,
            forward_quote: quote,
            option_product: option,
            premium_per_unit: outcomes.premium_per_unit,
            terminal_rates,
            unhedged_revenue: outcomes.unhedged,
            forward_revenue: outcomes.forward,
            option_revenue: outcomes.option,
            summary_stats,
        })
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(sink) = &self.progress {
            if let Err(e) = sink.notify(&event) {
                log::warn!("dropping progress event for run {}: {}", event.run_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::PriceSeries;
    use crate::data::source::{FixedForwardSource, StaticPriceSource};
    use crate::simulation::progress::{ProgressError, RecordingProgressSink};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Prefitted(GarchParams);

    impl VolatilityModel for Prefitted {
        fn fit(&self, _returns: &crate::core::series::ReturnSeries) -> HedgingResult<GarchParams> {
            Ok(self.0.clone())
        }
    }

    struct CountingSource {
        inner: StaticPriceSource,
        calls: Arc<AtomicUsize>,
    }

    impl PriceHistorySource for CountingSource {
        fn price_history(
            &self,
            ticker: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> HedgingResult<PriceSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.price_history(ticker, start, end)
        }
    }

    fn history(pair: &CurrencyPair, n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        PriceSeries::from_observations(
            pair.clone(),
            (0..n).map(|i| {
                let wobble = ((i as f64) * 0.7).sin() * 0.002;
                (start + chrono::Duration::days(i as i64), Some(0.15 + wobble))
            }),
        )
    }

    fn volatile_params() -> GarchParams {
        GarchParams {
            mu: 0.0,
            omega: 0.01,
            alpha: 0.05,
            beta: 0.9,
            rescale_factor: 100.0,
            terminal_variance: 0.2,
            log_likelihood: None,
            observations: 500,
        }
    }

    fn orchestrator(config: SimulationConfig) -> SimulationOrchestrator {
        let prices = StaticPriceSource::new(history(&config.source_pair, 600));
        SimulationOrchestrator::new(
            config,
            prices,
            FixedForwardSource {
                spot_rate: 6.67,
                forward_rate: 6.7,
            },
        )
        .with_model(Prefitted(volatile_params()))
    }

    #[test]
    fn test_horizon_days() {
        assert_eq!(horizon_days(6.0), 183);
        assert_eq!(horizon_days(3.0), 91);
        assert_eq!(horizon_days(12.0), 365);
        assert_eq!(horizon_days(0.01), 0);
    }

    #[test]
    fn test_zero_simulations_rejected_before_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = SimulationConfig::default();
        let source = CountingSource {
            inner: StaticPriceSource::new(history(&config.source_pair, 600)),
            calls: calls.clone(),
        };
        let orch = SimulationOrchestrator::new(
            config,
            source,
            FixedForwardSource {
                spot_rate: 6.67,
                forward_rate: 6.7,
            },
        );
        let err = orch.simulate_hedging_strategy(6.0, 1_000_000.0, 0).unwrap_err();
        assert!(matches!(err, HedgingError::InvalidExposure(_)));
        assert!(orch.simulate_hedging_strategy(6.0, -1.0, 10).is_err());
        assert!(orch.simulate_hedging_strategy(0.0, 1.0, 10).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_batched_run_matches_unbatched() {
        let config = SimulationConfig {
            start_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            seed: Some(2024),
            ..Default::default()
        };
        let whole = orchestrator(config.clone())
            .simulate_hedging_strategy(6.0, 1_000_000.0, 2_500)
            .unwrap();
        let batched = orchestrator(SimulationConfig {
            batch_size: Some(700),
            ..config
        })
        .simulate_hedging_strategy(6.0, 1_000_000.0, 2_500)
        .unwrap();

        assert_eq!(whole.terminal_rates(), batched.terminal_rates());
        assert_eq!(whole.summary_stats(), batched.summary_stats());
    }

    #[test]
    fn test_progress_events_per_batch() {
        let sink = Arc::new(RecordingProgressSink::new());
        let config = SimulationConfig {
            batch_size: Some(400),
            seed: Some(1),
            ..Default::default()
        };
        let result = orchestrator(config)
            .with_progress(sink.clone())
            .simulate_hedging_strategy(3.0, 50_000.0, 1_000)
            .unwrap();

        let batches: Vec<usize> = sink
            .events()
            .iter()
            .filter_map(|e| e.payload.completed)
            .collect();
        assert_eq!(batches, vec![400, 800, 1_000]);
        assert!(sink.events().iter().all(|e| e.run_id == result.run_id()));
    }

    #[test]
    fn test_failing_progress_sink_is_ignored() {
        let failing = Arc::new(|_: &ProgressEvent| -> Result<(), ProgressError> {
            Err(ProgressError("transport down".into()))
        });
        let config = SimulationConfig {
            seed: Some(3),
            ..Default::default()
        };
        let result = orchestrator(config)
            .with_progress(failing)
            .simulate_hedging_strategy(6.0, 10_000.0, 100);
        assert!(result.is_ok());
    }

    #[test]
    fn test_wrong_history_convention_rejected() {
        let config = SimulationConfig::default();
        let prices = StaticPriceSource::new(history(&"EUR/USD".parse().unwrap(), 600));
        let orch = SimulationOrchestrator::new(
            config,
            prices,
            FixedForwardSource {
                spot_rate: 6.67,
                forward_rate: 6.7,
            },
        );
        let err = orch.simulate_hedging_strategy(6.0, 1.0, 10).unwrap_err();
        assert!(matches!(err, HedgingError::DataSource(_)));
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let config = SimulationConfig::default();
        let prices = StaticPriceSource::new(history(&config.source_pair, 100));
        let orch = SimulationOrchestrator::new(
            config,
            prices,
            FixedForwardSource {
                spot_rate: 6.67,
                forward_rate: 6.7,
            },
        );
        let err = orch.simulate_hedging_strategy(6.0, 1.0, 10).unwrap_err();
        assert!(matches!(err, HedgingError::InsufficientData { .. }));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"seed": 7, "batch_size": 1000}"#).unwrap();
        let config = SimulationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.batch_size, Some(1000));
        assert_eq!(config.ticker, "DKKUSD=X");
        assert_eq!(config.burn_in, 100);
    }

    #[test]
    fn test_config_validation() {
        let bad = SimulationConfig {
            batch_size: Some(0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = SimulationConfig {
            target_pair: "EUR/GBP".parse().unwrap(),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(SimulationConfig::default().validate().is_ok());
    }
}
