//! # fx-hedging-engine
//!
//! Monte Carlo comparison of FX hedging strategies for a USD receivable
//! converted into DKK.
//!
//! A GARCH(1,1) model is fitted to historical USD/DKK log-returns, future
//! terminal rates are simulated from it, and the DKK revenue is evaluated
//! for three strategies: staying unhedged, locking in a forward, and buying
//! a protective put.
//!
//! ## Architecture
//!
//! - **core**: Currency pairs, price and return series, forward quotes, errors
//! - **data**: Price-history sources (CSV files, on-disk cache, retry)
//! - **model**: GARCH(1,1) maximum-likelihood fit and its optimizer
//! - **hedging**: Option catalog, strategy payoffs, summary statistics
//! - **simulation**: Path simulation, progress events, run orchestration

pub mod core;
pub mod data;
pub mod hedging;
pub mod model;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::{CurrencyCode, CurrencyPair};
    pub use crate::core::error::{HedgingError, HedgingResult};
    pub use crate::core::quote::ForwardRateQuote;
    pub use crate::core::series::{PriceSeries, ReturnSeries, ReturnSeriesBuilder};
    pub use crate::data::source::{ForwardQuoteSource, PriceHistorySource};
    pub use crate::hedging::catalog::{scale_option_product, OptionProduct, OptionProductCatalog};
    pub use crate::hedging::stats::SummaryStatistics;
    pub use crate::model::garch::{GarchEstimator, GarchParams, VolatilityModel};
    pub use crate::simulation::orchestrator::{
        RunRequest, SimulationConfig, SimulationOrchestrator, SimulationResult,
    };
    pub use crate::simulation::path::PathSimulator;
}
