use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fx_hedging_engine::core::series::{PriceSeries, ReturnSeriesBuilder};
use fx_hedging_engine::hedging::catalog::OptionProductCatalog;
use fx_hedging_engine::hedging::payoff::PayoffEngine;
use fx_hedging_engine::core::quote::ForwardRateQuote;
use fx_hedging_engine::model::garch::{GarchEstimator, GarchParams, VolatilityModel};
use fx_hedging_engine::simulation::path::PathSimulator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn params() -> GarchParams {
    GarchParams {
        mu: 0.005,
        omega: 0.004,
        alpha: 0.05,
        beta: 0.93,
        rescale_factor: 100.0,
        terminal_variance: 0.2,
        log_likelihood: None,
        observations: 1_800,
    }
}

fn history(n: usize) -> PriceSeries {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.004).unwrap();
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let mut price = 0.15;
    PriceSeries::from_observations(
        "DKK/USD".parse().unwrap(),
        (0..n).map(|i| {
            price *= f64::exp(noise.sample(&mut rng));
            (start + Duration::days(i as i64), Some(price))
        }),
    )
}

fn bench_simulate_1k_paths(c: &mut Criterion) {
    let sim = PathSimulator::new(params(), 6.9).unwrap().with_seed(1);
    c.bench_function("simulate_1k_paths_6m", |b| {
        b.iter(|| sim.simulate(black_box(183), black_box(1_000)))
    });
}

fn bench_simulate_10k_paths(c: &mut Criterion) {
    let sim = PathSimulator::new(params(), 6.9).unwrap().with_seed(1);
    c.bench_function("simulate_10k_paths_6m", |b| {
        b.iter(|| sim.simulate(black_box(183), black_box(10_000)))
    });
}

fn bench_garch_fit(c: &mut Criterion) {
    let returns = ReturnSeriesBuilder::new("USD/DKK".parse().unwrap(), 250)
        .build(&history(1_800))
        .unwrap();
    let estimator = GarchEstimator::default();
    c.bench_function("garch_fit_1800_obs", |b| {
        b.iter(|| estimator.fit(black_box(&returns)))
    });
}

fn bench_payoffs(c: &mut Criterion) {
    let rates = PathSimulator::new(params(), 6.9)
        .unwrap()
        .with_seed(3)
        .simulate(183, 10_000);
    let engine = PayoffEngine::new(1_000_000.0, 6.9).unwrap();
    let quote = ForwardRateQuote::from_parity(6.9, 0.045, 0.025, 6.0).unwrap();
    let option = OptionProductCatalog::standard()
        .select(6.0)
        .unwrap()
        .scaled(1_000_000.0)
        .unwrap();
    c.bench_function("payoffs_and_summary_10k", |b| {
        b.iter(|| {
            engine
                .evaluate(black_box(&rates), &quote, &option)
                .and_then(|out| out.summary())
        })
    });
}

criterion_group!(
    benches,
    bench_simulate_1k_paths,
    bench_simulate_10k_paths,
    bench_garch_fit,
    bench_payoffs
);
criterion_main!(benches);
