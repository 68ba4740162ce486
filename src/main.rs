//! fx-hedging CLI
//!
//! Compare FX hedging strategies from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Simulate a 6 month, 1M USD receivable from prices/DKKUSD=X.csv
//! fx-hedging simulate --prices prices --usd-rate 4.33 --dkk-rate 2.35
//!
//! # Reproducible run, JSON output
//! fx-hedging simulate --prices prices --usd-rate 4.33 --dkk-rate 2.35 --seed 42 --format json
//!
//! # Fit the volatility model only
//! fx-hedging fit --prices prices
//!
//! # List option products scaled to a notional
//! fx-hedging catalog --notional 1000000
//!
//! # Price a forward by interest parity
//! fx-hedging forward --spot 6.89 --usd-rate 4.33 --dkk-rate 2.35 --months 3
//! ```

use fx_hedging_engine::core::error::{FailureReport, HedgingError, HedgingResult};
use fx_hedging_engine::core::quote::ForwardRateQuote;
use fx_hedging_engine::core::series::ReturnSeriesBuilder;
use fx_hedging_engine::data::cache::{CacheConfig, CachedPriceSource};
use fx_hedging_engine::data::csv_file::CsvPriceSource;
use fx_hedging_engine::data::retry::{RetryPolicy, RetryingPriceSource};
use fx_hedging_engine::data::source::{ParityForwardSource, PriceHistorySource};
use fx_hedging_engine::hedging::catalog::OptionProductCatalog;
use fx_hedging_engine::model::garch::{GarchEstimator, VolatilityModel};
use fx_hedging_engine::simulation::orchestrator::{
    RunRequest, SimulationConfig, SimulationOrchestrator,
};
use fx_hedging_engine::simulation::progress::LogProgressSink;
use std::path::Path;
use std::process;
use std::str::FromStr;
use std::sync::Arc;

fn print_usage() {
    eprintln!(
        r#"fx-hedging — Monte Carlo comparison of USD/DKK hedging strategies

USAGE:
    fx-hedging <COMMAND> [OPTIONS]

COMMANDS:
    simulate    Simulate unhedged, forward and put revenue
    fit         Fit GARCH(1,1) to the price history and print the parameters
    catalog     List the option products
    forward     Price a forward by covered interest parity
    help        Show this message

OPTIONS (simulate, fit):
    --prices <DIR>        Directory holding <ticker>.csv (default: data)
    --cache-dir <DIR>     Cache price history under DIR
    --config <FILE>       JSON simulation config
    --format <FORMAT>     Output format: text (default) or json

OPTIONS (simulate):
    --months <N>          Horizon in months (default: 6)
    --exposure <USD>      Amount to convert (default: 1000000)
    --sims <N>            Number of paths (default: 10000)
    --usd-rate <PCT>      USD money-market rate in percent (required)
    --dkk-rate <PCT>      DKK money-market rate in percent (required)
    --spot <RATE>         Spot DKK per USD (default: last close)
    --seed <N>            Random seed
    --batch-size <N>      Paths per progress batch

OPTIONS (catalog):
    --notional <USD>      Scale every product to this notional

OPTIONS (forward):
    --spot, --usd-rate, --dkk-rate (required), --months (default: 6)

EXAMPLES:
    fx-hedging simulate --prices data --usd-rate 4.33 --dkk-rate 2.35
    fx-hedging simulate --prices data --usd-rate 4.33 --dkk-rate 2.35 --sims 50000 --seed 7
    fx-hedging fit --prices data --format json
    fx-hedging catalog --notional 250000
    fx-hedging forward --spot 6.89 --usd-rate 4.33 --dkk-rate 2.35 --months 12"#
    );
}

#[derive(Debug, Clone, Default)]
struct Options {
    prices: Option<String>,
    cache_dir: Option<String>,
    config: Option<String>,
    json: bool,
    months: Option<f64>,
    exposure: Option<f64>,
    sims: Option<usize>,
    usd_rate: Option<f64>,
    dkk_rate: Option<f64>,
    spot: Option<f64>,
    seed: Option<u64>,
    batch_size: Option<usize>,
    notional: Option<f64>,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    args.get(i).map(String::as_str).unwrap_or_else(|| {
        eprintln!("{} requires a value", flag);
        process::exit(1);
    })
}

fn number<T: FromStr>(args: &[String], i: usize, flag: &str) -> T {
    let raw = value(args, i, flag);
    raw.parse().unwrap_or_else(|_| {
        eprintln!("{} requires a number, got '{}'", flag, raw);
        process::exit(1);
    })
}

fn parse_options(args: &[String]) -> Options {
    let mut opts = Options::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--prices" => opts.prices = Some(value(args, i, flag).to_string()),
            "--cache-dir" => opts.cache_dir = Some(value(args, i, flag).to_string()),
            "--config" => opts.config = Some(value(args, i, flag).to_string()),
            "--format" => {
                opts.json = match value(args, i, flag) {
                    "json" => true,
                    "text" => false,
                    other => {
                        eprintln!("--format requires 'text' or 'json', got '{}'", other);
                        process::exit(1);
                    }
                }
            }
            "--months" => opts.months = Some(number(args, i, flag)),
            "--exposure" => opts.exposure = Some(number(args, i, flag)),
            "--sims" => opts.sims = Some(number(args, i, flag)),
            "--usd-rate" => opts.usd_rate = Some(number(args, i, flag)),
            "--dkk-rate" => opts.dkk_rate = Some(number(args, i, flag)),
            "--spot" => opts.spot = Some(number(args, i, flag)),
            "--seed" => opts.seed = Some(number(args, i, flag)),
            "--batch-size" => opts.batch_size = Some(number(args, i, flag)),
            "--notional" => opts.notional = Some(number(args, i, flag)),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }
    opts
}

/// Print a structured failure and exit. Input errors exit with 2.
fn fail(err: &HedgingError, json: bool) -> ! {
    let report = FailureReport::from(err);
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{}", s),
            Err(_) => eprintln!("{}: {}", report.kind, report.message),
        }
    } else {
        eprintln!("Error ({}): {}", report.kind, report.message);
    }
    process::exit(if err.is_input_error() { 2 } else { 1 });
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(opts: &Options) -> HedgingResult<SimulationConfig> {
    let mut config = match &opts.config {
        Some(path) => SimulationConfig::from_json_file(Path::new(path))?,
        None => SimulationConfig::default(),
    };
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    if opts.batch_size.is_some() {
        config.batch_size = opts.batch_size;
    }
    config.validate()?;
    Ok(config)
}

fn price_source(
    opts: &Options,
    config: &SimulationConfig,
) -> HedgingResult<Box<dyn PriceHistorySource>> {
    let dir = opts.prices.clone().unwrap_or_else(|| "data".to_string());
    let files = RetryingPriceSource::new(
        CsvPriceSource::new(dir, config.source_pair.clone()),
        RetryPolicy::default(),
    );
    let source: Box<dyn PriceHistorySource> = match &opts.cache_dir {
        Some(cache_dir) => Box::new(CachedPriceSource::new(
            files,
            CacheConfig {
                cache_dir: cache_dir.into(),
                ..Default::default()
            },
            config.source_pair.clone(),
        )?),
        None => Box::new(files),
    };
    Ok(source)
}

fn required_rate(rate: Option<f64>, flag: &str) -> f64 {
    rate.map(|pct| pct / 100.0).unwrap_or_else(|| {
        eprintln!("Error: {} <PCT> is required", flag);
        process::exit(1);
    })
}

fn cmd_simulate(args: &[String]) {
    let opts = parse_options(args);
    let defaults = RunRequest::default();
    let request = RunRequest {
        months: opts.months.unwrap_or(defaults.months),
        exposure: opts.exposure.unwrap_or(defaults.exposure),
        num_simulations: opts.sims.unwrap_or(defaults.num_simulations),
    };
    if let Err(e) = request.validate() {
        fail(&e, opts.json);
    }
    let usd_rate = required_rate(opts.usd_rate, "--usd-rate");
    let dkk_rate = required_rate(opts.dkk_rate, "--dkk-rate");

    let config = load_config(&opts).unwrap_or_else(|e| fail(&e, opts.json));
    let prices = price_source(&opts, &config).unwrap_or_else(|e| fail(&e, opts.json));

    let spot = match opts.spot {
        Some(spot) => spot,
        None => last_close(&*prices, &config).unwrap_or_else(|e| fail(&e, opts.json)),
    };
    let forwards = ParityForwardSource {
        spot_rate: spot,
        usd_rate,
        dkk_rate,
    };

    let mut orchestrator = SimulationOrchestrator::new(config, prices, forwards);
    if opts.batch_size.is_some() {
        orchestrator = orchestrator.with_progress(Arc::new(LogProgressSink));
    }
    let result = orchestrator.run(&request).unwrap_or_else(|e| fail(&e, opts.json));

    if opts.json {
        print_json(&result);
    } else {
        println!("{}", result);
    }
}

/// Last close in the exposure convention (DKK per USD).
fn last_close(prices: &dyn PriceHistorySource, config: &SimulationConfig) -> HedgingResult<f64> {
    prices
        .price_history(&config.ticker, config.start_date, config.end_date)?
        .in_convention(&config.target_pair)?
        .last()
        .map(|p| p.price)
        .ok_or_else(|| HedgingError::data_source(format!("no prices for {}", config.ticker)))
}

fn cmd_fit(args: &[String]) {
    let opts = parse_options(args);
    let config = load_config(&opts).unwrap_or_else(|e| fail(&e, opts.json));
    let prices = price_source(&opts, &config).unwrap_or_else(|e| fail(&e, opts.json));

    let params = prices
        .price_history(&config.ticker, config.start_date, config.end_date)
        .and_then(|history| {
            ReturnSeriesBuilder::new(config.target_pair.clone(), config.min_observations)
                .build(&history)
        })
        .and_then(|returns| GarchEstimator::new(config.rescale_factor).fit(&returns))
        .unwrap_or_else(|e| fail(&e, opts.json));

    if opts.json {
        print_json(&params);
    } else {
        println!("=== GARCH(1,1) fit: {} ===", config.ticker);
        println!("Observations:     {}", params.observations);
        println!("mu:               {:.6}", params.mu);
        println!("omega:            {:.6}", params.omega);
        println!("alpha:            {:.4}", params.alpha);
        println!("beta:             {:.4}", params.beta);
        println!("Persistence:      {:.4}", params.persistence());
        if let Some(ll) = params.log_likelihood {
            println!("Log-likelihood:   {:.2}", ll);
        }
        println!(
            "Annualised vol:   {:.2}%",
            params.annualized_volatility() * 100.0
        );
    }
}

fn cmd_catalog(args: &[String]) {
    let opts = parse_options(args);
    let catalog = OptionProductCatalog::standard();
    let products = catalog
        .products()
        .map(|p| match opts.notional {
            Some(n) => p.scaled(n),
            None => Ok(*p),
        })
        .collect::<HedgingResult<Vec<_>>>()
        .unwrap_or_else(|e| fail(&e, opts.json));

    if opts.json {
        print_json(&products);
    } else {
        println!(
            "{:<8} {:<6} {:>10} {:>16} {:>12}",
            "Tenor", "Type", "Strike", "Notional", "Premium"
        );
        for p in &products {
            println!(
                "{:<8} {:<6} {:>10.4} {:>16.2} {:>12.2}",
                format!("{}m", p.maturity_months),
                p.option_type.to_string(),
                p.strike,
                p.notional,
                p.premium
            );
        }
    }
}

fn cmd_forward(args: &[String]) {
    let opts = parse_options(args);
    let spot = opts.spot.unwrap_or_else(|| {
        eprintln!("Error: --spot <RATE> is required");
        process::exit(1);
    });
    let usd_rate = required_rate(opts.usd_rate, "--usd-rate");
    let dkk_rate = required_rate(opts.dkk_rate, "--dkk-rate");
    let months = opts.months.unwrap_or(RunRequest::default().months);

    let quote = ForwardRateQuote::from_parity(spot, usd_rate, dkk_rate, months)
        .unwrap_or_else(|e| fail(&e, opts.json));

    if opts.json {
        print_json(&quote);
    } else {
        println!("Spot:           {:.4} DKK/USD", quote.spot_rate);
        println!("USD rate:       {:.2}%", quote.usd_rate);
        println!("DKK rate:       {:.2}%", quote.dkk_rate);
        println!("Maturity:       {} months", quote.maturity_months);
        println!("Forward:        {:.4} DKK/USD", quote.forward_rate);
        println!("Forward points: {:.4}", quote.forward_points());
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "simulate" => cmd_simulate(rest),
        "fit" => cmd_fit(rest),
        "catalog" => cmd_catalog(rest),
        "forward" => cmd_forward(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
