//! Closing-price history stored as CSV.
//!
//! Expected layout is a header row containing `Date` and `Close` columns
//! (any case, any position), one row per trading day. Lines starting with
//! `/` are comments. Rows whose date or close cannot be parsed are dropped,
//! which also skips the extra header rows some downloaders emit.

use chrono::NaiveDate;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::core::currency::CurrencyPair;
use crate::core::error::{HedgingError, HedgingResult};
use crate::core::series::PriceSeries;
use crate::data::source::PriceHistorySource;

/// Read a price CSV into a series quoted as `pair`.
pub fn read_price_csv(path: &Path, pair: &CurrencyPair) -> HedgingResult<PriceSeries> {
    let file = File::open(path).map_err(|e| {
        HedgingError::data_source(format!("cannot open '{}': {}", path.display(), e))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'/'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                HedgingError::data_source(format!(
                    "'{}' has no '{}' column (found {:?})",
                    path.display(),
                    name,
                    headers.iter().collect::<Vec<_>>()
                ))
            })
    };
    let date_idx = column("Date")?;
    let close_idx = column("Close")?;

    let mut observations = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let date = record.get(date_idx).and_then(parse_date);
        let close = record
            .get(close_idx)
            .and_then(|s| s.parse::<f64>().ok());
        match date {
            Some(date) => observations.push((date, close)),
            None => skipped += 1,
        }
    }

    let series = PriceSeries::from_observations(pair.clone(), observations);
    log::debug!(
        "read {} prices from '{}' ({} rows without a date skipped)",
        series.len(),
        path.display(),
        skipped
    );
    Ok(series)
}

/// Write `series` as a `Date,Close` CSV, creating parent directories.
pub fn write_price_csv(path: &Path, series: &PriceSeries) -> HedgingResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Date", "Close"])?;
    for point in series.points() {
        writer.write_record([point.date.format("%Y-%m-%d").to_string(), point.price.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Serves `<dir>/<ticker>.csv`.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
    pair: CurrencyPair,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>, pair: CurrencyPair) -> Self {
        Self {
            dir: dir.into(),
            pair,
        }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker))
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }
}

impl PriceHistorySource for CsvPriceSource {
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HedgingResult<PriceSeries> {
        let series = read_price_csv(&self.path_for(ticker), &self.pair)?.between(start, end);
        if series.is_empty() {
            return Err(HedgingError::data_source(format!(
                "no {} prices between {} and {}",
                ticker, start, end
            )));
        }
        Ok(series)
    }
}
