//! CSV file price source.
//!
//! Reads `<dir>/<SYMBOL>.csv` with a header row and the columns
//! `timestamp,open,high,low,close,volume`.

use crate::domain::bar::PriceBar;
use crate::domain::error::TraderError;
use crate::ports::price_port::PriceSource;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const SOURCE: &str = "csv price source";

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvPriceSource {
    base_path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TraderError> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TraderError::unavailable(SOURCE, format!("invalid timestamp '{}'", raw)))
}

fn field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, TraderError> {
    let raw = record
        .get(index)
        .ok_or_else(|| TraderError::unavailable(SOURCE, format!("missing {} column", name)))?;
    raw.trim()
        .parse()
        .map_err(|_| TraderError::unavailable(SOURCE, format!("invalid {} value '{}'", name, raw)))
}

impl PriceSource for CsvPriceSource {
    fn fetch(&mut self, symbol: &str, bar_count: usize) -> Result<Vec<PriceBar>, TraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            TraderError::unavailable(SOURCE, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| TraderError::unavailable(SOURCE, format!("CSV parse error: {}", e)))?;
            let timestamp = record
                .get(0)
                .ok_or_else(|| TraderError::unavailable(SOURCE, "missing timestamp column"))
                .and_then(parse_timestamp)?;

            bars.push(PriceBar {
                timestamp,
                open: field(&record, 1, "open")?,
                high: field(&record, 2, "high")?,
                low: field(&record, 3, "low")?,
                close: field(&record, 4, "close")?,
                volume: field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        let skip = bars.len().saturating_sub(bar_count);
        Ok(bars.split_off(skip))
    }
}
