//! CSV input and output.
//!
//! Results are written with one header per [`DailyResultRow`] field and floats
//! in shortest round-trip form, so a reload reproduces every value exactly.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::timeseries::RateSeries;
use crate::core::types::{Date, PriceBar, PriceSeries};
use crate::simulation::result::DailyResultRow;

const DATE_COLUMNS: &[&str] = &["date", "datetime", "timestamp"];
const CLOSE_COLUMNS: &[&str] = &["close"];
const ADJ_CLOSE_COLUMNS: &[&str] = &["adj close", "adjusted close", "adj_close", "adjclose"];
const RATE_COLUMNS: &[&str] = &["rf_annual", "rate", "close"];

/// How rate values in a CSV are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnits {
    /// 0.045 means 4.5%.
    #[default]
    Decimal,
    /// 4.5 means 4.5%.
    Percent,
}

/// Write result rows as CSV.
pub fn write_results<W: Write>(rows: &[DailyResultRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write result rows to a CSV file.
pub fn write_results_file(rows: &[DailyResultRow], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_results(rows, File::create(path)?)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote results csv");
    Ok(())
}

/// Read result rows previously written by [`write_results`].
pub fn read_results<R: Read>(reader: R) -> Result<Vec<DailyResultRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize()
        .map(|row| row.map_err(SimError::from))
        .collect()
}

/// Read result rows from a CSV file.
pub fn read_results_file(path: impl AsRef<Path>) -> Result<Vec<DailyResultRow>> {
    read_results(File::open(path)?)
}

/// Parse an ISO date, tolerating a trailing time component.
pub fn parse_date(text: &str) -> Result<Date> {
    let text = text.trim();
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| SimError::parse(format!("invalid date '{text}': {e}")))
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn parse_field(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    let field = record.get(idx)?.trim();
    if field.is_empty() {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a price table with `Date`, `Close` and optionally `Adj Close` columns.
///
/// Rows with a missing or unparsable value are dropped; the remainder is sorted by date.
pub fn read_prices<R: Read>(reader: R) -> Result<PriceSeries> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = find_column(&headers, DATE_COLUMNS).ok_or_else(|| SimError::missing_column("Date"))?;
    let close_idx =
        find_column(&headers, CLOSE_COLUMNS).ok_or_else(|| SimError::missing_column("Close"))?;
    let adj_idx = find_column(&headers, ADJ_CLOSE_COLUMNS);

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.records() {
        let record = record?;
        let date = match record.get(date_idx).map(parse_date) {
            Some(Ok(date)) => date,
            _ => {
                dropped += 1;
                continue;
            }
        };
        let close = parse_field(&record, close_idx);
        let adj_close = match adj_idx {
            Some(idx) => parse_field(&record, idx),
            None => close,
        };
        match (close, adj_close) {
            (Some(close), Some(adj_close)) => bars.push(PriceBar {
                date,
                close,
                adj_close,
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = bars.len(), "dropped incomplete price rows");
    }
    bars.sort_by_key(|b| b.date);
    PriceSeries::from_bars(&bars)
}

/// Read a price table from a file.
pub fn read_prices_file(path: impl AsRef<Path>) -> Result<PriceSeries> {
    read_prices(File::open(path)?)
}

/// Read a rate table with a `Date` column and one of `RF_Annual`, `rate`, `Close`.
pub fn read_rates<R: Read>(reader: R, units: RateUnits) -> Result<RateSeries> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = find_column(&headers, DATE_COLUMNS).ok_or_else(|| SimError::missing_column("Date"))?;
    let rate_idx = find_column(&headers, RATE_COLUMNS)
        .ok_or_else(|| SimError::invalid_input("rate table needs a RF_Annual, rate or Close column"))?;

    let mut points: Vec<(Date, f64)> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let Some(Ok(date)) = record.get(date_idx).map(parse_date) else {
            continue;
        };
        if let Some(rate) = parse_field(&record, rate_idx) {
            points.push((date, rate));
        }
    }
    points.sort_by_key(|(d, _)| *d);

    let (dates, values): (Vec<Date>, Vec<f64>) = points.into_iter().unzip();
    match units {
        RateUnits::Decimal => RateSeries::new(dates, values),
        RateUnits::Percent => RateSeries::from_percent_quotes(dates, values),
    }
}

/// Read a rate table from a file.
pub fn read_rates_file(path: impl AsRef<Path>, units: RateUnits) -> Result<RateSeries> {
    read_rates(File::open(path)?, units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_prices_yahoo_layout() {
        let data = "Date,Open,Close,Adj Close,Volume\n\
                    2024-01-03,1,101.0,99.0,10\n\
                    2024-01-02,1,100.0,98.0,10\n\
                    2024-01-04,1,,97.0,10\n";
        let prices = read_prices(data.as_bytes()).unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(prices.close(), &[100.0, 101.0]);
        assert_eq!(prices.adj_close(), &[98.0, 99.0]);
    }

    #[test]
    fn test_read_prices_without_adj_close() {
        let data = "date,close\n2024-01-02 00:00:00,100.0\n";
        let prices = read_prices(data.as_bytes()).unwrap();
        assert_eq!(prices.adj_close(), &[100.0]);
    }

    #[test]
    fn test_missing_close_column() {
        let data = "Date,Open\n2024-01-02,1\n";
        let err = read_prices(data.as_bytes()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let data = "Date,Close\n2024-01-02,1\n2024-01-02,2\n";
        assert!(read_prices(data.as_bytes()).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_read_rates_percent() {
        let data = "Date,Close\n2024-01-02,5.25\n2024-01-03,\n2024-01-04,5.0\n";
        let rates = read_rates(data.as_bytes(), RateUnits::Percent).unwrap();
        assert_eq!(rates.len(), 2);
        assert!((rates.values[0] - 0.0525).abs() < 1e-12);
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-02-30").is_err());
        assert_eq!(
            parse_date(" 2024-02-29T00:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }
}
