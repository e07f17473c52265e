//! Reads one commodity's history from a CSV file with `Month, Year, Rainfall, WPI` columns.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::series::{Observation, TimeSeries};
use crate::error::IngestError;

const MONTH: &str = "Month";
const YEAR: &str = "Year";
const RAINFALL: &str = "Rainfall";
const PRICE_INDEX: &str = "WPI";

struct Columns {
    month: usize,
    year: usize,
    rainfall: usize,
    price_index: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(IngestError::MissingColumn(name))
        };
        Ok(Self {
            month: find(MONTH)?,
            year: find(YEAR)?,
            rainfall: find(RAINFALL)?,
            price_index: find(PRICE_INDEX)?,
        })
    }
}

pub fn read_series_file(path: &Path) -> Result<TimeSeries, IngestError> {
    let file = File::open(path)?;
    read_series(file)
}

pub fn read_series<R: Read>(reader: R) -> Result<TimeSeries, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut observations = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        observations.push(parse_row(&record, &columns, line)?);
    }

    TimeSeries::try_new(observations).map_err(|e| IngestError::Validation(format!("{e:#}")))
}

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    line: usize,
) -> Result<Observation, IngestError> {
    let invalid = |message: String| IngestError::InvalidRow { line, message };

    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| invalid(format!("missing value in {name}")))
    };

    let month = field(columns.month, MONTH)?;
    let month = parse_whole(month)
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| invalid(format!("invalid {MONTH} value {month:?}")))?;

    let year = field(columns.year, YEAR)?;
    let year = parse_whole(year)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| invalid(format!("invalid {YEAR} value {year:?}")))?;

    let price = field(columns.price_index, PRICE_INDEX)?;
    let price_index = price
        .parse::<f64>()
        .map_err(|_| invalid(format!("invalid {PRICE_INDEX} value {price:?}")))?;

    let rainfall = match record.get(columns.rainfall).filter(|f| !f.is_empty()) {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| invalid(format!("invalid {RAINFALL} value {raw:?}")))?,
        None => 0.0,
    };

    Ok(Observation::new(year, month, price_index, rainfall))
}

/// Integer cell, also accepting float spellings such as `3.0`.
fn parse_whole(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}
