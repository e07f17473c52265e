pub mod handle;

use std::collections::BTreeMap;

use crate::domain::series::{SeriesSummary, TimeSeries};
use crate::error::ForecastError;
use crate::ingest::source::LoadReport;

/// Every loaded commodity series, keyed by lower-cased name.
///
/// Built once and then only read; iteration order (ascending key) is the order used for
/// aggregate operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    series: BTreeMap<String, TimeSeries>,
}

impl SeriesStore {
    pub fn from_report(report: LoadReport) -> Self {
        report.loaded.into_iter().collect()
    }

    pub fn get_series(&self, name: &str) -> Result<&TimeSeries, ForecastError> {
        self.series
            .get(&canonical_key(name))
            .ok_or_else(|| ForecastError::NotFound {
                name: name.trim().to_string(),
            })
    }

    pub fn get_summary(&self, name: &str) -> Result<SeriesSummary, ForecastError> {
        let series = self.get_series(name)?;
        Ok(series.summary(&display_name(&canonical_key(name))))
    }

    /// Display names of all commodities.
    pub fn list_names(&self) -> Vec<String> {
        self.series.keys().map(|k| display_name(k)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimeSeries)> {
        self.series.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<(String, TimeSeries)> for SeriesStore {
    fn from_iter<I: IntoIterator<Item = (String, TimeSeries)>>(iter: I) -> Self {
        let mut series = BTreeMap::new();
        for (name, entry) in iter {
            let key = canonical_key(&name);
            if series.insert(key, entry).is_some() {
                tracing::warn!(commodity = %name, "duplicate commodity replaced an earlier series");
            }
        }
        Self { series }
    }
}

pub fn canonical_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Title case: the first letter of every alphabetic run upper-cased, the rest lower-cased.
pub fn display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
