use anyhow::Context;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::domain::series::TimeSeries;
use crate::ingest::csv_file::read_series_file;
use crate::storage::canonical_key;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: Vec<(String, TimeSeries)>,
    pub skipped: Vec<SkippedSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

#[async_trait::async_trait]
pub trait SeriesSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn load_all(&self) -> anyhow::Result<LoadReport>;
}

/// One `<commodity>.csv` per commodity in a directory.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl SeriesSource for CsvDirectorySource {
    fn source_name(&self) -> &'static str {
        "csv_directory"
    }

    async fn load_all(&self) -> anyhow::Result<LoadReport> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_dir(&dir))
            .await
            .context("csv loader task failed")?
    }
}

fn load_dir(dir: &Path) -> anyhow::Result<LoadReport> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read data directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list data directory {}", dir.display()))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    for path in paths {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(canonical_key) else {
            continue;
        };

        if !seen.insert(name.clone()) {
            tracing::warn!(
                commodity = %name,
                path = %path.display(),
                "skipping series: commodity already loaded from another file"
            );
            report.skipped.push(SkippedSource {
                reason: format!("duplicate commodity name: {}", path.display()),
                name,
            });
            continue;
        }

        match read_series_file(&path) {
            Ok(series) => {
                tracing::info!(commodity = %name, records = series.len(), "loaded series");
                report.loaded.push((name, series));
            }
            Err(err) => {
                tracing::warn!(
                    commodity = %name,
                    path = %path.display(),
                    error = %err,
                    "skipping series"
                );
                report.skipped.push(SkippedSource {
                    name,
                    reason: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        "data directory loaded"
    );
    Ok(report)
}
