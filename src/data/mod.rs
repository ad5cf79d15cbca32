//! Read-once dataset loading.
//!
//! The fundamentals file is loaded through a [`DatasetSource`] that callers
//! inject, rather than through process-wide state. [`CsvDatasetProvider`]
//! caches the parsed dataset and follows an explicit [`ReloadPolicy`].

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use tracing::{debug, info, warn};

use crate::error::{Result, ScreenerError};
use crate::models::StockRecord;

/// Columns the input file must carry, in export order
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "Ticker",
    "Company Name",
    "Price",
    "YTarget",
    "PE Ratio TTM",
    "PE Forward",
    "ROE",
    "ROA",
    "Dividend Paid",
    "PE_Score",
    "ROE_Score",
    "ROA_Score",
    "Dividend_Score",
];

/// Observed ranges used to bound the PE and ROE filter controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterBounds {
    pub pe_min: f64,
    pub pe_max: f64,
    pub roe_min: f64,
    pub roe_max: f64,
}

/// Immutable in-memory copy of the fundamentals file
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<StockRecord>,
}

impl Dataset {
    /// Build a dataset from already-parsed records, validating sub-scores.
    /// The column layout is the required columns in their canonical order.
    pub fn from_records(records: Vec<StockRecord>) -> Result<Self> {
        let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        Self::with_columns(columns, records)
    }

    fn with_columns(columns: Vec<String>, records: Vec<StockRecord>) -> Result<Self> {
        for (index, record) in records.iter().enumerate() {
            validate_sub_scores(record, index + 1)?;
        }

        {
            let mut seen = HashSet::new();
            for record in &records {
                if !record.ticker.is_empty() && !seen.insert(record.ticker.as_str()) {
                    warn!("Duplicate ticker {} in dataset, first row wins", record.ticker);
                }
            }
        }

        Ok(Self { columns, records })
    }

    /// Parse CSV content, checking that every required column is present
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h.trim() == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ScreenerError::MissingColumn(missing));
        }

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            // Row numbers count data rows, starting at 1
            let row_number = index + 1;
            let cells = row.map_err(|e| invalid_row(row_number, e))?;
            let mut record: StockRecord = cells
                .deserialize(Some(&headers))
                .map_err(|e| invalid_row(row_number, e))?;
            record.source_row = Some(cells);
            records.push(record);
        }

        let columns = headers.iter().map(|h| h.to_string()).collect();
        Self::with_columns(columns, records)
    }

    /// Load a dataset from a CSV file on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!("Loaded {} records from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Input header in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by ticker. The first matching row is returned.
    pub fn find(&self, ticker: &str) -> Option<&StockRecord> {
        self.records.iter().find(|r| r.ticker == ticker)
    }

    /// Unique, non-empty tickers in file order
    pub fn tickers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.ticker.as_str())
            .filter(|t| !t.is_empty() && seen.insert(*t))
            .collect()
    }

    /// Fuzzy search over ticker and company name, best match first.
    /// An empty query returns every unique ticker in file order.
    pub fn search(&self, query: &str) -> Vec<&StockRecord> {
        let query = query.trim();
        let unique = self.tickers().into_iter().filter_map(|t| self.find(t));
        if query.is_empty() {
            return unique.collect();
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut hits: Vec<(i64, &StockRecord)> = unique
            .filter_map(|record| {
                let haystack = format!("{} {}", record.ticker, record.company_name);
                matcher.fuzzy_match(&haystack, query).map(|score| (score, record))
            })
            .collect();
        // Stable, so equal scores stay in file order
        hits.sort_by(|a, b| b.0.cmp(&a.0));
        hits.into_iter().map(|(_, record)| record).collect()
    }

    /// Min/max of PE TTM and ROE over rows where the value is present
    pub fn filter_bounds(&self) -> Option<FilterBounds> {
        let (pe_min, pe_max) = min_max(self.records.iter().filter_map(|r| r.pe_ratio_ttm))?;
        let (roe_min, roe_max) = min_max(self.records.iter().filter_map(|r| r.roe))?;
        Some(FilterBounds {
            pe_min,
            pe_max,
            roe_min,
            roe_max,
        })
    }
}

fn invalid_row(row: usize, error: csv::Error) -> ScreenerError {
    ScreenerError::InvalidRow {
        row,
        message: error.to_string(),
    }
}

fn validate_sub_scores(record: &StockRecord, row: usize) -> Result<()> {
    let sub_scores = [
        ("PE_Score", record.pe_score),
        ("ROE_Score", record.roe_score),
        ("ROA_Score", record.roa_score),
        ("Dividend_Score", record.dividend_score),
    ];
    for (column, value) in sub_scores {
        if !value.is_finite() {
            return Err(ScreenerError::InvalidRow {
                row,
                message: format!("{} is not a finite number ({})", column, value),
            });
        }
    }
    Ok(())
}

pub(crate) fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// When a cached dataset is re-read from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// Load once and keep it for the lifetime of the process
    #[default]
    Never,
    /// Re-read when the file's modification time changes
    OnFileChange,
}

impl fmt::Display for ReloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadPolicy::Never => f.write_str("never"),
            ReloadPolicy::OnFileChange => f.write_str("on-change"),
        }
    }
}

impl FromStr for ReloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(ReloadPolicy::Never),
            "on-change" | "on_change" | "onchange" => Ok(ReloadPolicy::OnFileChange),
            other => Err(format!("unknown reload policy '{}', expected never or on-change", other)),
        }
    }
}

/// Source of the immutable dataset, injected into the UI and CLI
pub trait DatasetSource {
    /// Return the current dataset, loading it if needed
    fn load(&self) -> Result<Arc<Dataset>>;

    /// Discard any cached copy and read the source again
    fn reload(&self) -> Result<Arc<Dataset>>;
}

struct CachedDataset {
    dataset: Arc<Dataset>,
    modified: Option<SystemTime>,
}

/// CSV-file backed dataset provider with an explicit reload policy
pub struct CsvDatasetProvider {
    path: PathBuf,
    policy: ReloadPolicy,
    cache: Mutex<Option<CachedDataset>>,
}

impl CsvDatasetProvider {
    pub fn new(path: impl Into<PathBuf>, policy: ReloadPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    fn modified_time(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn read_into_cache(&self, cache: &mut Option<CachedDataset>) -> Result<Arc<Dataset>> {
        let modified = self.modified_time();
        let dataset = Arc::new(Dataset::from_path(&self.path)?);
        *cache = Some(CachedDataset {
            dataset: Arc::clone(&dataset),
            modified,
        });
        Ok(dataset)
    }
}

impl DatasetSource for CsvDatasetProvider {
    fn load(&self) -> Result<Arc<Dataset>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(cached) = cache.as_ref() {
            match self.policy {
                ReloadPolicy::Never => return Ok(Arc::clone(&cached.dataset)),
                ReloadPolicy::OnFileChange => {
                    let current = self.modified_time();
                    if current == cached.modified {
                        return Ok(Arc::clone(&cached.dataset));
                    }
                    debug!("{} changed on disk, reloading", self.path.display());
                }
            }
        }

        self.read_into_cache(&mut cache)
    }

    fn reload(&self) -> Result<Arc<Dataset>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        self.read_into_cache(&mut cache)
    }
}

/// Fixed in-memory source, handy for tests and embedding
pub struct StaticDatasetSource {
    dataset: Arc<Dataset>,
}

impl StaticDatasetSource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }
}

impl DatasetSource for StaticDatasetSource {
    fn load(&self) -> Result<Arc<Dataset>> {
        Ok(Arc::clone(&self.dataset))
    }

    fn reload(&self) -> Result<Arc<Dataset>> {
        self.load()
    }
}
