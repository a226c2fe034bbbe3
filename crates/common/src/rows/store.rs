//! Row stores
//!
//! Rows are loaded fresh on every call; nothing is cached between requests.

use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use std::path::{Path, PathBuf};

use super::{Column, Row};
use crate::config::StoreConfig;
use crate::errors::{AppError, Result};

/// Source of spreadsheet rows
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Load every row, in file order
    async fn load(&self) -> Result<Vec<Row>>;

    /// Human-readable location, for logs and readiness checks
    fn location(&self) -> String;
}

/// Reads rows from a CSV export with a header row
pub struct CsvRowStore {
    path: PathBuf,
    delimiter: u8,
}

impl CsvRowStore {
    /// The delimiter must be a single ASCII character.
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Result<Self> {
        if !delimiter.is_ascii() {
            return Err(AppError::Configuration {
                message: format!("CSV delimiter must be ASCII, got {:?}", delimiter),
            });
        }

        Ok(Self {
            path: path.into(),
            delimiter: delimiter as u8,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(config.csv_path.clone(), config.delimiter)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse CSV bytes into rows
    pub fn parse(bytes: &[u8], delimiter: u8) -> Result<Vec<Row>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Row = record.deserialize(Some(&headers))?;

            row.extra = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !Column::is_known_header(header))
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect();

            rows.push(row);
        }

        Ok(rows)
    }
}

#[async_trait]
impl RowStore for CsvRowStore {
    async fn load(&self) -> Result<Vec<Row>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to read spreadsheet {:?}: {}", self.path, e),
            )
        })?;

        let rows = Self::parse(&bytes, self.delimiter)?;

        tracing::debug!(path = ?self.path, rows = rows.len(), "Spreadsheet loaded");
        Ok(rows)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory rows (tests and demos)
#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    rows: Vec<Row>,
}

impl MemoryRowStore {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn load(&self) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
