//! Flat-file record store for the reading-log table.
//!
//! Cells are kept as raw strings exactly as read, so untouched values (such as
//! Goodreads' `="9780140449136"` ISBN cells) are written back unchanged.

use crate::common::error::Result;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Spellings that mean "no value" in exports and pandas-written intermediates.
const NULL_MARKERS: [&str; 8] = ["nan", "-nan", "null", "none", "<na>", "na", "n/a", "#n/a"];

/// Whether a raw cell counts as absent.
pub fn is_null(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || NULL_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
}

/// The whole table, owned by the caller and handed to passes by `&mut`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordStore {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV file with a header row. Any failure here is fatal for the pass.
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let store = Self::from_reader(file)?;
        info!(
            "Loaded {} records ({} columns) from {}",
            store.len(),
            store.headers.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Write to `path` via a temporary sibling file so a failed write never
    /// leaves a truncated output behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = temp_path(path);
        {
            let file = fs::File::create(&tmp)?;
            self.write_to(file)?;
        }
        fs::rename(&tmp, path)?;
        info!("Saved {} records to {}", self.len(), path.display());
        Ok(())
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        wtr.write_record(&self.headers)?;
        let width = self.headers.len();
        for row in &self.rows {
            // Short rows are padded so every line has the header's width
            let cells = row
                .iter()
                .map(String::as_str)
                .chain(std::iter::repeat(""))
                .take(width.max(row.len()));
            wtr.write_record(cells)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Append `column` to the header if it is missing; returns its index.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        match self.column_index(column) {
            Some(idx) => idx,
            None => {
                debug!("Adding missing column '{}'", column);
                self.headers.push(column.to_string());
                self.headers.len() - 1
            }
        }
    }

    /// The cell's value, or `None` when the column, the cell or its content is absent.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        let value = self.rows.get(row)?.get(idx)?;
        if is_null(value) {
            None
        } else {
            Some(value.as_str())
        }
    }

    /// Overwrite one cell, creating the column and padding the row as needed.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        let idx = self.ensure_column(column);
        let cells = &mut self.rows[row];
        if cells.len() <= idx {
            cells.resize(idx + 1, String::new());
        }
        cells[idx] = value.into();
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
