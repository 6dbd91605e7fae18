//! Lazily loaded, cached CSV row sources.

use super::option_metrics::{to_yyyymmdd, DatedRow};
use crate::error::ServiceError;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Rows concatenated from every CSV file in one directory whose name contains
/// a substring.
///
/// Files are read in filename order on first access and cached for the life
/// of the source.
#[derive(Debug)]
pub struct SampleCsvSource<R> {
    directory: PathBuf,
    file_substring: String,
    rows: OnceLock<Vec<R>>,
}

impl<R: DeserializeOwned + DatedRow> SampleCsvSource<R> {
    /// Create a source over `directory`. Nothing is read yet.
    pub fn new(directory: impl AsRef<Path>, file_substring: impl Into<String>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            file_substring: file_substring.into(),
            rows: OnceLock::new(),
        }
    }

    /// Directory the files are read from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Every row, loading on first call.
    pub fn rows(&self) -> Result<&[R], ServiceError> {
        if let Some(rows) = self.rows.get() {
            return Ok(rows);
        }
        let loaded = self.load()?;
        Ok(self.rows.get_or_init(|| loaded))
    }

    /// Rows for one snapshot date.
    pub fn rows_on(&self, date: NaiveDate) -> Result<impl Iterator<Item = &R> + '_, ServiceError> {
        let key = to_yyyymmdd(date);
        Ok(self.rows()?.iter().filter(move |r| r.date() == key))
    }

    fn matching_files(&self) -> Result<Vec<PathBuf>, ServiceError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.contains(&self.file_substring));
            if matches && entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn load(&self) -> Result<Vec<R>, ServiceError> {
        let files = self.matching_files()?;
        if files.is_empty() {
            return Err(ServiceError::data(format!(
                "No files containing '{}' in {}",
                self.file_substring,
                self.directory.display()
            )));
        }

        let mut rows = Vec::new();
        for file in &files {
            let mut reader = csv::Reader::from_path(file)?;
            for record in reader.deserialize() {
                rows.push(record?);
            }
        }

        info!(
            directory = %self.directory.display(),
            files = files.len(),
            rows = rows.len(),
            "Sample data loaded"
        );
        Ok(rows)
    }
}
