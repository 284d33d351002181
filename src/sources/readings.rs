use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, AppResult};
use crate::pipeline::Reading;
use crate::sources::ReadingSource;
use crate::sources::models::RawReading;
use crate::sources::parquet_reads::read_parquet_readings;

/// File formats the exporter writes into a day partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Parquet,
    Csv,
}

impl ExportFormat {
    /// Format of an export file, by extension. Anything else in the
    /// partition (markers, temp files) is ignored.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?;
        if ext.eq_ignore_ascii_case("parquet") {
            Some(Self::Parquet)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

/// Reads the day's exports from a date-partitioned directory tree.
///
/// Layout: `{root}/reads/{YYYY}/{M}/{D}/*.parquet` (or `*.csv`), month and day
/// without zero padding.
pub struct PartitionedReadingSource {
    root: PathBuf,
}

impl PartitionedReadingSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the exports for `date`.
    #[must_use]
    pub fn partition_dir(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join("reads")
            .join(date.year().to_string())
            .join(date.month().to_string())
            .join(date.day().to_string())
    }

    async fn list_files(dir: &Path) -> AppResult<Vec<(PathBuf, ExportFormat)>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            AppError::ReadingSource(format!("Cannot open {}: {e}", dir.display()))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(format) = ExportFormat::from_path(&path)
                && entry.file_type().await?.is_file()
            {
                files.push((path, format));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    async fn read_file(path: &Path, format: ExportFormat) -> AppResult<Vec<Reading>> {
        match format {
            ExportFormat::Csv => {
                let data = tokio::fs::read(path).await?;
                parse_readings(&data)
            }
            ExportFormat::Parquet => {
                let path = path.to_path_buf();
                tokio::task::spawn_blocking(move || read_parquet_readings(&path))
                    .await
                    .map_err(|e| AppError::Internal(format!("Parquet reader task failed: {e}")))?
            }
        }
    }
}

/// Parse one CSV export into readings, in file order.
///
/// # Errors
///
/// Returns `AppError::Csv` on a malformed header, row, value or timestamp.
pub fn parse_readings(data: &[u8]) -> AppResult<Vec<Reading>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    reader
        .deserialize::<RawReading>()
        .map(|row| row.map(Reading::from).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl ReadingSource for PartitionedReadingSource {
    async fn fetch_readings(&self, date: NaiveDate) -> AppResult<Vec<Reading>> {
        let dir = self.partition_dir(date);
        let files = Self::list_files(&dir).await?;

        if files.is_empty() {
            return Err(AppError::ReadingSource(format!(
                "No reading files in {}",
                dir.display()
            )));
        }

        let mut readings = Vec::new();
        for (file, format) in &files {
            let mut parsed = Self::read_file(file, *format)
                .await
                .map_err(|e| AppError::ReadingSource(format!("{}: {e}", file.display())))?;
            tracing::debug!(file = %file.display(), count = parsed.len(), "Read reading file");
            readings.append(&mut parsed);
        }

        // Stable: equal timestamps keep file order.
        readings.sort_by_key(|r| r.local_timestamp);

        tracing::info!(
            %date,
            files = files.len(),
            count = readings.len(),
            "Fetched readings"
        );

        Ok(readings)
    }
}
