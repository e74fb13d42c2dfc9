use crate::core::allocator::AllocationSession;
use crate::core::loader::load_records;
use crate::core::render::{render, AllocationReport, OutputFormat, RenderedOutput};
use crate::core::reporter::summarize;
use crate::core::{ConfigProvider, Pipeline, RawRow, Storage};
use crate::utils::error::{AllocError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Header names accepted for the period column besides the configured one.
pub const PERIOD_ALIASES: [&str; 2] = ["period", "ΧΡΟΝΙΚΟ ΔΙΑΣΤΗΜΑ"];
/// Header names accepted for the units column besides the configured one.
pub const UNITS_ALIASES: [&str; 2] = ["units", "ΑΝΘΡΩΠΟΜΗΝΕΣ"];

pub struct AllocationPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> AllocationPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn delimiter(&self) -> u8 {
        let is_tsv = std::path::Path::new(self.config.input_path())
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
        if is_tsv {
            b'\t'
        } else {
            b','
        }
    }

    fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        self.config
            .output_formats()
            .iter()
            .map(|name| {
                OutputFormat::parse(name).ok_or_else(|| AllocError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: name.clone(),
                    reason: "Unsupported format. Valid formats: csv, tsv, json".to_string(),
                })
            })
            .collect()
    }
}

/// Finds a column by header name: the configured name first, then the aliases.
pub fn find_column(headers: &csv::StringRecord, configured: &str, aliases: &[&str]) -> Result<usize> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name.trim());

    std::iter::once(configured)
        .chain(aliases.iter().copied())
        .find_map(position)
        .ok_or_else(|| AllocError::MissingColumnError {
            column: configured.to_string(),
            available: headers.iter().map(|h| h.trim().to_string()).collect(),
        })
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AllocationPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<RawRow>> {
        tracing::debug!("Reading input from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter())
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_slice());

        let headers = reader.headers()?.clone();
        let period_idx = find_column(&headers, self.config.period_column(), &PERIOD_ALIASES)?;
        let units_idx = find_column(&headers, self.config.units_column(), &UNITS_ALIASES)?;
        tracing::debug!(
            "Using columns '{}' (#{}) and '{}' (#{})",
            &headers[period_idx],
            period_idx,
            &headers[units_idx],
            units_idx
        );

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            // 行號以檔案為準，標題是第 1 行
            let row_number = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(i + 2);
            rows.push(RawRow::new(
                row_number,
                record.get(period_idx),
                record.get(units_idx),
            ));
        }

        Ok(rows)
    }

    async fn transform(&self, rows: Vec<RawRow>) -> Result<RenderedOutput> {
        let formats = self.output_formats()?;
        let capacity = self.config.capacity_per_year();

        let loaded = load_records(&rows)?;
        tracing::info!(
            "Loaded {} records from {} rows ({} skipped)",
            loaded.records.len(),
            rows.len(),
            loaded.skipped.len()
        );

        let mut session = AllocationSession::new(capacity).seed_years(loaded.years.iter().copied());
        for (year, units) in self.config.committed_units() {
            tracing::debug!("Year {} starts with {} committed units", year, units);
            session = session.commit(year, units);
        }

        let mut records = loaded.records;
        let allocation = session.run(&mut records);
        let summary = summarize(&records, &allocation.year_totals, capacity);

        let report = AllocationReport {
            capacity_per_year: capacity,
            summary: summary.clone(),
            records,
            allocation,
            skipped: loaded.skipped,
        };
        let files = render(&report, &formats)?;

        Ok(RenderedOutput { files, summary })
    }

    async fn load(&self, output: RenderedOutput) -> Result<String> {
        match self.config.compression_filename() {
            Some(filename) => {
                tracing::debug!("Creating ZIP file with {} files", output.files.len());

                let zip_data = {
                    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                    for file in &output.files {
                        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
                        zip.write_all(&file.contents)?;
                    }
                    zip.finish()?.into_inner()
                };

                tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
                self.storage.write_file(filename, &zip_data).await?;
                Ok(format!("{}/{}", self.config.output_path(), filename))
            }
            None => {
                for file in &output.files {
                    tracing::debug!("Writing {} ({} bytes)", file.name, file.contents.len());
                    self.storage.write_file(&file.name, &file.contents).await?;
                }
                Ok(self.config.output_path().to_string())
            }
        }
    }
}
