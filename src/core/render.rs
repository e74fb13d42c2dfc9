use crate::core::allocator::Allocation;
use crate::core::loader::SkippedRow;
use crate::core::reporter::Summary;
use crate::domain::model::{AllocationRecord, MonthKey};
use crate::utils::error::{AllocError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

pub const ASSIGNMENT_HEADER: [&str; 9] = [
    "project_id",
    "row",
    "period",
    "requested",
    "allocated",
    "unallocated",
    "units_per_month",
    "assigned_months",
    "reasons",
];

pub const YEARLY_TOTALS_LABEL: &str = "YEARLY TOTALS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "tsv" => Some(OutputFormat::Tsv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Tsv => b'\t',
            _ => b',',
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

/// Everything a renderer needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    pub capacity_per_year: u32,
    pub summary: Summary,
    pub records: Vec<AllocationRecord>,
    pub allocation: Allocation,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RenderedOutput {
    pub files: Vec<RenderedFile>,
    pub summary: Summary,
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| AllocError::IoError(e.into_error()))
}

pub fn assignments_table(records: &[AllocationRecord], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(ASSIGNMENT_HEADER)?;

    for record in records {
        let assigned = record
            .assigned_months
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        writer.write_record([
            record.id.to_string(),
            record.row_number.to_string(),
            record.period_label.clone(),
            record.requested_units.to_string(),
            record.allocated_units.to_string(),
            record.unallocated_units.to_string(),
            format!("{:.2}", record.units_per_month_ratio),
            assigned,
            record.joined_reasons(),
        ])?;
    }

    finish(writer)
}

/// Year-by-month grid: one row per record, an `X` for every month it holds,
/// and a trailing row with each year's total under that year's January.
pub fn schedule_grid(
    records: &[AllocationRecord],
    allocation: &Allocation,
    delimiter: u8,
) -> Result<Vec<u8>> {
    let years: BTreeSet<i32> = allocation.year_totals.keys().copied().collect();
    let columns: Vec<MonthKey> = years
        .iter()
        .flat_map(|&year| (1..=12).map(move |month| MonthKey::new(year, month)))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let mut header = vec![
        "project_id".to_string(),
        "period".to_string(),
        "requested".to_string(),
    ];
    header.extend(columns.iter().map(ToString::to_string));
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.id.to_string(),
            record.period_label.clone(),
            record.requested_units.to_string(),
        ];
        row.extend(columns.iter().map(|month| {
            if allocation.slots.get(month) == Some(&record.id) {
                "X".to_string()
            } else {
                String::new()
            }
        }));
        writer.write_record(&row)?;
    }

    let mut totals = vec![
        String::new(),
        YEARLY_TOTALS_LABEL.to_string(),
        String::new(),
    ];
    totals.extend(columns.iter().map(|month| {
        if month.month == 1 {
            allocation.year_totals[&month.year].to_string()
        } else {
            String::new()
        }
    }));
    writer.write_record(&totals)?;

    finish(writer)
}

pub fn json_report(report: &AllocationReport) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(report)?)
}

pub fn render(report: &AllocationReport, formats: &[OutputFormat]) -> Result<Vec<RenderedFile>> {
    let mut files = Vec::new();

    for &format in formats {
        match format {
            OutputFormat::Json => files.push(RenderedFile {
                name: "allocation_report.json".to_string(),
                contents: json_report(report)?,
            }),
            OutputFormat::Csv | OutputFormat::Tsv => {
                files.push(RenderedFile {
                    name: format!("assignments.{}", format.extension()),
                    contents: assignments_table(&report.records, format.delimiter())?,
                });
                files.push(RenderedFile {
                    name: format!("schedule.{}", format.extension()),
                    contents: schedule_grid(
                        &report.records,
                        &report.allocation,
                        format.delimiter(),
                    )?,
                });
            }
        }
    }

    Ok(files)
}
