use crate::core::months::months_in;
use crate::core::period::{parse_period, FormatError};
use crate::domain::model::{AllocationRecord, MonthKey, Quantity, RawRow};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    EmptyPeriod,
    ZeroQuantity,
    InvalidQuantity(String),
    Period(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyPeriod => write!(f, "empty period"),
            SkipReason::ZeroQuantity => write!(f, "zero quantity"),
            SkipReason::InvalidQuantity(raw) => write!(f, "invalid quantity '{}'", raw),
            SkipReason::Period(message) => write!(f, "period parsing error: {}", message),
        }
    }
}

impl From<FormatError> for SkipReason {
    fn from(err: FormatError) -> Self {
        SkipReason::Period(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row_number: usize,
    pub reason: SkipReason,
}

/// A row that passed every check, ready to become a record once it gets an id.
#[derive(Debug, Clone)]
pub struct ValidRow {
    pub row_number: usize,
    pub period_label: String,
    pub units: u32,
    pub months: Vec<MonthKey>,
}

#[derive(Debug, Clone)]
pub enum RowOutcome {
    Record(ValidRow),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<AllocationRecord>,
    pub months: BTreeSet<MonthKey>,
    pub years: BTreeSet<i32>,
    pub skipped: Vec<SkippedRow>,
}

/// Classifies a single row.
///
/// Only an expander contract violation is an `Err`; every input problem is a
/// `RowOutcome::Skip`.
pub fn classify_row(row: &RawRow) -> Result<RowOutcome> {
    let quantity = Quantity::coerce(row.quantity.as_deref());
    let period = row.period.as_deref().map(str::trim).unwrap_or_default();

    if period.is_empty() {
        return Ok(RowOutcome::Skip(SkipReason::EmptyPeriod));
    }

    let units = match quantity {
        Quantity::Units(0) => return Ok(RowOutcome::Skip(SkipReason::ZeroQuantity)),
        Quantity::Units(units) => units,
        Quantity::Invalid => {
            let raw = row.quantity.clone().unwrap_or_default();
            return Ok(RowOutcome::Skip(SkipReason::InvalidQuantity(raw)));
        }
    };

    let range = match parse_period(period) {
        Ok(range) => range,
        Err(e) => return Ok(RowOutcome::Skip(e.into())),
    };

    Ok(RowOutcome::Record(ValidRow {
        row_number: row.row_number,
        period_label: period.to_string(),
        units,
        months: months_in(&range)?,
    }))
}

pub fn load_records(rows: &[RawRow]) -> Result<LoadedRecords> {
    let mut loaded = LoadedRecords::default();

    for row in rows {
        match classify_row(row)? {
            RowOutcome::Record(valid) => {
                let id = loaded.records.len();
                loaded.months.extend(valid.months.iter().copied());
                loaded
                    .years
                    .extend(valid.months.iter().map(|month| month.year));
                loaded.records.push(AllocationRecord::new(
                    id,
                    valid.row_number,
                    valid.period_label,
                    valid.units,
                    valid.months,
                ));
            }
            RowOutcome::Skip(reason) => {
                match &reason {
                    SkipReason::Period(_) => tracing::warn!(
                        "⚠️ Skipping row {} due to {}",
                        row.row_number,
                        reason
                    ),
                    _ => tracing::debug!("Skipping row {}: {}", row.row_number, reason),
                }
                loaded.skipped.push(SkippedRow {
                    row_number: row.row_number,
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        "Loaded {} records ({} rows skipped) spanning {} months",
        loaded.records.len(),
        loaded.skipped.len(),
        loaded.months.len()
    );

    Ok(loaded)
}
