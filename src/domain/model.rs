use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// 只接受 "12.0" 這種整數小數，不接受指數寫法
static WHOLE_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.0*$").expect("valid regex"));

/// Inclusive calendar span produced by the period parser. The start month is
/// never after the end month; days inside one month may be reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A single calendar month; the unit of allocation.
///
/// Field order matters: the derived `Ord` compares `year` first, then `month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// 下一個月，十二月跨到隔年一月
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Coerced value of a raw quantity cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Units(u32),
    Invalid,
}

impl Quantity {
    /// Coerces raw cell text. A missing or blank cell counts as zero units; integers
    /// with a zero fractional part (`"3.0"`) are accepted as numeric exports.
    pub fn coerce(raw: Option<&str>) -> Self {
        let text = match raw.map(str::trim) {
            None | Some("") => return Quantity::Units(0),
            Some(text) => text,
        };

        if let Ok(units) = text.parse::<u32>() {
            return Quantity::Units(units);
        }

        WHOLE_DECIMAL
            .captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .map_or(Quantity::Invalid, Quantity::Units)
    }

    /// Units usable for allocation; an invalid quantity counts as zero.
    pub fn units(self) -> u32 {
        match self {
            Quantity::Units(units) => units,
            Quantity::Invalid => 0,
        }
    }
}

/// One input row before ingestion, exactly as the extract step found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based row number in the source table; the header is row 1.
    pub row_number: usize,
    pub period: Option<String>,
    pub quantity: Option<String>,
}

impl RawRow {
    pub fn new(row_number: usize, period: Option<&str>, quantity: Option<&str>) -> Self {
        Self {
            row_number,
            period: period.map(str::to_string),
            quantity: quantity.map(str::to_string),
        }
    }
}

/// Why a unit of a record could not be placed into one of its months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnallocatedReason {
    YearCapacityReached { year: i32 },
    MonthOccupied { year: i32, month: u32, by: usize },
}

impl fmt::Display for UnallocatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnallocatedReason::YearCapacityReached { year } => {
                write!(f, "Year {} capacity reached", year)
            }
            UnallocatedReason::MonthOccupied { year, month, by } => {
                write!(f, "Month {}/{} already allocated by Project {}", month, year, by)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: usize,
    pub row_number: usize,
    pub period_label: String,
    pub requested_units: u32,
    pub eligible_months: Vec<MonthKey>,
    pub units_per_month_ratio: f64,
    pub allocated_units: u32,
    pub unallocated_units: u32,
    pub assigned_months: Vec<MonthKey>,
    pub unallocated_reasons: Vec<UnallocatedReason>,
}

impl AllocationRecord {
    pub fn new(
        id: usize,
        row_number: usize,
        period_label: String,
        requested_units: u32,
        eligible_months: Vec<MonthKey>,
    ) -> Self {
        let units_per_month_ratio = if eligible_months.is_empty() {
            0.0
        } else {
            f64::from(requested_units) / eligible_months.len() as f64
        };

        Self {
            id,
            row_number,
            period_label,
            requested_units,
            eligible_months,
            units_per_month_ratio,
            allocated_units: 0,
            unallocated_units: requested_units,
            assigned_months: Vec::new(),
            unallocated_reasons: Vec::new(),
        }
    }

    pub fn is_fully_allocated(&self) -> bool {
        self.allocated_units >= self.requested_units
    }

    pub(crate) fn place(&mut self, month: MonthKey) {
        self.allocated_units += 1;
        self.unallocated_units -= 1;
        self.assigned_months.push(month);
    }

    /// 同一個理由只記一次，保留第一次出現的順序
    pub(crate) fn refuse(&mut self, reason: UnallocatedReason) {
        if !self.unallocated_reasons.contains(&reason) {
            self.unallocated_reasons.push(reason);
        }
    }

    pub fn joined_reasons(&self) -> String {
        self.unallocated_reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_ordering_and_rollover() {
        assert!(MonthKey::new(2023, 12) < MonthKey::new(2024, 1));
        assert!(MonthKey::new(2024, 2) < MonthKey::new(2024, 11));
        assert_eq!(MonthKey::new(2023, 12).next(), MonthKey::new(2024, 1));
        assert_eq!(MonthKey::new(2024, 6).to_string(), "2024-06");
    }

    #[test]
    fn test_quantity_coercion() {
        assert_eq!(Quantity::coerce(Some("3")), Quantity::Units(3));
        assert_eq!(Quantity::coerce(Some(" 12 ")), Quantity::Units(12));
        assert_eq!(Quantity::coerce(Some("4.0")), Quantity::Units(4));
        assert_eq!(Quantity::coerce(None), Quantity::Units(0));
        assert_eq!(Quantity::coerce(Some("")), Quantity::Units(0));
        assert_eq!(Quantity::coerce(Some("2.5")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("-2")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("abc")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("7.")), Quantity::Units(7));
    }

    #[test]
    fn test_quantity_rejects_exponent_and_special_floats() {
        assert_eq!(Quantity::coerce(Some("1e3")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("2.0e1")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("inf")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("NaN")), Quantity::Invalid);
        assert_eq!(Quantity::coerce(Some("5000000000.0")), Quantity::Invalid);
        assert_eq!(Quantity::Invalid.units(), 0);
    }

    #[test]
    fn test_record_starts_fully_unallocated() {
        let months = vec![MonthKey::new(2024, 1), MonthKey::new(2024, 2)];
        let record = AllocationRecord::new(0, 2, "01/2024-02/2024".to_string(), 3, months);
        assert_eq!(record.allocated_units, 0);
        assert_eq!(record.unallocated_units, 3);
        assert!((record.units_per_month_ratio - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reasons_are_deduplicated() {
        let mut record = AllocationRecord::new(1, 3, "2024".to_string(), 2, vec![]);
        record.refuse(UnallocatedReason::YearCapacityReached { year: 2024 });
        record.refuse(UnallocatedReason::YearCapacityReached { year: 2024 });
        record.refuse(UnallocatedReason::MonthOccupied {
            year: 2024,
            month: 3,
            by: 0,
        });
        assert_eq!(record.unallocated_reasons.len(), 2);
        assert_eq!(
            record.joined_reasons(),
            "Year 2024 capacity reached; Month 3/2024 already allocated by Project 0"
        );
        assert_eq!(record.units_per_month_ratio, 0.0);
    }
}
