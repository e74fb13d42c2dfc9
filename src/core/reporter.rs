use crate::core::allocator::YearTotals;
use crate::domain::model::AllocationRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "by", rename_all = "snake_case")]
pub enum CapacityStatus {
    Within,
    Reached,
    Over(u32),
}

impl fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityStatus::Within => Ok(()),
            CapacityStatus::Reached => write!(f, "capacity reached"),
            CapacityStatus::Over(by) => write!(f, "over capacity by {}", by),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearStatus {
    pub year: i32,
    pub total: u32,
    pub status: CapacityStatus,
}

impl fmt::Display for YearStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            CapacityStatus::Within => write!(f, "Year {}: {}", self.year, self.total),
            status => write!(f, "Year {}: {} ({})", self.year, self.total, status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnderAllocated {
    pub id: usize,
    pub period: String,
    pub requested_units: u32,
    pub allocated_units: u32,
    pub unallocated_units: u32,
    pub reasons: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub capacity_per_year: u32,
    pub years: Vec<YearStatus>,
    pub under_allocated: Vec<UnderAllocated>,
    pub overages: BTreeMap<i32, u32>,
    pub total_requested: u64,
    pub total_allocated: u64,
}

impl Summary {
    pub fn is_fully_allocated(&self) -> bool {
        self.under_allocated.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Allocation Summary ---")?;
        writeln!(f, "Maximum yearly capacity: {} units", self.capacity_per_year)?;
        writeln!(f)?;
        writeln!(f, "Yearly totals:")?;
        for year in &self.years {
            writeln!(f, "  {}", year)?;
        }
        writeln!(f)?;

        if self.is_fully_allocated() {
            return writeln!(f, "All units were allocated successfully.");
        }

        writeln!(f, "Projects with unallocated units:")?;
        for record in &self.under_allocated {
            writeln!(
                f,
                "  Project {} | Period: {}, Requested: {}, Allocated: {}, Unallocated: {}",
                record.id,
                record.period,
                record.requested_units,
                record.allocated_units,
                record.unallocated_units
            )?;
            if !record.reasons.is_empty() {
                writeln!(f, "    Reasons: {}", record.reasons)?;
            }
        }
        Ok(())
    }
}

pub fn year_status(total: u32, capacity_per_year: u32) -> CapacityStatus {
    if total > capacity_per_year {
        CapacityStatus::Over(total - capacity_per_year)
    } else if total == capacity_per_year {
        CapacityStatus::Reached
    } else {
        CapacityStatus::Within
    }
}

pub fn summarize(
    records: &[AllocationRecord],
    year_totals: &YearTotals,
    capacity_per_year: u32,
) -> Summary {
    let years: Vec<YearStatus> = year_totals
        .iter()
        .map(|(&year, &total)| YearStatus {
            year,
            total,
            status: year_status(total, capacity_per_year),
        })
        .collect();

    let overages = years
        .iter()
        .filter_map(|status| match status.status {
            CapacityStatus::Over(by) => Some((status.year, by)),
            _ => None,
        })
        .collect();

    let under_allocated = records
        .iter()
        .filter(|record| record.unallocated_units > 0)
        .map(|record| UnderAllocated {
            id: record.id,
            period: record.period_label.clone(),
            requested_units: record.requested_units,
            allocated_units: record.allocated_units,
            unallocated_units: record.unallocated_units,
            reasons: record.joined_reasons(),
        })
        .collect();

    Summary {
        capacity_per_year,
        years,
        under_allocated,
        overages,
        total_requested: records.iter().map(|r| u64::from(r.requested_units)).sum(),
        total_allocated: records.iter().map(|r| u64::from(r.allocated_units)).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocator::{allocate, AllocationSession};
    use crate::core::loader::load_records;
    use crate::domain::model::RawRow;

    fn load(rows: &[(&str, &str)]) -> Vec<AllocationRecord> {
        let raw: Vec<RawRow> = rows
            .iter()
            .enumerate()
            .map(|(i, (period, units))| RawRow::new(i + 2, Some(period), Some(units)))
            .collect();
        load_records(&raw).unwrap().records
    }

    #[test]
    fn test_year_status_thresholds() {
        assert_eq!(year_status(3, 11), CapacityStatus::Within);
        assert_eq!(year_status(11, 11), CapacityStatus::Reached);
        assert_eq!(year_status(13, 11), CapacityStatus::Over(2));
    }

    #[test]
    fn test_year_status_display() {
        let within = YearStatus {
            year: 2024,
            total: 3,
            status: CapacityStatus::Within,
        };
        let over = YearStatus {
            year: 2025,
            total: 12,
            status: CapacityStatus::Over(1),
        };
        assert_eq!(within.to_string(), "Year 2024: 3");
        assert_eq!(over.to_string(), "Year 2025: 12 (over capacity by 1)");
    }

    #[test]
    fn test_summary_lists_under_allocated_records() {
        let mut records = load(&[("01/2024-02/2024", "2"), ("01/2024-03/2024", "3")]);
        let allocation = allocate(&mut records, 11);
        let summary = summarize(&records, &allocation.year_totals, 11);

        assert_eq!(summary.years.len(), 1);
        assert_eq!(summary.years[0].total, 3);
        assert_eq!(summary.years[0].status, CapacityStatus::Within);
        assert!(summary.overages.is_empty());
        assert!(!summary.is_fully_allocated());

        let b = &summary.under_allocated[0];
        assert_eq!(b.id, 1);
        assert_eq!(b.allocated_units, 1);
        assert_eq!(b.unallocated_units, 2);
        assert_eq!(
            b.reasons,
            "Month 1/2024 already allocated by Project 0; Month 2/2024 already allocated by Project 0"
        );
        assert_eq!(summary.total_requested, 5);
        assert_eq!(summary.total_allocated, 3);
    }

    #[test]
    fn test_full_year_reports_capacity_reached() {
        let mut records = load(&[("2024", "2"), ("2025", "1")]);
        let allocation = allocate(&mut records, 2);
        let summary = summarize(&records, &allocation.year_totals, 2);

        assert_eq!(summary.years[0].status, CapacityStatus::Reached);
        assert_eq!(summary.years[1].status, CapacityStatus::Within);
        assert!(summary.is_fully_allocated());
    }

    #[test]
    fn test_overage_only_from_committed_units() {
        let mut records = load(&[("2024", "2")]);
        let allocation = AllocationSession::new(5)
            .seed_years([2024])
            .commit(2024, 7)
            .run(&mut records);
        let summary = summarize(&records, &allocation.year_totals, 5);

        assert_eq!(records[0].allocated_units, 0);
        assert_eq!(summary.overages.get(&2024), Some(&2));
        assert_eq!(summary.years[0].status, CapacityStatus::Over(2));
        assert_eq!(summary.under_allocated[0].reasons, "Year 2024 capacity reached");
    }

    #[test]
    fn test_summary_text() {
        let mut records = load(&[("01/2024-02/2024", "2"), ("01/2024-03/2024", "3")]);
        let allocation = allocate(&mut records, 2);
        let text = summarize(&records, &allocation.year_totals, 2).to_string();

        assert!(text.contains("Maximum yearly capacity: 2 units"));
        assert!(text.contains("  Year 2024: 2 (capacity reached)"));
        assert!(text.contains("Project 1 | Period: 01/2024-03/2024, Requested: 3, Allocated: 0, Unallocated: 3"));
        assert!(text.contains("    Reasons: Year 2024 capacity reached"));
    }

    #[test]
    fn test_totals_do_not_wrap_on_huge_requests() {
        let mut records = load(&[("2024", "3000000000"), ("2025", "3000000000")]);
        let allocation = allocate(&mut records, 11);
        let summary = summarize(&records, &allocation.year_totals, 11);

        assert_eq!(summary.total_requested, 6_000_000_000);
        assert_eq!(summary.total_allocated, 22);
        assert_eq!(summary.under_allocated.len(), 2);
    }

    #[test]
    fn test_years_without_placements_are_reported() {
        let mut records = load(&[("2023-2024", "1")]);
        let allocation = allocate(&mut records, 11);
        let summary = summarize(&records, &allocation.year_totals, 11);

        let totals: Vec<(i32, u32)> = summary.years.iter().map(|y| (y.year, y.total)).collect();
        assert_eq!(totals, vec![(2023, 1), (2024, 0)]);
    }
}
