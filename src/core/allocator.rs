//! Greedy month-by-month allocation.
//!
//! Records are served narrowest window first. Each record walks its months in
//! calendar order and claims at most one unit per month. A month is refused
//! when its year has hit the capacity ceiling (checked first) or when another
//! record already holds it. Nothing is ever moved once placed.

use crate::domain::model::{AllocationRecord, MonthKey, UnallocatedReason};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub type YearTotals = BTreeMap<i32, u32>;
pub type MonthSlots = BTreeMap<MonthKey, usize>;

/// Final state of one allocation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub capacity_per_year: u32,
    pub year_totals: YearTotals,
    // 每筆 record 已經帶 assigned_months，JSON 不重複輸出
    #[serde(skip_serializing)]
    pub slots: MonthSlots,
}

/// Mutable state owned by a single allocation pass.
#[derive(Debug, Clone)]
pub struct AllocationSession {
    capacity_per_year: u32,
    year_totals: YearTotals,
    slots: MonthSlots,
}

impl AllocationSession {
    pub fn new(capacity_per_year: u32) -> Self {
        Self {
            capacity_per_year,
            year_totals: YearTotals::new(),
            slots: MonthSlots::new(),
        }
    }

    /// Makes sure every year shows up in the totals, even with nothing placed.
    pub fn seed_years<I: IntoIterator<Item = i32>>(mut self, years: I) -> Self {
        for year in years {
            self.year_totals.entry(year).or_insert(0);
        }
        self
    }

    /// Adds units already consumed in a year outside this batch.
    pub fn commit(mut self, year: i32, units: u32) -> Self {
        *self.year_totals.entry(year).or_insert(0) += units;
        self
    }

    pub fn year_total(&self, year: i32) -> u32 {
        self.year_totals.get(&year).copied().unwrap_or(0)
    }

    pub fn occupant(&self, month: MonthKey) -> Option<usize> {
        self.slots.get(&month).copied()
    }

    /// Runs the pass. `records` is stably reordered by ascending window size
    /// and mutated in place.
    pub fn run(mut self, records: &mut [AllocationRecord]) -> Allocation {
        records.sort_by_key(|record| record.eligible_months.len());

        for record in records.iter_mut() {
            self.place_record(record);
        }

        Allocation {
            capacity_per_year: self.capacity_per_year,
            year_totals: self.year_totals,
            slots: self.slots,
        }
    }

    fn place_record(&mut self, record: &mut AllocationRecord) {
        if record.eligible_months.is_empty() {
            tracing::debug!("Project {} has no eligible months, skipping", record.id);
            return;
        }

        let candidates: BTreeSet<MonthKey> = record.eligible_months.iter().copied().collect();

        for month in candidates {
            if record.is_fully_allocated() {
                break;
            }

            if self.year_total(month.year) >= self.capacity_per_year {
                record.refuse(UnallocatedReason::YearCapacityReached { year: month.year });
                continue;
            }

            if let Some(occupant) = self.occupant(month) {
                record.refuse(UnallocatedReason::MonthOccupied {
                    year: month.year,
                    month: month.month,
                    by: occupant,
                });
                continue;
            }

            self.slots.insert(month, record.id);
            *self.year_totals.entry(month.year).or_insert(0) += 1;
            record.place(month);
        }

        tracing::debug!(
            "Project {} ({}): allocated {}/{}",
            record.id,
            record.period_label,
            record.allocated_units,
            record.requested_units
        );
    }
}

/// One pass with a fresh session.
pub fn allocate(records: &mut [AllocationRecord], capacity_per_year: u32) -> Allocation {
    let years: BTreeSet<i32> = records
        .iter()
        .flat_map(|record| record.eligible_months.iter().map(|month| month.year))
        .collect();

    AllocationSession::new(capacity_per_year)
        .seed_years(years)
        .run(records)
}
