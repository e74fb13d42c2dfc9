//! Period label parsing.
//!
//! A label is a bare year (`2024`), a month/year (`03/2024`), a day/month/year
//! (`15/03/2024`) or a range of two of those joined by a dash. En-dash and
//! em-dash separators are accepted.

use crate::domain::model::{DateRange, MonthKey};
use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));
static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})/(\d{4})$").expect("valid regex"));
static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Unsupported date format: '{token}'. Expected 'YYYY', 'MM/YYYY', or 'DD/MM/YYYY'.")]
    UnsupportedFormat { token: String },

    #[error("Invalid period format: '{label}'. Expected 'YYYY' or 'START_DATE-END_DATE'.")]
    InvalidPeriod { label: String },

    #[error("Invalid calendar date: '{token}'")]
    InvalidDate { token: String },

    #[error("Period '{label}' starts on {start} which is after its end {end}")]
    ReversedRange {
        label: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Parses one endpoint of a period.
///
/// Year and month/year tokens resolve to the first day of the span when
/// `is_start` is set and to its last day otherwise. A full date is taken
/// literally either way.
pub fn parse_endpoint(token: &str, is_start: bool) -> Result<NaiveDate, FormatError> {
    let text = token.trim();
    let invalid = || FormatError::InvalidDate {
        token: text.to_string(),
    };

    if YEAR.is_match(text) {
        let year = text.parse::<i32>().map_err(|_| invalid())?;
        let date = if is_start {
            NaiveDate::from_ymd_opt(year, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, 12, 31)
        };
        return date.ok_or_else(invalid);
    }

    if let Some(caps) = MONTH_YEAR.captures(text) {
        let month = caps[1].parse::<u32>().map_err(|_| invalid())?;
        let year = caps[2].parse::<i32>().map_err(|_| invalid())?;
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        if is_start {
            return Ok(first);
        }
        // 下個月一號減一天
        return first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid);
    }

    if let Some(caps) = DAY_MONTH_YEAR.captures(text) {
        let day = caps[1].parse::<u32>().map_err(|_| invalid())?;
        let month = caps[2].parse::<u32>().map_err(|_| invalid())?;
        let year = caps[3].parse::<i32>().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid);
    }

    Err(FormatError::UnsupportedFormat {
        token: text.to_string(),
    })
}

/// Parses a period label into an inclusive date range.
///
/// A single endpoint token stands for its own whole span, so `2024` is the
/// full year and `03/2024` the full month. Only the months of the endpoints
/// are ordered: `20/05/2024-02/05/2024` still covers May.
pub fn parse_period(label: &str) -> Result<DateRange, FormatError> {
    let cleaned = label.trim().replace(['\u{2014}', '\u{2013}'], "-");

    let parts: Vec<&str> = cleaned.split('-').collect();
    let (start, end) = match parts.as_slice() {
        [single] => (parse_endpoint(single, true)?, parse_endpoint(single, false)?),
        [a, b] => (parse_endpoint(a, true)?, parse_endpoint(b, false)?),
        _ => {
            return Err(FormatError::InvalidPeriod {
                label: label.to_string(),
            })
        }
    };

    if MonthKey::from_date(start) > MonthKey::from_date(end) {
        return Err(FormatError::ReversedRange {
            label: label.to_string(),
            start,
            end,
        });
    }

    Ok(DateRange { start, end })
}
