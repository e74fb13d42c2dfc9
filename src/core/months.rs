use crate::domain::model::{DateRange, MonthKey};
use crate::utils::error::{AllocError, Result};
use chrono::NaiveDate;

/// Every month touched by `start..=end`, in ascending order.
///
/// Both dates are floored to their month before walking, so a range from the
/// 31st of one month to the 1st of the next yields two months.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<MonthKey>> {
    let first = MonthKey::from_date(start);
    let last = MonthKey::from_date(end);

    if first > last {
        return Err(AllocError::RangeError { start, end });
    }

    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(current);
        current = current.next();
    }
    Ok(months)
}

pub fn months_in(range: &DateRange) -> Result<Vec<MonthKey>> {
    month_range(range.start, range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_month() {
        let months = month_range(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        assert_eq!(months, vec![MonthKey::new(2024, 3)]);
    }

    #[test]
    fn test_crosses_year_boundary() {
        let months = month_range(date(2023, 11, 15), date(2024, 2, 2)).unwrap();
        assert_eq!(
            months,
            vec![
                MonthKey::new(2023, 11),
                MonthKey::new(2023, 12),
                MonthKey::new(2024, 1),
                MonthKey::new(2024, 2),
            ]
        );
    }

    #[test]
    fn test_length_matches_month_arithmetic() {
        let cases = [
            ((2020, 1), (2020, 1)),
            ((2020, 1), (2020, 12)),
            ((2019, 7), (2024, 3)),
            ((2023, 12), (2024, 1)),
        ];
        for ((y1, m1), (y2, m2)) in cases {
            let months = month_range(date(y1, m1, 1), date(y2, m2, 28)).unwrap();
            let expected = (y2 - y1) * 12 + (m2 as i32 - m1 as i32) + 1;
            assert_eq!(months.len() as i32, expected, "{y1}-{m1}..{y2}-{m2}");
        }
    }

    #[test]
    fn test_same_month_reversed_days_is_one_month() {
        // 同一個月內的日期順序不影響
        let months = month_range(date(2024, 5, 20), date(2024, 5, 2)).unwrap();
        assert_eq!(months, vec![MonthKey::new(2024, 5)]);
    }

    #[test]
    fn test_reversed_months_fail() {
        let err = month_range(date(2024, 6, 1), date(2024, 1, 31)).unwrap_err();
        assert!(matches!(err, AllocError::RangeError { .. }));
    }
}
