use chrono::{Datelike, Local, NaiveDate};

/// An inclusive range of calendar days.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .expect("The first day of a month always exists")
}

/// The first and last day of the month `date` falls in.
pub fn month_range(date: NaiveDate) -> DateRange {
    let start = month_start(date);

    let (next_year, next_month) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };

    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("The first day of a month always exists")
        .pred_opt()
        .expect("The first day of a month always has a predecessor");

    DateRange { start, end }
}

pub fn current_month_range() -> DateRange {
    month_range(today())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2023, 9, 18).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());

        let first = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
        assert_eq!(month_start(first), first);
    }

    #[test]
    fn test_month_range_mid_year() {
        let range = month_range(NaiveDate::from_ymd_opt(2023, 9, 18).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2023, 9, 30).unwrap());
    }

    #[test]
    fn test_month_range_december_rolls_into_next_year() {
        let range = month_range(NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_month_range_leap_february() {
        let range = month_range(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let range = month_range(NaiveDate::from_ymd_opt(2023, 2, 10).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_current_month_range_contains_today() {
        let range = current_month_range();
        let today = today();

        assert!(range.start <= today && today <= range.end);
        assert_eq!(range.start.day(), 1);
    }
}
