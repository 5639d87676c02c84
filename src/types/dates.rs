//! Calendar helpers. Everything works on whole days; callers pass `today`
//! explicitly so results do not depend on the wall clock.

use chrono::{Datelike, Duration, Months, NaiveDate};

/// Whole days from `today` to `target`, negative when `target` is in the past.
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days()
}

pub fn days_until_label(target: NaiveDate, today: NaiveDate) -> String {
    match days_until(target, today) {
        d if d < 0 => "Overdue".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d => format!("{d} days"),
    }
}

/// `date` moved by `days`; `None` when the result leaves chrono's calendar.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

pub fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    today
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .unwrap_or(today)
}

/// `19 October 2026`
pub fn format_long(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// `19 October`
pub fn format_short(date: NaiveDate) -> String {
    date.format("%-d %B").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn labels_cover_past_today_tomorrow_and_later() {
        let today = d(2026, 10, 19);
        assert_eq!(days_until_label(d(2026, 10, 18), today), "Overdue");
        assert_eq!(days_until_label(today, today), "Today");
        assert_eq!(days_until_label(d(2026, 10, 20), today), "Tomorrow");
        assert_eq!(days_until_label(d(2026, 10, 24), today), "5 days");
    }

    #[test]
    fn first_of_next_month_wraps_year() {
        assert_eq!(first_of_next_month(d(2026, 10, 19)), d(2026, 11, 1));
        assert_eq!(first_of_next_month(d(2026, 12, 31)), d(2027, 1, 1));
        assert_eq!(first_of_next_month(d(2026, 1, 31)), d(2026, 2, 1));
    }

    #[test]
    fn add_days_crosses_months_and_rejects_overflow() {
        assert_eq!(add_days(d(2026, 1, 31), 30), Some(d(2026, 3, 2)));
        assert_eq!(add_days(d(2026, 12, 25), 7), Some(d(2027, 1, 1)));
        assert_eq!(add_days(d(2026, 3, 2), -30), Some(d(2026, 1, 31)));
        assert_eq!(add_days(d(2026, 10, 19), 1_000_000_000), None);
        assert_eq!(add_days(d(2026, 10, 19), i64::MAX), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(format_long(d(2026, 10, 9)), "9 October 2026");
        assert_eq!(format_short(d(2026, 10, 9)), "9 October");
    }
}
