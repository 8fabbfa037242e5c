//! Date input parsing and relative date formatting for the command line and menu.

use chrono::{Datelike, Duration, NaiveDate};

/// Parse human-readable date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday" .. "sunday" (and "mon" .. "sun"), optionally prefixed by "this" or "next"
/// - "end of week" / "eow", "end of month" / "eom"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_date_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        "end of week" | "eow" => return end_of_week(today),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return first_of_next.pred_opt();
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d') {
            let days = n.trim().parse::<i64>().ok()?;
            return offset(today, Duration::try_days(days)?);
        }
        if let Some(n) = rest.strip_suffix('w') {
            let weeks = n.trim().parse::<i64>().ok()?;
            return offset(today, Duration::try_weeks(weeks)?);
        }
    }

    let (next_week, day_name) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix("this ").unwrap_or(&s)),
    };
    if let Some(target) = weekday_number(day_name) {
        let current = today.weekday().num_days_from_monday();
        let mut ahead = (target + 7 - current) % 7;
        if next_week {
            ahead += 7;
        }
        return offset(today, Duration::days(i64::from(ahead)));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn weekday_number(name: &str) -> Option<u32> {
    let n = match name {
        "monday" | "mon" => 0,
        "tuesday" | "tue" => 1,
        "wednesday" | "wed" => 2,
        "thursday" | "thu" => 3,
        "friday" | "fri" => 4,
        "saturday" | "sat" => 5,
        "sunday" | "sun" => 6,
        _ => return None,
    };
    Some(n)
}

/// Sunday of the ISO week containing `today`.
fn end_of_week(today: NaiveDate) -> Option<NaiveDate> {
    let weekday = i64::from(today.weekday().num_days_from_monday());
    offset(today, Duration::days(6 - weekday))
}

/// `None` once the result leaves chrono's date range.
fn offset(today: NaiveDate, by: Duration) -> Option<NaiveDate> {
    today.checked_add_signed(by)
}

/// Format a date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_relative(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match delta {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Wednesday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_date_input("today", today()), Some(today()));
        assert_eq!(parse_date_input(" Tomorrow ", today()), Some(ymd(2026, 3, 12)));
        assert_eq!(parse_date_input("yesterday", today()), Some(ymd(2026, 3, 10)));
        assert_eq!(parse_date_input("eow", today()), Some(ymd(2026, 3, 15)));
        assert_eq!(parse_date_input("end of month", today()), Some(ymd(2026, 3, 31)));
        assert_eq!(
            parse_date_input("eom", ymd(2026, 12, 5)),
            Some(ymd(2026, 12, 31))
        );
    }

    #[test]
    fn test_offsets() {
        assert_eq!(parse_date_input("in 3d", today()), Some(ymd(2026, 3, 14)));
        assert_eq!(parse_date_input("in 2w", today()), Some(ymd(2026, 3, 25)));
        assert_eq!(parse_date_input("in xd", today()), None);
    }

    #[test]
    fn test_huge_offsets_are_rejected() {
        assert_eq!(parse_date_input("in 99999999999d", today()), None);
        assert_eq!(parse_date_input("in 99999999999w", today()), None);
        assert_eq!(parse_date_input("in 9223372036854775807d", today()), None);
        assert_eq!(parse_date_input("tomorrow", NaiveDate::MAX), None);
        assert_eq!(parse_date_input("yesterday", NaiveDate::MIN), None);
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(parse_date_input("wednesday", today()), Some(today()));
        assert_eq!(parse_date_input("fri", today()), Some(ymd(2026, 3, 13)));
        assert_eq!(parse_date_input("this monday", today()), Some(ymd(2026, 3, 16)));
        assert_eq!(parse_date_input("next friday", today()), Some(ymd(2026, 3, 20)));
    }

    #[test]
    fn test_iso_and_garbage() {
        assert_eq!(parse_date_input("2026-12-24", today()), Some(ymd(2026, 12, 24)));
        assert_eq!(parse_date_input("24/12/2026", today()), None);
        assert_eq!(parse_date_input("", today()), None);
    }

    #[test]
    fn test_format_relative() {
        assert_eq!(format_relative(today(), today()), "today");
        assert_eq!(format_relative(ymd(2026, 3, 12), today()), "tomorrow");
        assert_eq!(format_relative(ymd(2026, 3, 16), today()), "in 5d");
        assert_eq!(format_relative(ymd(2026, 3, 9), today()), "2d late");
    }
}
