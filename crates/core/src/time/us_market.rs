use crate::market::types::PricePoint;
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::America::New_York;

pub const DEFAULT_HISTORY_DAYS: i64 = 60;

/// Oldest excluded date for a trailing window ending now in New York.
pub fn history_cutoff(now_utc: DateTime<Utc>, history_days: i64) -> NaiveDate {
    let today_ny = now_utc.with_timezone(&New_York).date_naive();
    let back = Days::new(u64::try_from(history_days).unwrap_or(0));
    today_ny.checked_sub_days(back).unwrap_or(NaiveDate::MIN)
}

/// Keeps points strictly after `cutoff`.
pub fn trailing_window(history: Vec<PricePoint>, cutoff: NaiveDate) -> Vec<PricePoint> {
    history.into_iter().filter(|p| p.date > cutoff).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn p(y: i32, m: u32, d: u32) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            close: 1.0,
        }
    }

    #[test]
    fn cutoff_uses_new_york_date() {
        // 2026-03-10 02:00 UTC is still 2026-03-09 in New York.
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap();
        let cutoff = history_cutoff(now, 60);
        assert_eq!(cutoff, NaiveDate::from_ymd_opt(2026, 1, 8).unwrap());
    }

    #[test]
    fn oversized_window_saturates_instead_of_panicking() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap();
        assert_eq!(history_cutoff(now, 1_000_000_000_000), NaiveDate::MIN);
        assert_eq!(history_cutoff(now, i64::MAX), NaiveDate::MIN);
        assert_eq!(
            history_cutoff(now, -5),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
        );
    }

    #[test]
    fn trailing_window_excludes_cutoff_day() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap();
        let kept = trailing_window(vec![p(2026, 1, 7), p(2026, 1, 8), p(2026, 1, 9)], cutoff);
        assert_eq!(kept, vec![p(2026, 1, 9)]);
    }
}
