use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Profile views over a window ending today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStats {
    pub candidate_id: i32,
    pub days: u32,
    pub total: i64,
    /// One entry per day, oldest first, including days without views
    pub series: Vec<DailyCount>,
}

/// Checks the requested window size, defaulting to 30 days
pub fn window_days(requested: Option<i64>) -> Result<u32, String> {
    match requested {
        None => Ok(DEFAULT_WINDOW_DAYS),
        Some(days) if (1..=MAX_WINDOW_DAYS as i64).contains(&days) => Ok(days as u32),
        Some(days) => Err(format!("days must be between 1 and {}, got {}", MAX_WINDOW_DAYS, days)),
    }
}

/// First day included in a window of `days` ending on `today`
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN)
}

/// Buckets view timestamps into a zero-filled daily series
///
/// Views outside the window are ignored.
pub fn aggregate(candidate_id: i32, views: &[NaiveDateTime], today: NaiveDate, days: u32) -> ViewStats {
    let start = window_start(today, days);

    let mut buckets: BTreeMap<NaiveDate, i64> = start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| (date, 0))
        .collect();

    for viewed_at in views {
        if let Some(count) = buckets.get_mut(&viewed_at.date()) {
            *count += 1;
        }
    }

    let series: Vec<DailyCount> = buckets
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect();
    let total = series.iter().map(|day| day.count).sum();

    ViewStats { candidate_id, days, total, series }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_window_days() {
        assert_eq!(window_days(None), Ok(30));
        assert_eq!(window_days(Some(1)), Ok(1));
        assert_eq!(window_days(Some(365)), Ok(365));
        assert!(window_days(Some(0)).is_err());
        assert!(window_days(Some(366)).is_err());
    }

    #[test]
    fn test_aggregate_zero_fills() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let views = vec![
            at(2025, 3, 3, 9),
            at(2025, 3, 3, 17),
            at(2025, 3, 1, 0),
            // Outside the window
            at(2025, 2, 20, 12),
        ];

        let stats = aggregate(4, &views, today, 3);

        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.series,
            vec![
                DailyCount { date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), count: 1 },
                DailyCount { date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(), count: 0 },
                DailyCount { date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_single_day_window() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let stats = aggregate(1, &[], today, 1);
        assert_eq!(stats.series.len(), 1);
        assert_eq!(stats.series[0].date, today);
        assert_eq!(stats.total, 0);
    }
}
