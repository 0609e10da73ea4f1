//! Form dashboard numbers, computed in one pass over response timestamps.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::response_service::ResponseTiming;

pub const TRAILING_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total: u64,
    pub opened: u64,
    pub submitted: u64,
    pub completion_rate: u64,
    pub completion_time: CompletionTime,
    pub monthly: Vec<MonthBucket>,
}

/// Seconds between start and submit over completed responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTime {
    pub min_seconds: i64,
    pub avg_seconds: i64,
    pub max_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub completed: u64,
    pub unfinished: u64,
}

pub fn completion_rate(opened: u64, submitted: u64) -> u64 {
    if opened == 0 {
        return 0;
    }
    ((submitted as f64 / opened as f64) * 100.0).round() as u64
}

pub fn compute_dashboard(timings: &[ResponseTiming], now: DateTime<Utc>) -> Dashboard {
    let months = trailing_months(now);
    let mut monthly: Vec<MonthBucket> = months
        .iter()
        .map(|&(y, m)| MonthBucket {
            month: format!("{:04}-{:02}", y, m),
            completed: 0,
            unfinished: 0,
        })
        .collect();

    let mut opened = 0u64;
    let mut submitted = 0u64;
    let mut durations = Durations::default();

    for timing in timings {
        if timing.submitted_at.is_some() {
            submitted += 1;
        }
        let Some(started) = timing.started_at else {
            continue;
        };
        opened += 1;

        if let Some(finished) = timing.submitted_at {
            durations.push((finished - started).num_seconds().max(0));
        }

        let key = (started.year(), started.month());
        if let Some(index) = months.iter().position(|&m| m == key) {
            match timing.submitted_at {
                Some(_) => monthly[index].completed += 1,
                None => monthly[index].unfinished += 1,
            }
        }
    }

    Dashboard {
        total: timings.len() as u64,
        opened,
        submitted,
        completion_rate: completion_rate(opened, submitted),
        completion_time: durations.summary(),
        monthly,
    }
}

#[derive(Default)]
struct Durations {
    count: i64,
    sum: i64,
    min: Option<i64>,
    max: Option<i64>,
}

impl Durations {
    fn push(&mut self, seconds: i64) {
        self.count += 1;
        self.sum += seconds;
        self.min = Some(self.min.map_or(seconds, |m| m.min(seconds)));
        self.max = Some(self.max.map_or(seconds, |m| m.max(seconds)));
    }

    fn summary(&self) -> CompletionTime {
        if self.count == 0 {
            return CompletionTime::default();
        }
        CompletionTime {
            min_seconds: self.min.unwrap_or(0),
            avg_seconds: (self.sum as f64 / self.count as f64).round() as i64,
            max_seconds: self.max.unwrap_or(0),
        }
    }
}

/// (year, month) pairs, oldest first, ending with the month of `now`
fn trailing_months(now: DateTime<Utc>) -> Vec<(i32, u32)> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..TRAILING_MONTHS as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn timing(started: Option<DateTime<Utc>>, secs: Option<i64>) -> ResponseTiming {
        ResponseTiming {
            started_at: started,
            submitted_at: started.zip(secs).map(|(s, n)| s + Duration::seconds(n)),
        }
    }

    #[test]
    fn rate_rounds_and_handles_zero() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(10, 7), 70);
        assert_eq!(completion_rate(3, 2), 67);
    }

    #[test]
    fn empty_form_is_all_zero() {
        let dash = compute_dashboard(&[], at(2026, 3, 15));
        assert_eq!(dash.total, 0);
        assert_eq!(dash.completion_rate, 0);
        assert_eq!(dash.completion_time, CompletionTime::default());
        assert_eq!(dash.monthly.len(), TRAILING_MONTHS);
        assert!(dash.monthly.iter().all(|b| b.completed == 0 && b.unfinished == 0));
    }

    #[test]
    fn months_wrap_the_year() {
        let months = trailing_months(at(2026, 2, 1));
        assert_eq!(months.first(), Some(&(2025, 3)));
        assert_eq!(months.last(), Some(&(2026, 2)));
    }

    #[test]
    fn counts_durations_and_buckets() {
        let now = at(2026, 3, 20);
        let rows = vec![
            timing(Some(at(2026, 3, 1)), Some(60)),
            timing(Some(at(2026, 3, 2)), Some(121)),
            timing(Some(at(2026, 2, 10)), None),
            timing(Some(at(2024, 1, 1)), Some(30)),
            timing(None, None),
        ];
        let dash = compute_dashboard(&rows, now);

        assert_eq!(dash.total, 5);
        assert_eq!(dash.opened, 4);
        assert_eq!(dash.submitted, 3);
        assert_eq!(dash.completion_rate, 75);
        assert_eq!(
            dash.completion_time,
            CompletionTime {
                min_seconds: 30,
                avg_seconds: 70,
                max_seconds: 121
            }
        );

        let march = dash.monthly.last().unwrap();
        assert_eq!(march.month, "2026-03");
        assert_eq!((march.completed, march.unfinished), (2, 0));
        let feb = &dash.monthly[TRAILING_MONTHS - 2];
        assert_eq!((feb.completed, feb.unfinished), (0, 1));
        let bucketed: u64 = dash.monthly.iter().map(|b| b.completed + b.unfinished).sum();
        assert_eq!(bucketed, 3);
    }
}
