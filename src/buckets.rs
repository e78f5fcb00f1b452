//! Calendar time buckets for sampled commit fetching
//!
//! A bucket is one calendar year or one calendar month; the bucketed fetch
//! modes issue a single windowed query per bucket and keep at most one commit
//! from each.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

/// A fixed calendar interval identifying one fetch granularity unit.
///
/// Yearly buckets carry no month; monthly buckets carry a 1-12 month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBucket {
    /// Calendar year
    pub year: i32,
    /// Calendar month (1-12), absent for yearly buckets
    pub month: Option<u32>,
}

impl TimeBucket {
    /// A whole-year bucket
    pub fn yearly(year: i32) -> Self {
        Self { year, month: None }
    }

    /// A single calendar-month bucket
    pub fn monthly(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    /// Inclusive UTC window covered by this bucket.
    ///
    /// Returns `None` only for calendar values chrono cannot represent.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self.month {
            None => {
                let start = Utc.with_ymd_and_hms(self.year, 1, 1, 0, 0, 0).single()?;
                let end = Utc
                    .with_ymd_and_hms(self.year, 12, 31, 23, 59, 59)
                    .single()?;
                Some((start, end))
            }
            Some(month) => {
                let first = NaiveDate::from_ymd_opt(self.year, month, 1)?;
                let last = first
                    .checked_add_months(Months::new(1))?
                    .pred_opt()?;
                let start = Utc
                    .with_ymd_and_hms(self.year, month, 1, 0, 0, 0)
                    .single()?;
                let end = Utc
                    .with_ymd_and_hms(last.year(), last.month(), last.day(), 23, 59, 59)
                    .single()?;
                Some((start, end))
            }
        }
    }

    /// Year tag written to output rows
    pub fn year_tag(&self) -> String {
        self.year.to_string()
    }

    /// Zero-padded month tag written to output rows, if monthly
    pub fn month_tag(&self) -> Option<String> {
        self.month.map(|m| format!("{m:02}"))
    }
}

/// Every year in `[start_year, end_year]` inclusive
pub fn yearly_buckets(start_year: i32, end_year: i32) -> Vec<TimeBucket> {
    (start_year..=end_year).map(TimeBucket::yearly).collect()
}

/// Every calendar month touched by `[start, end]` inclusive
pub fn monthly_buckets(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<TimeBucket> {
    let mut buckets = Vec::new();
    if end < start {
        return buckets;
    }

    let mut year = start.year();
    let mut month = start.month();
    let end_year = end.year();
    let end_month = end.month();

    while (year, month) <= (end_year, end_month) {
        buckets.push(TimeBucket::monthly(year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    buckets
}
