use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};

use crate::users::repo::MonthCount;

pub const HISTORY_MONTHS: usize = 12;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Time boundaries the report counts against, all UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub now: OffsetDateTime,
    pub week_start: OffsetDateTime,
    pub month_start: OffsetDateTime,
    /// First instant of the oldest month in the histogram.
    pub history_start: OffsetDateTime,
}

impl Windows {
    pub fn at(now: OffsetDateTime) -> anyhow::Result<Self> {
        let now = now.to_offset(UtcOffset::UTC);
        let (year, month) = (now.year(), u8::from(now.month()));
        let (h_year, h_month) = shift_month(year, month, -(HISTORY_MONTHS as i32 - 1));
        Ok(Self {
            now,
            week_start: now - Duration::days(7),
            month_start: first_instant(year, month)?,
            history_start: first_instant(h_year, h_month)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySignup {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: i64,
    pub admin_count: i64,
    pub user_count: i64,
    pub new_this_month: i64,
    pub new_this_week: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDistribution {
    pub admin: i64,
    pub user: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub overview: Overview,
    pub monthly_signups: Vec<MonthlySignup>,
    pub role_distribution: RoleDistribution,
}

/// Adds `delta` months to a (year, 1-based month) pair.
fn shift_month(year: i32, month: u8, delta: i32) -> (i32, u8) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u8)
}

fn first_instant(year: i32, month: u8) -> anyhow::Result<OffsetDateTime> {
    let date = Date::from_calendar_date(year, Month::try_from(month)?, 1)?;
    Ok(date.with_time(Time::MIDNIGHT).assume_utc())
}

/// One entry per month of the history window, oldest first; missing months count zero.
pub fn fill_months(windows: &Windows, buckets: &[MonthCount]) -> Vec<MonthlySignup> {
    let (year, month) = (windows.now.year(), u8::from(windows.now.month()));
    (0..HISTORY_MONTHS as i32)
        .map(|i| {
            let (y, m) = shift_month(year, month, i - (HISTORY_MONTHS as i32 - 1));
            let count = buckets
                .iter()
                .filter(|b| b.year == y && b.month == m)
                .map(|b| b.count)
                .sum();
            MonthlySignup {
                label: format!("{} {}", MONTH_NAMES[(m - 1) as usize], y),
                count,
            }
        })
        .collect()
}
