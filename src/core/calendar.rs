//! Calendar arithmetic and rate conversions shared by the engine and the carry overlay.

use chrono::Datelike;

use super::types::Date;

/// Days per year used for every annual/daily conversion.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Month index `year * 12 + month`, used for roll scheduling.
#[inline]
pub fn month_index(date: Date) -> i32 {
    date.year() * 12 + date.month() as i32
}

/// Whole calendar months between two dates by month index, ignoring day-of-month.
///
/// 31 Jan to 1 Feb counts as one month; 1 Jan to 31 Jan counts as zero.
#[inline]
pub fn months_between(from: Date, to: Date) -> i32 {
    month_index(to) - month_index(from)
}

/// Whether a roll is due at `now` given the last roll date.
#[inline]
pub fn roll_due(last_roll: Date, now: Date, roll_interval_months: u32) -> bool {
    months_between(last_roll, now) >= roll_interval_months as i32
}

/// Calendar days elapsed between two dates.
#[inline]
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).num_days()
}

/// Daily-compounded equivalent of an annual rate: `(1 + annual)^(1/365.25) - 1`.
#[inline]
pub fn daily_rate_from_annual(annual: f64) -> f64 {
    (1.0 + annual).powf(1.0 / DAYS_PER_YEAR) - 1.0
}
