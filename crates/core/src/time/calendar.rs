use chrono::{DateTime, Datelike, Utc};

/// Start month for a request: the explicit argument, or the current UTC calendar month.
///
/// Range checking is left to `ForecastParams`, so an out-of-range argument is reported as
/// invalid input rather than silently replaced.
pub fn resolve_start_month(arg: Option<i64>, now_utc: DateTime<Utc>) -> i64 {
    arg.unwrap_or_else(|| i64::from(now_utc.month()))
}

/// Calendar month `step` months after `start_month` (both 1-based), wrapping past December.
pub fn target_month(start_month: u32, step: usize) -> u32 {
    ((start_month as usize + step - 1) % 12 + 1) as u32
}
