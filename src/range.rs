use crate::error::{ReportError, Result};
use crate::model::TimeRange;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_TIME_RANGE: &str = "1.week";

/// Resolve a `<N>.<unit>` token against the current time.
pub fn resolve(token: &str) -> Result<TimeRange> {
    resolve_at(token, Utc::now())
}

/// Resolve a `<N>.<unit>` token so that the range ends at `now`.
///
/// Units use fixed day counts (week = 7, month = 30, year = 365), not
/// calendar arithmetic.
pub fn resolve_at(token: &str, now: DateTime<Utc>) -> Result<TimeRange> {
    let token = token.trim();
    let days = parse_token_days(token).ok_or_else(|| ReportError::InvalidRangeKind(token.to_string()))?;
    let start = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| ReportError::InvalidRangeKind(token.to_string()))?;

    Ok(TimeRange {
        token: token.to_string(),
        start,
        end: now,
    })
}

fn parse_token_days(token: &str) -> Option<i64> {
    let (count, unit) = token.split_once('.')?;
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = count.parse().ok()?;
    if n <= 0 {
        return None;
    }

    let unit_days = match unit.to_lowercase().as_str() {
        "week" | "weeks" => 7,
        "month" | "months" => 30,
        "year" | "years" => 365,
        _ => return None,
    };

    n.checked_mul(unit_days)
}
