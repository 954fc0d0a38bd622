//! Rental duration and price computation.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{error::ValidationError, models::Money};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Duration and cost derived from a date range and a daily price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalQuote {
    /// Billed days, never below one.
    pub total_days: i64,
    /// `total_days * daily_price`.
    pub total_amount: Money,
}

/// Parse a calendar date typed by the user.
///
/// Plain `YYYY-MM-DD` dates are read as midnight UTC. Full RFC 3339
/// timestamps are accepted as well.
pub fn parse_calendar_date(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

/// Validate a date range and return its billed duration and cost.
///
/// A same-day rental bills one day. Partial days round up.
pub fn quote(
    start_date: &str,
    end_date: &str,
    daily_price: Money,
) -> Result<RentalQuote, ValidationError> {
    let start = parse_calendar_date(start_date)?;
    let end = parse_calendar_date(end_date)?;
    if end < start {
        return Err(ValidationError::InvertedInterval {
            start: start_date.trim().to_string(),
            end: end_date.trim().to_string(),
        });
    }
    if daily_price.is_negative() {
        return Err(ValidationError::NegativePrice);
    }

    let total_days = billed_days(start, end);
    Ok(RentalQuote {
        total_days,
        total_amount: daily_price.times(total_days),
    })
}

fn billed_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let elapsed = (end - start).num_milliseconds().max(0);
    let days = elapsed / MILLIS_PER_DAY + i64::from(elapsed % MILLIS_PER_DAY != 0);
    days.max(1)
}
