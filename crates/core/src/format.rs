//! Display helpers using Brazilian conventions.

use crate::{models::Money, pricing::parse_calendar_date};

/// Placeholder for absent values.
pub const EMPTY: &str = "—";

/// Format an amount as `R$ 1.234,56`. Absent amounts print as zero.
pub fn format_currency(value: Option<Money>) -> String {
    let cents = value.unwrap_or_default().cents();
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{sign}R$ {},{:02}",
        group_thousands(abs / 100),
        abs % 100
    )
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format a stored date as `dd/mm/aaaa`.
///
/// Unparseable input is returned unchanged and missing input renders as
/// [`EMPTY`].
pub fn format_date(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => EMPTY.to_string(),
        Some(raw) => parse_calendar_date(raw)
            .map(|date| date.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(Some(Money::from_cents(123_456))), "R$ 1.234,56");
        assert_eq!(format_currency(Some(Money::from_cents(2000))), "R$ 20,00");
        assert_eq!(format_currency(Some(Money::from_cents(100_000_000))), "R$ 1.000.000,00");
        assert_eq!(format_currency(None), "R$ 0,00");
        assert_eq!(format_currency(Some(Money::from_cents(-5))), "-R$ 0,05");
    }

    #[test]
    fn dates_render_day_first() {
        assert_eq!(format_date(Some("2024-01-03")), "03/01/2024");
        assert_eq!(format_date(Some("soon")), "soon");
        assert_eq!(format_date(Some("  ")), EMPTY);
        assert_eq!(format_date(None), EMPTY);
    }
}
