use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Validate a "YYYY-MM" month filter.
pub(crate) fn parse_month(s: &str) -> Result<String> {
    let ok = s.len() == 7
        && s.as_bytes()[4] == b'-'
        && s[..4].chars().all(|c| c.is_ascii_digit())
        && s[5..].chars().all(|c| c.is_ascii_digit())
        && matches!(s[5..].parse::<u32>(), Ok(1..=12));
    if !ok {
        bail!("Invalid month '{s}'. Use YYYY-MM (e.g. 2024-06)");
    }
    Ok(s.to_string())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .nth(max.saturating_sub(3))
            .map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

pub(crate) fn format_qty(qty: f64) -> String {
    if (qty - qty.round()).abs() < 1e-9 {
        format!("{qty:.0}")
    } else {
        format!("{qty:.2}")
    }
}
