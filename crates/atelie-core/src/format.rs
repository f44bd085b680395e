//! # Date Formatting
//!
//! The date half of the Money/Format utility. Dates travel as ISO
//! `YYYY-MM-DD` strings and are shown as `DD/MM/YYYY`.

use chrono::NaiveDate;

/// Placeholder shown when a date is missing.
pub const DATE_PLACEHOLDER: &str = "-";

/// Reorders an ISO date for display.
///
/// Missing or blank input yields [`DATE_PLACEHOLDER`]; present but
/// malformed input is passed through unchanged so the user still sees
/// what was stored.
///
/// ```rust
/// use atelie_core::format::to_display_date;
///
/// assert_eq!(to_display_date(Some("2024-03-15")), "15/03/2024");
/// assert_eq!(to_display_date(None), "-");
/// assert_eq!(to_display_date(Some("amanhã")), "amanhã");
/// ```
pub fn to_display_date(iso_date: Option<&str>) -> String {
    let raw = match iso_date.map(str::trim) {
        None | Some("") => return DATE_PLACEHOLDER.to_string(),
        Some(s) => s,
    };

    // Timestamps are accepted too; only the date part is shown.
    let date_part = raw.get(..10).unwrap_or(raw);

    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Formats a stored date (if any) for display.
pub fn display_naive_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => DATE_PLACEHOLDER.to_string(),
    }
}
