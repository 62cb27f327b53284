//! Date range formatting — the single source of truth for every consumer.
//!
//! Preview and all export formats call these functions, so rendered output
//! never diverges between surfaces.

use chrono::NaiveDate;

/// `"Jan 2020"` style month-year.
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// `"{startMonthYear} - {endMonthYear|Present}"`.
///
/// Ongoing entries always render `Present` and never an end date. Entries
/// with only one known date render just that date; entries with none render
/// an empty string (callers omit the line).
pub fn format_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    ongoing: bool,
) -> String {
    match (start, ongoing, end) {
        (Some(s), true, _) => format!("{} - Present", format_month_year(s)),
        (Some(s), false, Some(e)) => {
            format!("{} - {}", format_month_year(s), format_month_year(e))
        }
        (Some(s), false, None) => format_month_year(s),
        (None, true, _) => "Present".to_string(),
        (None, false, Some(e)) => format_month_year(e),
        (None, false, None) => String::new(),
    }
}
