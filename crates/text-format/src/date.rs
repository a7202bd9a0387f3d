//! Input date parsing and long English date output

use chrono::{Datelike, NaiveDate};

/// Accepted input date layouts, tried in order
pub const INPUT_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%Y.%m.%d"];

/// Parse a date typed by a user, trying each of [`INPUT_DATE_FORMATS`]
///
/// Day-first wins over month-first when both would match (`03/04/2024` is
/// the 3rd of April). The year must have exactly four digits.
pub fn parse_input_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    INPUT_DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .find(|date| (1000..=9999).contains(&date.year()))
}

/// Format a date as `"October 01, 2023"`
///
/// Input that matches none of the accepted layouts is returned unchanged.
///
/// # Examples
/// ```
/// use text_format::format_english_date;
/// assert_eq!(format_english_date("2023/12/25"), "December 25, 2023");
/// assert_eq!(format_english_date("N/A"), "N/A");
/// ```
pub fn format_english_date(input: &str) -> String {
    match parse_input_date(input) {
        Some(date) => date.format("%B %d, %Y").to_string(),
        None => input.to_string(),
    }
}
