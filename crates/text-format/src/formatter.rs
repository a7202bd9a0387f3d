//! Money, day count, and key formatting

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with exactly two decimal places
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use text_format::format_money;
/// assert_eq!(format_money(Decimal::new(10, 0)), "10.00");
/// assert_eq!(format_money(Decimal::new(12345, 3)), "12.35");
/// ```
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Format a total as `"USD 70.00"`
pub fn format_usd(amount: Decimal) -> String {
    format!("USD {}", format_money(amount))
}

/// Format a day count as `"3 days"`
pub fn format_days(days: i64) -> String {
    format!("{days} days")
}

/// Turn a `snake_case` key into a display label
///
/// Underscores become spaces and every word is capitalised with the rest
/// lowercased. A letter following any non-letter starts a new word.
///
/// # Examples
/// ```
/// use text_format::title_case_key;
/// assert_eq!(title_case_key("swift_code"), "Swift Code");
/// assert_eq!(title_case_key("BANK_NAME"), "Bank Name");
/// ```
pub fn title_case_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len());
    let mut previous_is_letter = false;

    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(70, 0)), "70.00");
        assert_eq!(format_money(Decimal::new(105, 1)), "10.50");
        assert_eq!(format_money(Decimal::new(1005, 3)), "1.01");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Decimal::new(7000, 2)), "USD 70.00");
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(3), "3 days");
        assert_eq!(format_days(1), "1 days");
    }

    #[test]
    fn test_title_case_key() {
        assert_eq!(title_case_key("account_name"), "Account Name");
        assert_eq!(title_case_key("bank_address"), "Bank Address");
        assert_eq!(title_case_key("city"), "City");
        assert_eq!(title_case_key("iban2_code"), "Iban2 Code");
    }
}
