//! Publication date parsing
//!
//! Publishers print dates in a handful of human formats ("4 July 2025",
//! "July 4, 2025") and feeds occasionally deliver ISO dates. An unparsable
//! date is not an error: some sources legitimately publish without one and
//! ordering falls back to ordinals.

use chrono::NaiveDate;

/// Date formats observed across the configured publishers
const DATE_FORMATS: &[&str] = &[
    "%d %B %Y",  // 4 July 2025
    "%B %d, %Y", // July 4, 2025
    "%d %b %Y",  // 4 Jul 2025
    "%b %d, %Y", // Jul 4, 2025
    "%Y-%m-%d",  // 2025-07-04
];

/// Parses a publication date; None when no known format matches
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Listings sometimes prefix the date ("Published: 4 July 2025")
    let text = text
        .rsplit_once(':')
        .map(|(_, tail)| tail.trim())
        .unwrap_or(text);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_month_year() {
        assert_eq!(
            parse_date("4 July 2025"),
            Some(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap())
        );
    }

    #[test]
    fn test_month_day_year() {
        assert_eq!(
            parse_date("July 4, 2025"),
            Some(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap())
        );
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(
            parse_date("2025-07-04"),
            Some(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap())
        );
    }

    #[test]
    fn test_published_prefix_stripped() {
        assert_eq!(
            parse_date("Published: 12 March 2024"),
            Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
        );
    }

    #[test]
    fn test_unparsable_is_none() {
        assert_eq!(parse_date("Advance Access"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
    }
}
