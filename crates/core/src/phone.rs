//! Brazilian phone number parsing for carrier documents.
//!
//! Correios wants the area code (DDD) and the subscriber number in separate
//! fields, and has distinct field pairs for mobile and landline numbers.

use serde::{Deserialize, Serialize};

use crate::sanitize::digits_only;

/// Maximum length of a national number: 2-digit DDD + 9-digit mobile.
const NATIONAL_LENGTH: usize = 11;
const LANDLINE_LENGTH: usize = 10;
const COUNTRY_CODE: &str = "55";

/// Whether a number belongs in the mobile or the landline fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneKind {
    Mobile,
    Landline,
}

/// A phone number split the way the carrier expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPhone {
    pub area_code: String,
    pub local_number: String,
    pub kind: PhoneKind,
}

/// Parse a free-form phone number.
///
/// Returns `None` when fewer than ten digits remain after stripping the
/// country code; callers then omit the phone fields entirely.
#[must_use]
pub fn parse_phone(raw: &str) -> Option<ParsedPhone> {
    let mut digits = digits_only(raw);

    while digits.len() > NATIONAL_LENGTH && digits.starts_with(COUNTRY_CODE) {
        digits.drain(..COUNTRY_CODE.len());
    }

    if digits.len() > NATIONAL_LENGTH {
        digits.drain(..digits.len() - NATIONAL_LENGTH);
    }

    // Digits are ASCII, so byte slicing below is on char boundaries.
    let (area_code, subscriber) = match digits.len() {
        LANDLINE_LENGTH | NATIONAL_LENGTH => digits.split_at(2),
        _ => return None,
    };

    if subscriber.len() == LANDLINE_LENGTH - 2 {
        return Some(ParsedPhone {
            area_code: area_code.to_string(),
            local_number: subscriber.to_string(),
            kind: PhoneKind::Landline,
        });
    }

    if subscriber.starts_with('9') {
        Some(ParsedPhone {
            area_code: area_code.to_string(),
            local_number: subscriber.to_string(),
            kind: PhoneKind::Mobile,
        })
    } else {
        // 11 digits without the mobile 9: a landline with a stray leading digit.
        Some(ParsedPhone {
            area_code: area_code.to_string(),
            local_number: subscriber.get(1..).unwrap_or_default().to_string(),
            kind: PhoneKind::Landline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(area: &str, number: &str, kind: PhoneKind) -> Option<ParsedPhone> {
        Some(ParsedPhone {
            area_code: area.to_string(),
            local_number: number.to_string(),
            kind,
        })
    }

    #[test]
    fn test_country_code_is_stripped() {
        assert_eq!(
            parse_phone("5551999998888"),
            parsed("51", "999998888", PhoneKind::Mobile)
        );
    }

    #[test]
    fn test_formatted_landline() {
        assert_eq!(
            parse_phone("51 3222-1234"),
            parsed("51", "32221234", PhoneKind::Landline)
        );
    }

    #[test]
    fn test_too_short_is_unparseable() {
        assert_eq!(parse_phone("123"), None);
        assert_eq!(parse_phone(""), None);
        assert_eq!(parse_phone("(51) 3222-123"), None);
    }

    #[test]
    fn test_international_format() {
        assert_eq!(
            parse_phone("+55 (11) 98765-4321"),
            parsed("11", "987654321", PhoneKind::Mobile)
        );
    }

    #[test]
    fn test_eleven_digits_without_nine_is_landline() {
        assert_eq!(
            parse_phone("51 0 3222-1234"),
            parsed("51", "32221234", PhoneKind::Landline)
        );
    }

    #[test]
    fn test_overlong_keeps_last_eleven_digits() {
        // 0 prefix carrier selection code, no country code to strip.
        assert_eq!(
            parse_phone("0 21 51 99999-8888"),
            parsed("51", "999998888", PhoneKind::Mobile)
        );
    }

    #[test]
    fn test_repeated_country_code() {
        assert_eq!(
            parse_phone("55 55 51 3222-1234"),
            parsed("51", "32221234", PhoneKind::Landline)
        );
    }
}
