//! Small text normalizers shared by the payload builders.

/// Keep only ASCII digits.
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Trimmed, upper-cased state code.
#[must_use]
pub fn state_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Trimmed value, or `None` when blank.
#[must_use]
pub fn non_blank(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
