//! Validation helpers for DTOs.

use validator::ValidationError;

const MIN_PHONE_DIGITS: usize = 6;
const MAX_PHONE_DIGITS: usize = 15;

/// Accepts phone numbers made of digits with an optional leading `+` and the usual
/// separators (spaces, dashes, dots, parentheses).
///
/// ```ignore
/// validate_phone("+33 6 12 34 56 78") // Ok
/// validate_phone("06-12-34")          // Err - too short
/// validate_phone("call me")           // Err - not a number
/// ```
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
    {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number may only contain digits and separators".into());
        return Err(err);
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        let mut err = ValidationError::new("phone_length");
        err.message = Some(
            format!(
                "Phone number must have between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits (got {digits})"
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Login handles are 3 to 32 characters of ASCII letters, digits, `_`, `.` or `-`.
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    let len = handle.chars().count();
    if !(3..=32).contains(&len) {
        let mut err = ValidationError::new("handle_length");
        err.message = Some(format!("Handle must be 3 to 32 characters (got {len})").into());
        return Err(err);
    }

    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        let mut err = ValidationError::new("handle_format");
        err.message = Some("Handle may only contain letters, digits, `_`, `.` and `-`".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_valid() {
        assert!(validate_phone("+33 6 12 34 56 78").is_ok());
        assert!(validate_phone("0612345678").is_ok());
        assert!(validate_phone("(555) 123-4567").is_ok());
    }

    #[test]
    fn test_validate_phone_invalid() {
        assert!(validate_phone("12345").is_err()); // too short
        assert!(validate_phone("+1234567890123456").is_err()); // too long
        assert!(validate_phone("06 12 ab 56 78").is_err()); // letters
        assert!(validate_phone("++33612345678").is_err()); // double plus
    }

    #[test]
    fn test_validate_handle() {
        assert!(validate_handle("striker_9").is_ok());
        assert!(validate_handle("jo").is_err());
        assert!(validate_handle("no spaces").is_err());
    }
}
