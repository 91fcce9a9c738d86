/// Request field validators
///
/// Shape checks that run in route handlers before any service sees the
/// input: length limits, email format, control characters, numeric ranges.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::store::Page;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt only reads the first 72 bytes
const MAX_PASSWORD_LENGTH: usize = 72;
const MAX_DESCRIPTION_LENGTH: usize = 4000;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalizes an email address (trimmed, lowercased)
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    // Local part over 64 characters
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a display name or product name
pub fn is_valid_name(field: &'static str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_NAME_LENGTH));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}

/// Password shape only; strength policy is not enforced here.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

pub fn is_valid_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong("description", MAX_DESCRIPTION_LENGTH));
    }
    Ok(trimmed.to_string())
}

pub fn is_valid_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::OutOfRange("price"));
    }
    Ok(price)
}

/// Missing page number or size fall back to page 1 / `DEFAULT_PAGE_SIZE`.
pub fn is_valid_page(number: Option<u32>, size: Option<u32>) -> Result<Page, ValidationError> {
    let number = number.unwrap_or(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

    if number == 0 {
        return Err(ValidationError::OutOfRange("current_page"));
    }
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange("items_per_page"));
    }
    Ok(Page { number, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  User@Example.COM ").unwrap(), "user@example.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(is_valid_email("a@a").is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert_eq!(
            is_valid_email(&long_local),
            Err(ValidationError::SuspiciousContent("email"))
        );
    }

    #[test]
    fn test_valid_name() {
        assert_eq!(is_valid_name("full_name", " John Doe ").unwrap(), "John Doe");
        assert!(is_valid_name("full_name", "O'Brien").is_ok());
    }

    #[test]
    fn test_name_limits() {
        assert_eq!(
            is_valid_name("full_name", "   "),
            Err(ValidationError::EmptyField("full_name"))
        );
        assert!(is_valid_name("name", &"a".repeat(256)).is_err());
        assert!(is_valid_name("name", "Name\0with\0null").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(is_valid_password("Secret12").is_ok());
        assert!(is_valid_password("").is_err());
        assert!(is_valid_password("short").is_err());
        assert!(is_valid_password(&"a".repeat(73)).is_err());
    }

    #[test]
    fn test_price_range() {
        assert_eq!(is_valid_price(10.0), Ok(10.0));
        assert!(is_valid_price(0.0).is_err());
        assert!(is_valid_price(-1.0).is_err());
        assert!(is_valid_price(f64::NAN).is_err());
    }

    #[test]
    fn test_page_defaults_and_limits() {
        assert_eq!(is_valid_page(None, None), Ok(Page { number: 1, size: DEFAULT_PAGE_SIZE }));
        assert_eq!(is_valid_page(Some(3), Some(25)), Ok(Page { number: 3, size: 25 }));
        assert!(is_valid_page(Some(0), None).is_err());
        assert!(is_valid_page(None, Some(0)).is_err());
        assert!(is_valid_page(None, Some(101)).is_err());
    }
}
