/// Input validators for signup and login bodies
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Email and phone format checks
/// 3. Control-character rejection in names
/// 4. Password strength rules

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::MAX_PASSWORD_BYTES;
use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 200;
const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // E.164-style: optional leading '+', 7 to 15 digits
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

/// Validates and normalizes an email address (trimmed, lowercased)
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    // Local part over 64 chars is not deliverable (RFC 5321)
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email".to_string()));
        }
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a phone number, ignoring spaces and dashes
pub fn is_valid_phone(phone: &str) -> Result<String, ValidationError> {
    let compact: String = phone
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();

    if compact.is_empty() {
        return Err(ValidationError::EmptyField("phone".to_string()));
    }

    if !PHONE_REGEX.is_match(&compact) {
        return Err(ValidationError::InvalidFormat("phone".to_string()));
    }

    Ok(compact)
}

/// Validates a first or last name
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validate password strength requirements
///
/// Requirements:
/// - 8 to 72 bytes
/// - At least one digit, one lowercase and one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::WeakPassword);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(is_valid_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
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
        assert!(is_valid_email("a@b").is_err());
    }

    #[test]
    fn test_phone_numbers() {
        assert_eq!(is_valid_phone("+1 555-000-1111").unwrap(), "+15550001111");
        assert_eq!(is_valid_phone("0123456789").unwrap(), "0123456789");
        assert!(is_valid_phone("").is_err());
        assert!(is_valid_phone("12345").is_err());
        assert!(is_valid_phone("+1555abc1111").is_err());
        assert!(is_valid_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(is_valid_name("first_name", " Jean-Pierre ").unwrap(), "Jean-Pierre");
        assert!(is_valid_name("last_name", "O'Brien").is_ok());
        assert_eq!(
            is_valid_name("first_name", ""),
            Err(ValidationError::EmptyField("first_name".to_string()))
        );
        assert!(is_valid_name("first_name", &"a".repeat(201)).is_err());
        assert!(is_valid_name("first_name", "Name\0with\0null").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("ValidPassword123").is_ok());
        assert!(validate_password_strength("Short1").is_err());
        assert!(validate_password_strength(&("a".repeat(MAX_PASSWORD_BYTES) + "A1")).is_err());
        assert!(validate_password_strength(&("x".repeat(69) + "Aa1")).is_ok());
        assert_eq!(
            validate_password_strength(&("x".repeat(72) + "Aa1")),
            Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES))
        );
        assert_eq!(
            validate_password_strength("NoDigitsPassword"),
            Err(ValidationError::WeakPassword)
        );
        assert!(validate_password_strength("NOLOWERCASE1").is_err());
        assert!(validate_password_strength("nouppercase1").is_err());
    }
}
