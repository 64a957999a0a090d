//! Input validation for request parameters.
//!
//! Publication uuids end up inside the `uri` query parameter of statistics
//! requests, so they are checked before any URL is built.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("Invalid uuid: {0}")]
    InvalidUuid(String),

    #[error("Invalid group id: {0} (expected 5 digits)")]
    InvalidGroupId(String),

    #[error("{0} must be a positive number")]
    NotPositive(&'static str),
}

fn uuid_re() -> &'static Regex {
    static UUID_RE: OnceLock<Regex> = OnceLock::new();
    UUID_RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("valid uuid regex")
    })
}

/// Reject empty or whitespace-only values
pub fn require_non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(value)
}

/// Reject zero counts
pub fn require_positive(field: &'static str, value: usize) -> Result<usize, ValidationError> {
    if value == 0 {
        return Err(ValidationError::NotPositive(field));
    }
    Ok(value)
}

/// Validate a hyphenated uuid
pub fn validate_uuid(uuid: &str) -> Result<String, ValidationError> {
    let uuid = uuid.trim();
    if !uuid_re().is_match(uuid) {
        return Err(ValidationError::InvalidUuid(uuid.to_string()));
    }
    Ok(uuid.to_lowercase())
}

/// Validate a group identifier (exactly five ASCII digits)
pub fn validate_group_id(group_id: &str) -> Result<String, ValidationError> {
    let group_id = group_id.trim();
    if group_id.len() != 5 || !group_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidGroupId(group_id.to_string()));
    }
    Ok(group_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("api key", " abc "), Ok("abc"));
        assert_eq!(
            require_non_empty("api key", "   "),
            Err(ValidationError::Empty("api key"))
        );
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("max items", 3), Ok(3));
        assert!(require_positive("max items", 0).is_err());
    }

    #[test]
    fn test_validate_uuid_valid() {
        assert_eq!(
            validate_uuid("0C3E6C1E-7A2B-4D0B-9F5E-0123456789AB").unwrap(),
            "0c3e6c1e-7a2b-4d0b-9f5e-0123456789ab"
        );
    }

    #[test]
    fn test_validate_uuid_invalid() {
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("u1").is_err());
        assert!(validate_uuid("0c3e6c1e-7a2b-4d0b-9f5e-0123456789ab&apikey=x").is_err());
    }

    #[test]
    fn test_validate_group_id() {
        assert_eq!(validate_group_id("09746").unwrap(), "09746");
        assert!(validate_group_id("9746").is_err());
        assert!(validate_group_id("0974a").is_err());
        assert!(validate_group_id("123456").is_err());
    }
}
