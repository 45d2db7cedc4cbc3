//! Input validation for user-supplied fields.

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

/// Why a user-supplied value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("{field} is too long ({actual} chars, max {max})")]
    TooLong { field: String, max: usize, actual: usize },

    #[error("{field} is too short ({actual} chars, min {min})")]
    TooShort { field: String, min: usize, actual: usize },

    #[error("{0} cannot be empty")]
    Empty(String),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    #[error("{field} must be a YYYY-MM-DD date or RFC 3339 timestamp, got {value:?}")]
    InvalidDate { field: String, value: String },
}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Bounds for a profile's full name.
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;

/// Bounds for phone numbers.
pub const MIN_PHONE_LENGTH: usize = 10;
pub const MAX_PHONE_LENGTH: usize = 20;

/// Maximum length for free-text notes.
pub const MAX_NOTES_LENGTH: usize = 4000;

/// Longest access request an institution may ask for.
pub const MAX_ACCESS_DAYS: i64 = 365;

/// Validate an email address: one `@`, a non-empty name and a dotted domain
/// with no empty labels.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidEmail(reason.to_string());
    let (name, domain) = email.split_once('@').ok_or_else(|| invalid("missing @"))?;

    if domain.contains('@') {
        return Err(invalid("more than one @"));
    }
    if name.is_empty() {
        return Err(invalid("nothing before @"));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(())
}

/// Validate a signup password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
            actual: len,
        });
    }
    Ok(())
}

/// Validate a profile's full name.
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    validate_bounded("full name", name, MIN_NAME_LENGTH, MAX_NAME_LENGTH)
}

/// Validate a phone number's length.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    validate_bounded("phone number", phone, MIN_PHONE_LENGTH, MAX_PHONE_LENGTH)
}

/// Validate that free text fits its column.
pub fn validate_text_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual: len,
        });
    }
    Ok(())
}

/// Validate a GPS coordinate pair.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::OutOfRange {
            field: "latitude".to_string(),
            min: "-90".to_string(),
            max: "90".to_string(),
        });
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::OutOfRange {
            field: "longitude".to_string(),
            min: "-180".to_string(),
            max: "180".to_string(),
        });
    }
    Ok(())
}

/// Validate the duration of an access request.
pub fn validate_duration_days(days: i64) -> Result<(), ValidationError> {
    if !(1..=MAX_ACCESS_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "duration_days".to_string(),
            min: "1".to_string(),
            max: MAX_ACCESS_DAYS.to_string(),
        });
    }
    Ok(())
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn validate_date(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
    {
        return Ok(());
    }
    Err(ValidationError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn validate_bounded(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
            actual: len,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_date() {
        assert!(validate_date("activity_date", "2025-03-04").is_ok());
        assert!(validate_date("activity_date", "2025-03-04T08:00:00Z").is_ok());
        assert!(validate_date("activity_date", "2025-03-04T08:00:00.123+03:00").is_ok());

        for bad in ["", "soon", "2025-13-01", "04/03/2025", "2025-03-04 08:00"] {
            assert!(
                matches!(
                    validate_date("activity_date", bad),
                    Err(ValidationError::InvalidDate { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("farmer@example.com").is_ok());
        assert!(validate_email("coop.officer@agri.co.ke").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(matches!(
            validate_password("abc"),
            Err(ValidationError::TooShort { min: 6, actual: 3, .. })
        ));
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Amina Njeri").is_ok());
        assert!(matches!(validate_full_name("  "), Err(ValidationError::Empty(_))));
        assert!(matches!(validate_full_name("A"), Err(ValidationError::TooShort { .. })));
        assert!(matches!(
            validate_full_name(&"x".repeat(101)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+254712345678").is_ok());
        assert!(matches!(validate_phone("12345"), Err(ValidationError::TooShort { .. })));
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(-1.2921, 36.8219).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 180.5).is_err());
    }

    #[test]
    fn test_validate_duration_days() {
        assert!(validate_duration_days(30).is_ok());
        assert!(validate_duration_days(365).is_ok());
        assert!(validate_duration_days(0).is_err());
        assert!(validate_duration_days(366).is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooLong {
            field: "notes".to_string(),
            max: 10,
            actual: 12,
        };
        assert_eq!(err.to_string(), "notes is too long (12 chars, max 10)");

        let err = ValidationError::OutOfRange {
            field: "latitude".to_string(),
            min: "-90".to_string(),
            max: "90".to_string(),
        };
        assert_eq!(err.to_string(), "latitude must be between -90 and 90");
    }
}
