use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Numeric form fields must be finite and strictly positive.
pub fn positive_number(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a positive number"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
    }

    #[test]
    fn positive_number_rejects_nan_and_nonpositive() {
        assert!(positive_number("Weight", 65.0).is_ok());
        assert!(positive_number("Weight", 0.0).is_err());
        assert!(positive_number("Weight", -1.0).is_err());
        assert!(positive_number("Weight", f64::NAN).is_err());
    }
}
