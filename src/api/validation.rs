use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use super::ApiError;

/// Distinguishes an absent field from an explicit null in partial updates:
/// missing stays `None` (via `#[serde(default)]`), `null` becomes
/// `Some(None)` and clears the column.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Collects field-level validation messages at the request boundary, in the
/// order fields were checked.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Err with the collected details when anything was recorded
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let details = serde_json::to_value(&self.errors).unwrap_or(serde_json::Value::Null);
        Err(ApiError::Validation {
            message: "The given data was invalid".to_string(),
            details: Some(details),
        })
    }
}

pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

pub fn valid_role(role: &str) -> bool {
    role == "admin" || role == "member"
}

/// YYYY-MM-DD
pub fn valid_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(valid_email("user@example.test"));
        assert!(valid_email("a.b+c@sub.example.test"));
        assert!(!valid_email("no-at-sign"));
        assert!(!valid_email("@example.test"));
        assert!(!valid_email("user@nodot"));
        assert!(!valid_email("user@.leading"));
    }

    #[test]
    fn roles() {
        assert!(valid_role("admin"));
        assert!(valid_role("member"));
        assert!(!valid_role("root"));
    }

    #[test]
    fn dates() {
        assert!(valid_date("2025-12-13"));
        assert!(!valid_date("13-12-2025"));
        assert!(!valid_date("2025-13-01"));
    }

    #[test]
    fn field_errors_roundtrip() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "The email has already been taken");
        let err = errors.into_result().unwrap_err();
        match err {
            ApiError::Validation { details, .. } => {
                let details = details.unwrap();
                assert_eq!(
                    details["email"][0],
                    "The email has already been taken"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
