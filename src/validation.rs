use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::ApiError;

/// Field-level validation errors, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Password policy: minimum length 8, mixed case, at least one digit,
/// at least one symbol. Returns every unmet rule so the client can show
/// all of them at once.
pub fn password_errors(password: &str) -> Vec<&'static str> {
    let mut out = Vec::new();
    if password.chars().count() < 8 {
        out.push("The password must be at least 8 characters.");
    }
    if !password.chars().any(|c| c.is_lowercase()) || !password.chars().any(|c| c.is_uppercase()) {
        out.push("The password must contain at least one uppercase and one lowercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        out.push("The password must contain at least one number.");
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        out.push("The password must contain at least one symbol.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn short_password_fails_only_on_length() {
        let errs = password_errors("Short1!");
        assert_eq!(errs, vec!["The password must be at least 8 characters."]);
    }

    #[test]
    fn strong_password_passes() {
        assert!(password_errors("GoodPass1!").is_empty());
    }

    #[test]
    fn weak_password_collects_every_unmet_rule() {
        let errs = password_errors("abc");
        assert_eq!(errs.len(), 4);
    }

    #[test]
    fn password_without_symbol_fails() {
        let errs = password_errors("GoodPass11");
        assert_eq!(
            errs,
            vec!["The password must contain at least one symbol."]
        );
    }

    #[test]
    fn field_errors_merge_and_serialize() {
        let mut errors = FieldErrors::default();
        errors.add("title", "The title field is required.");
        let mut other = FieldErrors::default();
        other.add("title", "Second message.");
        other.add("email", "The email has already been taken.");
        errors.merge(other);

        assert!(errors.has("title"));
        assert!(errors.has("email"));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"].as_array().unwrap().len(), 2);
        assert_eq!(json["email"][0], "The email has already been taken.");
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::default().into_result().is_ok());
    }
}
