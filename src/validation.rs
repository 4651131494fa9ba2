//! Field-level validation rules shared by the service layer.
//!
//! Drafts arrive with every field optional and stringly typed; these
//! helpers check one rule each and produce the typed value. Blank
//! strings count as absent for optional fields. Errors carry the first
//! failing rule's message, ready for the response envelope.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A failed validation rule with its caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Required text field: present and non-blank after trimming.
pub(crate) fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::new(format!("{field} is required"))),
    }
}

/// Optional text field: blank collapses to `None`.
pub(crate) fn opt_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Calendar date in `YYYY-MM-DD` form.
pub(crate) fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(format!("{field} must be a valid date (YYYY-MM-DD)")))
}

/// Optional calendar date.
pub(crate) fn opt_date(value: &Option<String>, field: &str) -> Result<Option<NaiveDate>, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(Some(parse_date(v, field)?)),
        _ => Ok(None),
    }
}

/// Required enum field, reported against the allowed value list.
pub(crate) fn parse_enum<T: FromStr>(
    value: &str,
    field: &str,
    allowed: &[&str],
) -> Result<T, ValidationError> {
    T::from_str(value.trim()).map_err(|_| {
        ValidationError::new(format!("{field} must be one of: {}", allowed.join(", ")))
    })
}

/// Optional enum field.
pub(crate) fn opt_enum<T: FromStr>(
    value: &Option<String>,
    field: &str,
    allowed: &[&str],
) -> Result<Option<T>, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => parse_enum(v, field, allowed).map(Some),
        _ => Ok(None),
    }
}

/// Optional integer, accepted as a JSON number or a numeric string.
pub(crate) fn opt_int(value: &Option<Value>, field: &str) -> Result<Option<i64>, ValidationError> {
    let raw = match value {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let parsed = match raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_i64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) => Ok(Some(n)),
        None => Err(ValidationError::new(format!("{field} must be an integer"))),
    }
}

/// Optional monetary amount, accepted as a JSON number or a numeric
/// string and held as an exact decimal.
pub(crate) fn opt_cost(value: &Option<Value>, field: &str) -> Result<Option<Decimal>, ValidationError> {
    let raw = match value {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let parsed = match raw {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .ok()
                .or_else(|| Decimal::from_scientific(&s).ok())
        }
        _ => None,
    };
    match parsed {
        Some(d) => Ok(Some(d)),
        None => Err(ValidationError::new(format!("{field} must be a number"))),
    }
}

/// Minimal email shape check: one `@`, a non-empty local part, and a
/// dotted domain without whitespace.
pub(crate) fn check_email(value: &str, field: &str) -> Result<(), ValidationError> {
    let ok = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "{field} must be a valid email address"
        )))
    }
}

/// Entity reference carried in a request body.
pub(crate) fn parse_id(value: &str, field: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ValidationError::new(format!("{field} must be a valid id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_rejects_missing_and_blank() {
        assert!(require(None, "first_name").is_err());
        assert!(require(Some(""), "first_name").is_err());
        assert!(require(Some("   "), "first_name").is_err());
        assert_eq!(require(Some(" Ada "), "first_name").unwrap(), "Ada");
    }

    #[test]
    fn require_error_names_the_field() {
        let err = require(None, "last_name").unwrap_err();
        assert_eq!(err.to_string(), "last_name is required");
    }

    #[test]
    fn opt_text_collapses_blank_to_none() {
        assert_eq!(opt_text(&Some("  ".into())), None);
        assert_eq!(opt_text(&None), None);
        assert_eq!(opt_text(&Some(" x ".into())), Some("x".into()));
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(parse_date("1990-04-12", "date_of_birth").is_ok());
        assert!(parse_date("12/04/1990", "date_of_birth").is_err());
        assert!(parse_date("1990-13-40", "date_of_birth").is_err());
        let err = parse_date("nope", "date_of_birth").unwrap_err();
        assert!(err.to_string().contains("date_of_birth"));
    }

    #[test]
    fn opt_date_treats_blank_as_absent() {
        assert_eq!(opt_date(&Some("".into()), "d").unwrap(), None);
        assert_eq!(opt_date(&None, "d").unwrap(), None);
        assert!(opt_date(&Some("2024-01-15".into()), "d").unwrap().is_some());
        assert!(opt_date(&Some("garbage".into()), "d").is_err());
    }

    #[test]
    fn enum_errors_list_allowed_values() {
        use crate::models::enums::Gender;
        let err =
            parse_enum::<Gender>("robot", "gender", Gender::variants()).unwrap_err();
        assert_eq!(err.to_string(), "gender must be one of: male, female, other");
    }

    #[test]
    fn opt_int_accepts_number_and_numeric_string() {
        assert_eq!(opt_int(&Some(json!(12)), "duration").unwrap(), Some(12));
        assert_eq!(opt_int(&Some(json!("30")), "duration").unwrap(), Some(30));
        assert_eq!(opt_int(&Some(json!("")), "duration").unwrap(), None);
        assert_eq!(opt_int(&None, "duration").unwrap(), None);
        assert_eq!(opt_int(&Some(json!(null)), "duration").unwrap(), None);
    }

    #[test]
    fn opt_int_rejects_floats_and_text() {
        assert!(opt_int(&Some(json!(12.5)), "duration").is_err());
        assert!(opt_int(&Some(json!("twelve")), "duration").is_err());
        assert!(opt_int(&Some(json!(true)), "duration").is_err());
    }

    #[test]
    fn opt_cost_accepts_string_and_number() {
        assert_eq!(
            opt_cost(&Some(json!("1500.50")), "cost").unwrap().unwrap().to_string(),
            "1500.50"
        );
        assert_eq!(
            opt_cost(&Some(json!(1500.5)), "cost").unwrap().unwrap().to_string(),
            "1500.5"
        );
        assert_eq!(opt_cost(&Some(json!("")), "cost").unwrap(), None);
        assert!(opt_cost(&Some(json!("abc")), "cost").is_err());
        assert!(opt_cost(&Some(json!([1, 2])), "cost").is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(check_email("a@b.com", "email").is_ok());
        assert!(check_email("first.last+tag@sub.domain.org", "email").is_ok());
        assert!(check_email("a@b", "email").is_err());
        assert!(check_email("@b.com", "email").is_err());
        assert!(check_email("a b@c.com", "email").is_err());
        assert!(check_email("a@b@c.com", "email").is_err());
        assert!(check_email("a@.com", "email").is_err());
    }

    #[test]
    fn parse_id_requires_uuid() {
        assert!(parse_id("not-a-uuid", "client_id").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "client_id").unwrap(), id);
    }
}
