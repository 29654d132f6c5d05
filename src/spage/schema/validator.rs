//! Schema validation with default injection.

use std::net::Ipv4Addr;
use std::sync::OnceLock;

use chrono::{NaiveDateTime, Weekday};
use log::trace;
use regex::Regex;

use super::{Field, FieldKind, Format, Schema};
use crate::spage::codec::boundary;
use crate::spage::types::error::{Result, SpageError};
use crate::spage::types::models::{Record, Value};

/// Compiled pattern for `Error-Reason` values like `HTTP 404` or `DNS -2`.
static ERROR_REASON_PATTERN: OnceLock<Regex> = OnceLock::new();

fn error_reason_regex() -> &'static Regex {
    ERROR_REASON_PATTERN.get_or_init(|| {
        Regex::new(r"^(HTTP|SSL|RULE|SERVER|DNS) [+-]?[0-9]+$").expect("Invalid error reason regex pattern")
    })
}

/// Checks the structured error reason shape: exactly two space separated
/// tokens, a known category followed by a signed integer.
pub fn is_error_reason(value: &str) -> bool {
    error_reason_regex().is_match(value)
}

/// The readable time layout without its leading weekday.
const DATE_TIME_FORMAT: &str = "%b %d %H:%M:%S %Y";

/// Checks that a string parses with the readable time layout.
///
/// The leading weekday must be a weekday name but is not checked against
/// the date, so `Wed Jan 02 15:04:05 2006` is accepted.
pub fn is_readable_time(value: &str) -> bool {
    let Some((weekday, rest)) = value.trim().split_once(' ') else {
        return false;
    };
    weekday.parse::<Weekday>().is_ok() && NaiveDateTime::parse_from_str(rest.trim(), DATE_TIME_FORMAT).is_ok()
}

pub fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// Validates records against a [`Schema`], filling in missing defaults.
///
/// A validator holds no mutable state; default providers run afresh on
/// every call.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    schema: Schema,
}

impl Validator {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Injects defaults for missing fields, then checks every constraint.
    ///
    /// # Errors
    /// Returns [`SpageError::Validation`] naming the first offending field.
    pub fn validate(&self, record: &mut Record) -> Result<()> {
        if !boundary::is_url(&record.url) {
            return Err(SpageError::validation("url", format!("{:?} is not a valid url", record.url)));
        }

        for field in self.schema.fields() {
            if !record.inner_header.contains_key(&field.key)
                && let Some(default) = &field.default
            {
                trace!("Injecting default for {}", field.key);
                record.inner_header.insert(field.key.clone(), default.resolve());
            }
        }

        for key in self.schema.required() {
            if !record.inner_header.contains_key(key) {
                return Err(SpageError::validation(key.as_str(), "required field is missing"));
            }
        }

        for field in self.schema.fields() {
            if let Some(value) = record.inner_header.get(&field.key) {
                check_field(field, value)?;
            }
        }
        Ok(())
    }
}

fn check_field(field: &Field, value: &Value) -> Result<()> {
    let fail = |reason: String| Err(SpageError::validation(field.key.as_str(), reason));

    match (field.kind, value) {
        (FieldKind::String, Value::Text(_))
        | (FieldKind::Number, Value::Number(_))
        | (FieldKind::Timestamp, Value::Text(_) | Value::Time(_)) => {}
        (kind, other) => return fail(format!("expected {:?}, got {:?}", kind, other)),
    }

    if let Some(allowed) = &field.allowed {
        let s = value.to_string();
        if !allowed.iter().any(|a| *a == s) {
            return fail(format!("{:?} is not one of {:?}", s, allowed));
        }
    }

    let Value::Text(text) = value else {
        return Ok(());
    };

    let len = text.chars().count();
    if let Some(min) = field.min_length
        && len < min
    {
        return fail(format!("{:?} is shorter than {} characters", text, min));
    }
    if let Some(max) = field.max_length
        && len > max
    {
        return fail(format!("{:?} is longer than {} characters", text, max));
    }

    if let Some(format) = field.format {
        let ok = match format {
            Format::Url => boundary::is_url(text),
            Format::Ipv4 => is_ipv4(text),
            Format::ReadableTime => is_readable_time(text),
            Format::ErrorReason => is_error_reason(text),
        };
        if !ok {
            return fail(format!("{:?} does not match format {:?}", text, format));
        }
    }
    Ok(())
}
