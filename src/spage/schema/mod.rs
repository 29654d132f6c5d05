//! Declarative schema for record inner headers.
//!
//! A [`Schema`] is an ordered table of [`Field`] descriptors. The order is
//! significant: the writer uses it as the inner header key ordering when
//! encoding, and keys outside the table are not written.

pub mod validator;

use chrono::Local;

use crate::spage::types::models::{RecordType, Value, keys};

/// Value type a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    /// A [`Value::Time`] or a string in the readable time layout.
    Timestamp,
}

/// Format constraint applied to string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Url,
    Ipv4,
    ReadableTime,
    /// `<CATEGORY> <signed integer>` with CATEGORY one of `HTTP SSL RULE SERVER DNS`.
    ErrorReason,
}

/// Default injected for a missing field.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Invoked on every validation that needs it, e.g. "current time".
    Provider(fn() -> Value),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(v) => v.clone(),
            DefaultValue::Provider(f) => f(),
        }
    }
}

/// A single field descriptor.
#[derive(Debug, Clone)]
pub struct Field {
    pub key: String,
    pub kind: FieldKind,
    pub default: Option<DefaultValue>,
    pub format: Option<Format>,
    /// Allowed values, compared against the value's string form.
    pub allowed: Option<Vec<String>>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl Field {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            default: None,
            format: None,
            allowed: None,
            min_length: None,
            max_length: None,
        }
    }

    pub fn string(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::String)
    }

    pub fn number(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Number)
    }

    pub fn timestamp(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Timestamp)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn with_provider(mut self, provider: fn() -> Value) -> Self {
        self.default = Some(DefaultValue::Provider(provider));
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }
}

/// Ordered field table for the inner header, plus the set of required keys.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    required: Vec<String>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            required: Vec::new(),
        }
    }

    /// Marks inner header keys that must be present after defaults are applied.
    pub fn with_required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Field keys in declaration order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.key.clone()).collect()
    }
}

impl Default for Schema {
    fn default() -> Self {
        spage_schema()
    }
}

fn now() -> Value {
    Value::Time(Local::now().naive_local())
}

/// The stock inner header schema for crawled pages.
pub fn spage_schema() -> Schema {
    Schema::new(vec![
        Field::string(keys::VERSION).with_default("1.2"),
        Field::string(keys::TYPE).one_of(RecordType::ALL.iter().map(RecordType::as_str)),
        Field::timestamp(keys::FETCH_TIME)
            .with_format(Format::ReadableTime)
            .with_provider(now),
        Field::number(keys::ORIGINAL_SIZE),
        Field::number(keys::STORE_SIZE),
        Field::string(keys::BATCH_ID)
            .with_default("__CHANGE_ME__")
            .length(Some(3), None),
        Field::string(keys::ATTACH),
        Field::string(keys::IP_ADDRESS)
            .with_format(Format::Ipv4)
            .with_default("0.0.0.0"),
        Field::string(keys::SPIDER_ADDRESS).with_default("0.0.0.0"),
        Field::string(keys::DIGEST)
            .with_default("0".repeat(32))
            .length(Some(32), Some(32)),
        Field::string(keys::USER_AGENT),
        Field::string(keys::FETCH_IP)
            .with_format(Format::Ipv4)
            .with_default("0.0.0.0"),
        Field::timestamp(keys::NODE_FETCH_TIME).with_format(Format::ReadableTime),
        Field::string(keys::ERROR_REASON).with_format(Format::ErrorReason),
    ])
}
