//! Runtime values held in a record snapshot.

use rust_decimal::Decimal;

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A single field value.
///
/// Enumerated choices and the "Yes"/"No" trigger fields are carried as
/// `Text`. Dates stay in their textual `YYYY-MM-DD` form so that a
/// malformed date reaches format validation instead of being lost at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Date(String),
    Bool(bool),
    Attachment(Attachment),
    List(Vec<Value>),
}

/// An uploaded file: original name plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Attachment {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension of the original filename, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Date(_) => "date",
            Value::Bool(_) => "boolean",
            Value::Attachment(_) => "attachment",
            Value::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True when the value carries no user input.
    ///
    /// Whitespace-only text and empty lists are blank. Booleans, numbers
    /// and attachments are never blank once present.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Text(s) | Value::Date(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Number(_) | Value::Bool(_) | Value::Attachment(_) => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<Attachment> for Value {
    fn from(a: Attachment) -> Self {
        Value::Attachment(a)
    }
}
