//! The record snapshot and its JSON reading.
//!
//! Reading mirrors field assembly: every key must name a catalog field
//! or a group, and each JSON value is converted according to the
//! declared field type. Conversion is deliberately lenient about value
//! shapes (a string in a number field stays text) so that type
//! problems surface as validation issues rather than read failures.

use std::collections::BTreeMap;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rust_decimal::Decimal;

use crate::catalog::{self, FieldDef, FieldType};
use crate::groups::GroupKind;
use crate::value::{Attachment, Value};

/// Field values keyed by field id. Used both for the record's scalars
/// and for each group element.
pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("record must be a JSON object")]
    NotAnObject,
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("group '{group}' must be an array of objects")]
    MalformedGroup { group: String },
    #[error("unknown field '{field}' in {group}[{index}]")]
    UnknownElementField {
        group: String,
        index: usize,
        field: String,
    },
    #[error("attachment '{field}' must be {{\"filename\", \"content\"}} with base64 content: {message}")]
    MalformedAttachment { field: String, message: String },
}

/// The single in-memory document for one editing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: Fields,
    pub groups: BTreeMap<GroupKind, Vec<Fields>>,
}

impl Record {
    /// A fresh record with session-start defaults: boolean fields set
    /// to `false`, one empty parent and one empty language.
    pub fn new() -> Self {
        let mut record = Record::default();
        for def in catalog::FIELDS {
            if def.field_type == FieldType::Boolean {
                record.fields.insert(def.id.to_string(), Value::Bool(false));
            }
        }
        record.groups.insert(
            GroupKind::Parents,
            vec![default_element(GroupKind::Parents)],
        );
        record.groups.insert(
            GroupKind::Languages,
            vec![default_element(GroupKind::Languages)],
        );
        record
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.fields.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.fields.get(id).and_then(Value::as_str)
    }

    pub fn set(&mut self, id: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(id.into(), value.into());
    }

    pub fn remove(&mut self, id: &str) -> Option<Value> {
        self.fields.remove(id)
    }

    pub fn group(&self, kind: GroupKind) -> &[Fields] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group_mut(&mut self, kind: GroupKind) -> &mut Vec<Fields> {
        self.groups.entry(kind).or_default()
    }

    pub fn element(&self, kind: GroupKind, index: usize) -> Option<&Fields> {
        self.group(kind).get(index)
    }

    pub fn element_mut(&mut self, kind: GroupKind, index: usize) -> Option<&mut Fields> {
        self.groups.get_mut(&kind).and_then(|g| g.get_mut(index))
    }

    /// Read a record from its JSON form.
    pub fn from_json(json: &serde_json::Value) -> Result<Record, RecordError> {
        let obj = json.as_object().ok_or(RecordError::NotAnObject)?;
        let mut record = Record::default();

        for (key, raw) in obj {
            if let Some(kind) = GroupKind::from_key(key) {
                let items = raw.as_array().ok_or_else(|| RecordError::MalformedGroup {
                    group: key.clone(),
                })?;
                let mut elements = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    elements.push(read_element(kind, index, item)?);
                }
                record.groups.insert(kind, elements);
                continue;
            }

            let def = catalog::field(key).ok_or_else(|| RecordError::UnknownField(key.clone()))?;
            if let Some(value) = read_value(def, raw)? {
                record.fields.insert(key.clone(), value);
            }
        }

        Ok(record)
    }
}

/// An element pre-filled with empty defaults: blank text for text and
/// choice fields, `false` for booleans; other types stay absent.
pub fn default_element(kind: GroupKind) -> Fields {
    kind.policy()
        .fields
        .iter()
        .filter_map(|def| {
            let value = match def.field_type {
                FieldType::Text | FieldType::Enum => Value::text(""),
                FieldType::Boolean => Value::Bool(false),
                _ => return None,
            };
            Some((def.id.to_string(), value))
        })
        .collect()
}

fn read_element(
    kind: GroupKind,
    index: usize,
    item: &serde_json::Value,
) -> Result<Fields, RecordError> {
    let obj = item.as_object().ok_or_else(|| RecordError::MalformedGroup {
        group: kind.key().to_string(),
    })?;
    let defs = kind.policy().fields;
    let mut fields = Fields::new();
    for (key, raw) in obj {
        let def = catalog::find(defs, key).ok_or_else(|| RecordError::UnknownElementField {
            group: kind.key().to_string(),
            index,
            field: key.clone(),
        })?;
        if let Some(value) = read_value(def, raw)? {
            fields.insert(key.clone(), value);
        }
    }
    Ok(fields)
}

/// Convert one JSON value according to the field's declared type.
/// `null` reads as absent.
pub fn read_value(def: &FieldDef, raw: &serde_json::Value) -> Result<Option<Value>, RecordError> {
    use serde_json::Value as Json;

    let value = match (def.field_type, raw) {
        (_, Json::Null) => return Ok(None),
        (FieldType::Attachment, Json::Object(obj)) => {
            let filename = obj.get("filename").and_then(Json::as_str).ok_or_else(|| {
                RecordError::MalformedAttachment {
                    field: def.id.to_string(),
                    message: "missing 'filename'".to_string(),
                }
            })?;
            let content = obj.get("content").and_then(Json::as_str).ok_or_else(|| {
                RecordError::MalformedAttachment {
                    field: def.id.to_string(),
                    message: "missing 'content'".to_string(),
                }
            })?;
            let bytes = BASE64
                .decode(content)
                .map_err(|e| RecordError::MalformedAttachment {
                    field: def.id.to_string(),
                    message: e.to_string(),
                })?;
            Value::Attachment(Attachment::new(filename, bytes))
        }
        (FieldType::Attachment, _) => {
            return Err(RecordError::MalformedAttachment {
                field: def.id.to_string(),
                message: "expected an object".to_string(),
            })
        }
        (FieldType::Number, Json::Number(n)) => match Decimal::from_str(&n.to_string()) {
            Ok(d) => Value::Number(d),
            Err(_) => Value::text(n.to_string()),
        },
        (FieldType::Number, Json::String(s)) => match Decimal::from_str(s.trim()) {
            Ok(d) => Value::Number(d),
            Err(_) => Value::text(s.clone()),
        },
        (FieldType::Date, Json::String(s)) => Value::Date(s.clone()),
        (_, Json::String(s)) => Value::text(s.clone()),
        (_, Json::Bool(b)) => Value::Bool(*b),
        (_, Json::Number(n)) => match Decimal::from_str(&n.to_string()) {
            Ok(d) => Value::Number(d),
            Err(_) => Value::text(n.to_string()),
        },
        (_, Json::Array(items)) => Value::List(
            items
                .iter()
                .map(|item| match item {
                    Json::String(s) => Value::text(s.clone()),
                    other => Value::text(other.to_string()),
                })
                .collect(),
        ),
        (_, Json::Object(_)) => Value::text(raw.to_string()),
    };
    Ok(Some(value))
}
