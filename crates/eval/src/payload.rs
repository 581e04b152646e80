//! Submission payload construction.
//!
//! The payload is a flat JSON object keyed by field id. Attachments
//! expand to two keys, `<field>` holding the base64 content and
//! `<field>_filename` holding the original name. Groups are arrays of
//! element objects built the same way. Absent fields are omitted;
//! explicit empty strings are kept.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};

use admit_core::catalog::FieldDef;
use admit_core::{Fields, GroupKind, Record, Value};

use crate::validate::{self, Issue, ValidationContext};

pub type Payload = Map<String, Json>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("record has {} blocking issue(s)", issues.len())]
    Invalid { issues: Vec<Issue> },
}

/// Validate, then encode. Refuses while any error remains.
pub fn build(
    catalog: &[FieldDef],
    record: &Record,
    ctx: &ValidationContext,
) -> Result<Payload, PayloadError> {
    let active = crate::rules::evaluate_record(record);
    let issues: Vec<Issue> = validate::validate(catalog, record, &active, ctx)
        .into_iter()
        .filter(Issue::is_error)
        .collect();
    if !issues.is_empty() {
        return Err(PayloadError::Invalid { issues });
    }
    Ok(encode(catalog, record))
}

/// Encode a record without validating it.
pub fn encode(catalog: &[FieldDef], record: &Record) -> Payload {
    let mut payload = Map::new();
    for def in catalog {
        if let Some(value) = record.get(def.id) {
            insert_value(&mut payload, def.id, value);
        }
    }
    for kind in GroupKind::ALL {
        let elements = record
            .group(kind)
            .iter()
            .map(|element| Json::Object(encode_element(element)))
            .collect();
        payload.insert(kind.key().to_string(), Json::Array(elements));
    }
    payload
}

fn encode_element(element: &Fields) -> Payload {
    let mut out = Map::new();
    for (id, value) in element {
        insert_value(&mut out, id, value);
    }
    out
}

fn insert_value(out: &mut Payload, id: &str, value: &Value) {
    match value {
        Value::Attachment(a) => {
            out.insert(id.to_string(), Json::String(BASE64.encode(&a.bytes)));
            out.insert(format!("{id}_filename"), Json::String(a.filename.clone()));
        }
        other => {
            out.insert(id.to_string(), to_json(other));
        }
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Text(s) => Json::String(s.clone()),
        Value::Date(s) => Json::String(s.trim().to_string()),
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number(*n),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Attachment(a) => Json::String(BASE64.encode(&a.bytes)),
    }
}

fn number(n: Decimal) -> Json {
    if n.fract().is_zero() {
        if let Some(i) = n.to_i64() {
            return Json::from(i);
        }
    }
    n.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Json::Number)
        .unwrap_or_else(|| Json::String(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use admit_core::catalog::FIELDS;
    use admit_core::Attachment;
    use time::macros::date;

    #[test]
    fn attachment_expands_to_content_and_filename() {
        let mut record = Record::new();
        let bytes = vec![0x89, b'P', b'N', b'G', 0, 1, 2];
        record.set("recent_photograph", Attachment::new("photo.png", bytes.clone()));

        let payload = encode(FIELDS, &record);
        assert_eq!(payload["recent_photograph_filename"], "photo.png");
        let content = payload["recent_photograph"].as_str().unwrap();
        assert_eq!(BASE64.decode(content).unwrap(), bytes);
    }

    #[test]
    fn absent_omitted_empty_kept() {
        let mut record = Record::new();
        record.set("middle_name", "");
        let payload = encode(FIELDS, &record);
        assert_eq!(payload["middle_name"], "");
        assert!(!payload.contains_key("first_name"));
        assert_eq!(payload["declaration_accepted"], false);
    }

    #[test]
    fn groups_are_arrays_of_objects() {
        let mut record = Record::new();
        record.group_mut(GroupKind::Parents)[0]
            .insert("annual_income".into(), Value::Number(Decimal::new(125050, 2)));
        let payload = encode(FIELDS, &record);
        let parents = payload["parents"].as_array().unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0]["annual_income"], 1250.5);
        assert_eq!(payload["siblings"], serde_json::json!([]));
    }

    #[test]
    fn build_refuses_invalid_record() {
        let ctx = ValidationContext::new(date!(2026 - 03 - 01));
        let err = build(FIELDS, &Record::new(), &ctx).unwrap_err();
        let PayloadError::Invalid { issues } = err;
        assert!(issues.iter().all(Issue::is_error));
        assert!(!issues.is_empty());
    }
}
