//! Validation result aggregation.
//!
//! Validation runs in two phases over one snapshot and its active rule
//! set. Phase 1 checks every present value against its field definition
//! (type, pattern, length, range, options, date sanity, attachment size
//! and extension): scalars in catalog order, then each group element in
//! position order. Phase 2 runs the cross-field checks in a fixed order.
//! Every check runs; nothing short-circuits.
//!
//! A snapshot is valid when no issue has [`Severity::Error`].

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use time::macros::format_description;
use time::Date;

use admit_core::catalog::{FieldDef, FieldType};
use admit_core::rules::RECORD_RULES;
use admit_core::{Effect, Fields, GroupKind, Record, Value};

use crate::groups::effective_min;
use crate::rules::ActiveRuleSet;
use crate::element_path;

/// Days before expiry at which a passport draws a warning.
pub const PASSPORT_EXPIRY_WARNING_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Format,
    Required,
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
    pub severity: Severity,
    pub kind: IssueKind,
}

impl Issue {
    fn error(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
            kind,
        }
    }

    fn required(path: impl Into<String>) -> Self {
        Issue::error(IssueKind::Required, path, "is required")
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", level, self.path, self.message)
    }
}

/// Inputs that are not part of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub today: Date,
}

impl ValidationContext {
    pub fn new(today: Date) -> Self {
        ValidationContext { today }
    }

    /// Context dated with the current UTC day.
    pub fn now() -> Self {
        ValidationContext {
            today: time::OffsetDateTime::now_utc().date(),
        }
    }
}

/// True when `issues` holds no errors. Warnings do not block.
pub fn is_valid(issues: &[Issue]) -> bool {
    !issues.iter().any(Issue::is_error)
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Run both validation phases.
pub fn validate(
    catalog: &[FieldDef],
    record: &Record,
    active: &ActiveRuleSet,
    ctx: &ValidationContext,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_formats(catalog, record, &mut issues);

    let mut reported = BTreeSet::new();
    check_unconditional_required(catalog, record, active, &mut reported, &mut issues);
    check_conditional_required(record, active, &mut reported, &mut issues);
    check_element_required(record, active, &mut reported, &mut issues);
    check_cardinality(record, &mut issues);
    check_parent_relations(record, &mut issues);
    check_passport_dates(record, ctx, &mut issues);
    check_date_of_birth(record, ctx, &mut issues);
    check_prior_school_years(record, ctx, &mut issues);
    check_declaration(record, &mut issues);
    issues
}

/// Validate with the built-in catalog and a freshly evaluated rule set.
pub fn validate_record(record: &Record, ctx: &ValidationContext) -> Vec<Issue> {
    let active = crate::rules::evaluate_record(record);
    validate(admit_core::catalog::FIELDS, record, &active, ctx)
}

// ──────────────────────────────────────────────
// Phase 1: per-field format
// ──────────────────────────────────────────────

fn check_formats(catalog: &[FieldDef], record: &Record, issues: &mut Vec<Issue>) {
    for def in catalog {
        if let Some(value) = record.get(def.id) {
            if let Some(message) = check_value(def, value) {
                issues.push(Issue::error(IssueKind::Format, def.id, message));
            }
        }
    }
    for kind in GroupKind::ALL {
        let defs = kind.policy().fields;
        for (index, element) in record.group(kind).iter().enumerate() {
            for def in defs {
                if let Some(value) = element.get(def.id) {
                    if let Some(message) = check_value(def, value) {
                        issues.push(Issue::error(
                            IssueKind::Format,
                            element_path(kind, index, def.id),
                            message,
                        ));
                    }
                }
            }
        }
    }
}

/// Check one present value. Blank values are left to the required checks.
pub fn check_value(def: &FieldDef, value: &Value) -> Option<String> {
    if value.is_blank() {
        return None;
    }
    let c = &def.constraints;
    match (def.field_type, value) {
        (FieldType::Text, Value::Text(s)) => {
            let len = s.trim().chars().count();
            if let Some(min) = c.min_len {
                if len < min {
                    return Some(format!("must be at least {min} characters"));
                }
            }
            if let Some(max) = c.max_len {
                if len > max {
                    return Some(format!("must be at most {max} characters"));
                }
            }
            match c.format {
                Some(format) if !format.regex().is_match(s.trim()) => {
                    Some(format.describe().to_string())
                }
                _ => None,
            }
        }
        (FieldType::Enum, Value::Text(s)) => {
            if c.options.contains(&s.as_str()) {
                None
            } else {
                Some(format!("'{}' is not one of: {}", s, c.options.join(", ")))
            }
        }
        (FieldType::MultiEnum, Value::List(items)) => {
            let mut seen = BTreeSet::new();
            for item in items {
                let Some(s) = item.as_str() else {
                    return Some(format!("expected a list of choices, found {}", item.type_name()));
                };
                if !c.options.contains(&s) {
                    return Some(format!("'{}' is not one of: {}", s, c.options.join(", ")));
                }
                if !seen.insert(s) {
                    return Some(format!("'{s}' is selected more than once"));
                }
            }
            None
        }
        (FieldType::Number, Value::Number(n)) => {
            if let Some(min) = c.min {
                if *n < Decimal::from(min) {
                    return Some(format!("must be at least {min}"));
                }
            }
            if let Some(max) = c.max {
                if *n > Decimal::from(max) {
                    return Some(format!("must be at most {max}"));
                }
            }
            None
        }
        (FieldType::Date, Value::Date(s) | Value::Text(s)) => match parse_date(s) {
            None => Some(format!("'{s}' is not a valid date (expected YYYY-MM-DD)")),
            Some(d) if d.year() < 1900 || d.year() > 2100 => {
                Some(format!("year {} is out of range", d.year()))
            }
            Some(_) => None,
        },
        (FieldType::Boolean, Value::Bool(_)) => None,
        (FieldType::Attachment, Value::Attachment(a)) => {
            if a.bytes.is_empty() {
                return Some("file is empty".to_string());
            }
            if let Some(max) = c.max_bytes {
                if a.bytes.len() > max {
                    return Some(format!("file must be at most {} KB", max / 1024));
                }
            }
            match a.extension() {
                Some(ext) if c.extensions.is_empty() || c.extensions.contains(&ext.as_str()) => None,
                _ => Some(format!("file must be one of: {}", c.extensions.join(", "))),
            }
        }
        (expected, found) => Some(format!(
            "expected {}, found {}",
            expected.name(),
            found.type_name()
        )),
    }
}

// ──────────────────────────────────────────────
// Phase 2: cross-field checks
// ──────────────────────────────────────────────

fn missing(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_blank)
}

fn check_unconditional_required(
    catalog: &[FieldDef],
    record: &Record,
    active: &ActiveRuleSet,
    reported: &mut BTreeSet<String>,
    issues: &mut Vec<Issue>,
) {
    for def in catalog {
        // Booleans always carry a value; the declaration has its own check.
        if !def.required || def.field_type == FieldType::Boolean || active.is_hidden(def.id) {
            continue;
        }
        if missing(record.get(def.id)) && reported.insert(def.id.to_string()) {
            issues.push(Issue::required(def.id));
        }
    }
}

fn check_conditional_required(
    record: &Record,
    active: &ActiveRuleSet,
    reported: &mut BTreeSet<String>,
    issues: &mut Vec<Issue>,
) {
    for rule in RECORD_RULES {
        if !active.fired.iter().any(|id| id == rule.id) {
            continue;
        }
        for c in rule.consequences {
            if c.effect == Effect::Required
                && missing(record.get(c.field))
                && reported.insert(c.field.to_string())
            {
                issues.push(Issue::required(c.field));
            }
        }
    }
}

fn check_element_required(
    record: &Record,
    active: &ActiveRuleSet,
    reported: &mut BTreeSet<String>,
    issues: &mut Vec<Issue>,
) {
    for kind in GroupKind::ALL {
        let defs = kind.policy().fields;
        for (index, element) in record.group(kind).iter().enumerate() {
            for def in defs {
                if def.field_type == FieldType::Boolean {
                    continue;
                }
                let path = element_path(kind, index, def.id);
                let required =
                    (def.required && !active.is_hidden(&path)) || active.is_required(&path);
                if required && missing(element.get(def.id)) && reported.insert(path.clone()) {
                    issues.push(Issue::required(path));
                }
            }
        }
    }
}

fn check_cardinality(record: &Record, issues: &mut Vec<Issue>) {
    for kind in GroupKind::ALL {
        let policy = kind.policy();
        let len = record.group(kind).len();
        let min = effective_min(record, kind);
        if len < min {
            issues.push(Issue::error(
                IssueKind::Consistency,
                kind.key(),
                format!("at least {min} entries required"),
            ));
        }
        if len > policy.max {
            issues.push(Issue::error(
                IssueKind::Consistency,
                kind.key(),
                format!("at most {} entries allowed", policy.max),
            ));
        }
        if let Some(trigger) = policy.trigger {
            if record.text(trigger.field) != Some(trigger.populate) && len > 0 {
                issues.push(Issue::error(
                    IssueKind::Consistency,
                    kind.key(),
                    format!("must be empty unless {} is '{}'", trigger.field, trigger.populate),
                ));
            }
        }
    }
}

fn check_parent_relations(record: &Record, issues: &mut Vec<Issue>) {
    for kind in GroupKind::ALL {
        if !kind.policy().unique_relation {
            continue;
        }
        let mut seen = BTreeSet::new();
        for (index, element) in record.group(kind).iter().enumerate() {
            let Some(relation) = element.get("relation").and_then(Value::as_str) else {
                continue;
            };
            if relation.trim().is_empty() {
                continue;
            }
            if !seen.insert(relation) {
                issues.push(Issue::error(
                    IssueKind::Consistency,
                    element_path(kind, index, "relation"),
                    format!("'{relation}' is already listed"),
                ));
            }
        }
    }
}

fn date_of(fields: &Fields, id: &str) -> Option<Date> {
    fields.get(id).and_then(Value::as_str).and_then(parse_date)
}

fn check_passport_dates(record: &Record, ctx: &ValidationContext, issues: &mut Vec<Issue>) {
    let issued = date_of(&record.fields, "passport_issue_date");
    let Some(expiry) = date_of(&record.fields, "passport_expiry_date") else {
        return;
    };
    if let Some(issued) = issued {
        if issued >= expiry {
            issues.push(Issue::error(
                IssueKind::Consistency,
                "passport_expiry_date",
                "must be after the issue date",
            ));
        }
    }
    if (expiry - ctx.today).whole_days() < PASSPORT_EXPIRY_WARNING_DAYS {
        issues.push(Issue {
            path: "passport_expiry_date".to_string(),
            message: format!("passport expires within {PASSPORT_EXPIRY_WARNING_DAYS} days"),
            severity: Severity::Warning,
            kind: IssueKind::Consistency,
        });
    }
}

fn check_date_of_birth(record: &Record, ctx: &ValidationContext, issues: &mut Vec<Issue>) {
    if let Some(dob) = date_of(&record.fields, "date_of_birth") {
        if dob >= ctx.today {
            issues.push(Issue::error(
                IssueKind::Consistency,
                "date_of_birth",
                "must be in the past",
            ));
        }
    }
}

fn check_prior_school_years(record: &Record, ctx: &ValidationContext, issues: &mut Vec<Issue>) {
    let this_year = Decimal::from(ctx.today.year());
    for (index, school) in record.group(GroupKind::PriorSchools).iter().enumerate() {
        let from = school.get("from_year").and_then(Value::as_number);
        let to = school.get("to_year").and_then(Value::as_number);
        let path = element_path(GroupKind::PriorSchools, index, "to_year");
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                issues.push(Issue::error(
                    IssueKind::Consistency,
                    path.clone(),
                    "must not be before the starting year",
                ));
            }
        }
        if to.is_some_and(|to| to > this_year) {
            issues.push(Issue::error(
                IssueKind::Consistency,
                path,
                "must not be in the future",
            ));
        }
    }
}

fn check_declaration(record: &Record, issues: &mut Vec<Issue>) {
    if record.get("declaration_accepted").and_then(Value::as_bool) != Some(true) {
        issues.push(Issue::error(
            IssueKind::Required,
            "declaration_accepted",
            "the declaration must be accepted",
        ));
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
