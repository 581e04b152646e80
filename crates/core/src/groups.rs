//! Repeatable sub-record groups and their static policies.

use serde::{Deserialize, Serialize};

use crate::catalog::{
    FieldDef, Format, BOARDS, CLASSES, GUARDIAN_RELATIONS, NO, PARENT_RELATIONS, YES,
};
use crate::rules::{Rule, GUARDIAN_RULES, PARENT_RULES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Parents,
    Guardians,
    Siblings,
    PriorSchools,
    Languages,
}

/// Trigger field binding for auto-populated groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupTrigger {
    pub field: &'static str,
    pub populate: &'static str,
    pub depopulate: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct GroupPolicy {
    pub kind: GroupKind,
    pub trigger: Option<GroupTrigger>,
    pub min: usize,
    pub max: usize,
    pub fields: &'static [FieldDef],
    pub rules: &'static [Rule],
    /// Elements must carry pairwise distinct `relation` values.
    pub unique_relation: bool,
}

impl GroupKind {
    pub const ALL: [GroupKind; 5] = [
        GroupKind::Parents,
        GroupKind::Guardians,
        GroupKind::Siblings,
        GroupKind::PriorSchools,
        GroupKind::Languages,
    ];

    /// Key used in record JSON, payloads and issue paths.
    pub fn key(self) -> &'static str {
        match self {
            GroupKind::Parents => "parents",
            GroupKind::Guardians => "guardians",
            GroupKind::Siblings => "siblings",
            GroupKind::PriorSchools => "prior_schools",
            GroupKind::Languages => "languages",
        }
    }

    pub fn from_key(key: &str) -> Option<GroupKind> {
        GroupKind::ALL.into_iter().find(|k| k.key() == key)
    }

    pub fn policy(self) -> &'static GroupPolicy {
        match self {
            GroupKind::Parents => &PARENTS,
            GroupKind::Guardians => &GUARDIANS,
            GroupKind::Siblings => &SIBLINGS,
            GroupKind::PriorSchools => &PRIOR_SCHOOLS,
            GroupKind::Languages => &LANGUAGES,
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ──────────────────────────────────────────────
// Element schemas
// ──────────────────────────────────────────────

static PARENT_FIELDS: &[FieldDef] = &[
    FieldDef::choice("relation", PARENT_RELATIONS).required(),
    FieldDef::person_name("first_name").required(),
    FieldDef::person_name("last_name").required(),
    FieldDef::email("email").required(),
    FieldDef::phone("phone").required(),
    FieldDef::text("occupation").length(0, 100),
    FieldDef::number("annual_income").range(0, 1_000_000_000),
    FieldDef::boolean("address_same_as_applicant"),
    FieldDef::text("address_line1").length(1, 200).required(),
    FieldDef::text("address_line2"),
    FieldDef::text("country").length(1, 60).required(),
    FieldDef::text("postal_code").format(Format::PostalCode).required(),
    FieldDef::text("region").length(1, 100).required(),
    FieldDef::text("city").length(1, 100).required(),
];

static GUARDIAN_FIELDS: &[FieldDef] = &[
    FieldDef::person_name("name").length(1, 100).required(),
    FieldDef::choice("relation", GUARDIAN_RELATIONS).required(),
    FieldDef::text("other_relation").length(0, 50),
    FieldDef::email("email").required(),
    FieldDef::phone("phone").required(),
    FieldDef::boolean("address_same_as_applicant"),
    FieldDef::text("address_line1").length(1, 200).required(),
    FieldDef::text("address_line2"),
    FieldDef::text("country").length(1, 60).required(),
    FieldDef::text("postal_code").format(Format::PostalCode).required(),
    FieldDef::text("region").length(1, 100).required(),
    FieldDef::text("city").length(1, 100).required(),
];

static SIBLING_FIELDS: &[FieldDef] = &[
    FieldDef::person_name("name").length(1, 100).required(),
    FieldDef::choice("class_name", CLASSES).required(),
    FieldDef::text("admission_number").length(0, 20),
];

static PRIOR_SCHOOL_FIELDS: &[FieldDef] = &[
    FieldDef::text("school_name").length(1, 150).required(),
    FieldDef::choice("board", BOARDS).required(),
    FieldDef::number("from_year").range(1990, 2100).required(),
    FieldDef::number("to_year").range(1990, 2100).required(),
    FieldDef::choice("last_class_attended", CLASSES).required(),
];

static LANGUAGE_FIELDS: &[FieldDef] = &[
    FieldDef::text("language").length(1, 50).required(),
    FieldDef::boolean("can_read"),
    FieldDef::boolean("can_write"),
    FieldDef::boolean("can_speak"),
];

// ──────────────────────────────────────────────
// Policies
// ──────────────────────────────────────────────

static PARENTS: GroupPolicy = GroupPolicy {
    kind: GroupKind::Parents,
    trigger: None,
    min: 1,
    max: 2,
    fields: PARENT_FIELDS,
    rules: PARENT_RULES,
    unique_relation: true,
};

static GUARDIANS: GroupPolicy = GroupPolicy {
    kind: GroupKind::Guardians,
    trigger: Some(GroupTrigger {
        field: "has_guardian",
        populate: YES,
        depopulate: NO,
    }),
    min: 1,
    max: 2,
    fields: GUARDIAN_FIELDS,
    rules: GUARDIAN_RULES,
    unique_relation: false,
};

static SIBLINGS: GroupPolicy = GroupPolicy {
    kind: GroupKind::Siblings,
    trigger: Some(GroupTrigger {
        field: "has_sibling_in_ihs",
        populate: YES,
        depopulate: NO,
    }),
    min: 1,
    max: 5,
    fields: SIBLING_FIELDS,
    rules: &[],
    unique_relation: false,
};

static PRIOR_SCHOOLS: GroupPolicy = GroupPolicy {
    kind: GroupKind::PriorSchools,
    trigger: Some(GroupTrigger {
        field: "has_previous_schools",
        populate: YES,
        depopulate: NO,
    }),
    min: 1,
    max: 5,
    fields: PRIOR_SCHOOL_FIELDS,
    rules: &[],
    unique_relation: false,
};

static LANGUAGES: GroupPolicy = GroupPolicy {
    kind: GroupKind::Languages,
    trigger: None,
    min: 1,
    max: 6,
    fields: LANGUAGE_FIELDS,
    rules: &[],
    unique_relation: false,
};
