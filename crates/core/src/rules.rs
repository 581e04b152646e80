//! The static conditional rule table.
//!
//! A [`Rule`] pairs one trigger field and a condition on its value with
//! a list of consequences. Rules are independent: evaluation never
//! feeds one rule's outcome into another rule's condition. Evaluation
//! itself lives in `admit-eval`; this module only declares the table
//! and checks it for contradictions.

use crate::catalog::{
    CLASS_XI_QUESTIONS, JUNIOR_CLASSES, SUBJECT_GROUP_CHOICES, YES,
};
use crate::value::Value;

// ──────────────────────────────────────────────
// Rule types
// ──────────────────────────────────────────────

/// Condition over the trigger field's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Trigger holds exactly this text.
    Equals(&'static str),
    /// Trigger holds one of these texts.
    OneOf(&'static [&'static str]),
    /// Trigger is the boolean `true`.
    IsTrue,
    /// Trigger is anything but the boolean `true` (including absent).
    NotTrue,
}

impl Condition {
    pub fn holds(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Equals(expected) => {
                matches!(value, Some(Value::Text(s)) if s == expected)
            }
            Condition::OneOf(options) => {
                matches!(value, Some(Value::Text(s)) if options.contains(&s.as_str()))
            }
            Condition::IsTrue => matches!(value, Some(Value::Bool(true))),
            Condition::NotTrue => !matches!(value, Some(Value::Bool(true))),
        }
    }

    /// Whether some single trigger value satisfies both conditions.
    pub fn overlaps(&self, other: &Condition) -> bool {
        use Condition::*;
        match (self, other) {
            (Equals(a), Equals(b)) => a == b,
            (Equals(a), OneOf(set)) | (OneOf(set), Equals(a)) => set.contains(a),
            (OneOf(a), OneOf(b)) => a.iter().any(|x| b.contains(x)),
            (IsTrue, IsTrue) | (NotTrue, NotTrue) => true,
            (IsTrue, NotTrue) | (NotTrue, IsTrue) => false,
            // Any text value is "not true".
            (NotTrue, _) | (_, NotTrue) => true,
            (IsTrue, _) | (_, IsTrue) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Required and visible while the condition holds.
    Required,
    /// Visible but optional while the condition holds.
    Visible,
    /// Hidden while the condition holds.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consequence {
    pub field: &'static str,
    pub effect: Effect,
    /// Clear the stored value once the field is no longer shown. Only show
    /// consequences govern clearing; hidden ones ignore this flag.
    pub clear_on_exit: bool,
}

impl Consequence {
    pub const fn required(field: &'static str) -> Self {
        Consequence {
            field,
            effect: Effect::Required,
            clear_on_exit: true,
        }
    }

    pub const fn visible(field: &'static str) -> Self {
        Consequence {
            field,
            effect: Effect::Visible,
            clear_on_exit: true,
        }
    }

    pub const fn hidden(field: &'static str) -> Self {
        Consequence {
            field,
            effect: Effect::Hidden,
            clear_on_exit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub id: &'static str,
    pub trigger: &'static str,
    pub condition: Condition,
    pub consequences: &'static [Consequence],
}

impl Rule {
    /// Fields that this rule shows (required or optional) when it fires.
    pub fn shown_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.consequences
            .iter()
            .filter(|c| matches!(c.effect, Effect::Required | Effect::Visible))
            .map(|c| c.field)
    }
}

// ──────────────────────────────────────────────
// Static table check
// ──────────────────────────────────────────────

/// A pair of rules that can both fire for one trigger value while
/// disagreeing on whether a field is shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rules '{first}' and '{second}' contradict on field '{field}' for trigger '{trigger}'")]
pub struct RuleTableError {
    pub first: &'static str,
    pub second: &'static str,
    pub trigger: &'static str,
    pub field: &'static str,
}

/// Check that no trigger state makes a field both shown and hidden.
pub fn check_rule_table(rules: &[Rule]) -> Result<(), RuleTableError> {
    for (i, a) in rules.iter().enumerate() {
        for b in &rules[i..] {
            if a.trigger != b.trigger || !a.condition.overlaps(&b.condition) {
                continue;
            }
            for ca in a.consequences {
                for cb in b.consequences {
                    if ca.field != cb.field {
                        continue;
                    }
                    let shown_a = ca.effect != Effect::Hidden;
                    let shown_b = cb.effect != Effect::Hidden;
                    if shown_a != shown_b {
                        return Err(RuleTableError {
                            first: a.id,
                            second: b.id,
                            trigger: a.trigger,
                            field: ca.field,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Built-in record rules
// ──────────────────────────────────────────────

const fn yes(id: &'static str, trigger: &'static str, consequences: &'static [Consequence]) -> Rule {
    Rule {
        id,
        trigger,
        condition: Condition::Equals(YES),
        consequences,
    }
}

const CLASS_XI_CONSEQUENCES: &[Consequence] = &{
    let mut out = [Consequence::required(""); 17];
    let mut i = 0;
    while i < SUBJECT_GROUP_CHOICES.len() {
        out[i] = Consequence::required(SUBJECT_GROUP_CHOICES[i]);
        i += 1;
    }
    let mut j = 0;
    while j < CLASS_XI_QUESTIONS.len() {
        out[i + j] = Consequence::required(CLASS_XI_QUESTIONS[j]);
        j += 1;
    }
    out
};

/// Rules over the record's scalar fields, in declaration order.
///
/// Conditional-requirement issues are reported in this order.
pub static RECORD_RULES: &[Rule] = &[
    Rule {
        id: "other_gender",
        trigger: "gender",
        condition: Condition::Equals("Other"),
        consequences: &[Consequence::required("other_gender")],
    },
    Rule {
        id: "other_religion",
        trigger: "religion",
        condition: Condition::Equals("Other"),
        consequences: &[Consequence::required("other_religion")],
    },
    Rule {
        id: "other_community",
        trigger: "community",
        condition: Condition::Equals("Other"),
        consequences: &[Consequence::required("other_community")],
    },
    Rule {
        id: "aadhaar",
        trigger: "id_proof",
        condition: Condition::Equals("Aadhaar Card"),
        consequences: &[Consequence::required("aadhaar_number")],
    },
    Rule {
        id: "passport",
        trigger: "id_proof",
        condition: Condition::Equals("Passport"),
        consequences: &[
            Consequence::required("passport_number"),
            Consequence::required("passport_place_of_issue"),
            Consequence::required("passport_issue_date"),
            Consequence::required("passport_expiry_date"),
        ],
    },
    Rule {
        id: "class_xi_selection",
        trigger: "applied_for",
        condition: Condition::Equals("Class XI"),
        consequences: CLASS_XI_CONSEQUENCES,
    },
    Rule {
        id: "junior_bed_wetting",
        trigger: "applied_for",
        condition: Condition::OneOf(JUNIOR_CLASSES),
        consequences: &[Consequence::required("wets_bed")],
    },
    yes(
        "bed_wet_frequency",
        "wets_bed",
        &[Consequence::required("bed_wet_frequency")],
    ),
    Rule {
        id: "current_school",
        trigger: "is_home_schooled",
        condition: Condition::Equals("No"),
        consequences: &[
            Consequence::required("current_school_name"),
            Consequence::required("current_school_board"),
            Consequence::required("current_school_address_line1"),
            Consequence::visible("current_school_address_line2"),
            Consequence::required("current_school_country"),
            Consequence::required("current_school_postal_code"),
            Consequence::required("current_school_region"),
            Consequence::required("current_school_city"),
        ],
    },
    yes(
        "home_schooling",
        "is_home_schooled",
        &[Consequence::required("home_schooling_details")],
    ),
    yes(
        "vision",
        "wears_glasses_or_lens",
        &[Consequence::required("vision_details")],
    ),
    yes(
        "learning_challenge",
        "has_learning_challenge",
        &[Consequence::required("learning_challenge_details")],
    ),
    yes(
        "physical_challenge",
        "has_physical_challenge",
        &[Consequence::required("physical_challenge_details")],
    ),
    yes(
        "speech_challenge",
        "has_speech_challenge",
        &[Consequence::required("speech_challenge_details")],
    ),
    yes(
        "emotional_challenge",
        "has_emotional_challenge",
        &[Consequence::required("emotional_challenge_details")],
    ),
    yes(
        "allergy",
        "has_allergy",
        &[Consequence::required("allergy_details")],
    ),
    yes(
        "chronic_illness",
        "has_chronic_illness",
        &[Consequence::required("chronic_illness_details")],
    ),
    yes(
        "surgery",
        "had_major_surgery",
        &[Consequence::required("surgery_details")],
    ),
    yes(
        "medication",
        "on_medication",
        &[
            Consequence::required("medication_details"),
            Consequence::required("medication_prescription"),
        ],
    ),
    Rule {
        id: "billing_address",
        trigger: "billing_same_as_communication",
        condition: Condition::NotTrue,
        consequences: &[
            Consequence::required("billing_address_line1"),
            Consequence::visible("billing_address_line2"),
            Consequence::required("billing_country"),
            Consequence::required("billing_postal_code"),
            Consequence::required("billing_region"),
            Consequence::required("billing_city"),
        ],
    },
    Rule {
        id: "custody",
        trigger: "parent_marital_status",
        condition: Condition::Equals("Divorced"),
        consequences: &[
            Consequence::required("custody_holder"),
            Consequence::required("custody_arrangement"),
            Consequence::required("court_order_number"),
            Consequence::required("divorce_date"),
            Consequence::visible("visitation_details"),
            Consequence::required("custody_order"),
        ],
    },
];

// ──────────────────────────────────────────────
// Built-in element rules
// ──────────────────────────────────────────────

/// Address fields of a parent or guardian element.
pub const ELEMENT_ADDRESS_FIELDS: &[&str] = &[
    "address_line1",
    "address_line2",
    "country",
    "postal_code",
    "region",
    "city",
];

const SAME_AS_APPLICANT_HIDES: &[Consequence] = &[
    Consequence::hidden("address_line1"),
    Consequence::hidden("address_line2"),
    Consequence::hidden("country"),
    Consequence::hidden("postal_code"),
    Consequence::hidden("region"),
    Consequence::hidden("city"),
];

pub static PARENT_RULES: &[Rule] = &[Rule {
    id: "parent_address_copied",
    trigger: "address_same_as_applicant",
    condition: Condition::IsTrue,
    consequences: SAME_AS_APPLICANT_HIDES,
}];

pub static GUARDIAN_RULES: &[Rule] = &[
    Rule {
        id: "guardian_other_relation",
        trigger: "relation",
        condition: Condition::Equals("Other"),
        consequences: &[Consequence::required("other_relation")],
    },
    Rule {
        id: "guardian_address_copied",
        trigger: "address_same_as_applicant",
        condition: Condition::IsTrue,
        consequences: SAME_AS_APPLICANT_HIDES,
    },
];
