//! Conditional rule evaluation.
//!
//! `evaluate` is a pure function of a rule table and one field map:
//! every rule's condition is checked against its trigger's current value
//! and the consequences of the rules that fire are unioned into an
//! [`ActiveRuleSet`]. Rules never see each other's results.
//!
//! Fields governed by a show consequence (required or visible) whose
//! rules all fail are hidden, and cleared when their consequence says
//! so. [`apply_clears`] performs those clears and re-evaluates until
//! nothing more is cleared, so a cleared trigger also clears the fields
//! it was gating.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use admit_core::rules::RECORD_RULES;
use admit_core::{Effect, Fields, GroupKind, Record, Rule};

use crate::element_path;

/// Result of evaluating a rule table against a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveRuleSet {
    /// Ids of the rules whose condition held, in table order.
    pub fired: Vec<String>,
    /// Conditionally required fields.
    pub required: BTreeSet<String>,
    /// Fields shown by a firing rule (required or optional).
    pub visible: BTreeSet<String>,
    pub hidden: BTreeSet<String>,
    /// Hidden fields that currently hold a value and must be cleared.
    pub cleared: BTreeSet<String>,
}

impl ActiveRuleSet {
    pub fn is_required(&self, field: &str) -> bool {
        self.required.contains(field)
    }

    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    fn absorb(&mut self, other: ActiveRuleSet, prefix: impl Fn(&str) -> String) {
        self.fired.extend(other.fired.iter().map(|id| prefix(id)));
        self.required.extend(other.required.iter().map(|f| prefix(f)));
        self.visible.extend(other.visible.iter().map(|f| prefix(f)));
        self.hidden.extend(other.hidden.iter().map(|f| prefix(f)));
        self.cleared.extend(other.cleared.iter().map(|f| prefix(f)));
    }
}

/// Evaluate one rule table against one field map.
pub fn evaluate(rules: &[Rule], fields: &Fields) -> ActiveRuleSet {
    let mut active = ActiveRuleSet::default();
    // field -> whether any of its show consequences clears on exit
    let mut governed: BTreeMap<&str, bool> = BTreeMap::new();

    for rule in rules {
        for c in rule.consequences {
            if c.effect != Effect::Hidden {
                *governed.entry(c.field).or_insert(false) |= c.clear_on_exit;
            }
        }

        if !rule.condition.holds(fields.get(rule.trigger)) {
            continue;
        }
        active.fired.push(rule.id.to_string());

        for c in rule.consequences {
            match c.effect {
                Effect::Required => {
                    active.required.insert(c.field.to_string());
                    active.visible.insert(c.field.to_string());
                }
                Effect::Visible => {
                    active.visible.insert(c.field.to_string());
                }
                Effect::Hidden => {
                    active.hidden.insert(c.field.to_string());
                }
            }
        }
    }

    for (field, clear_on_exit) in governed {
        if active.visible.contains(field) {
            continue;
        }
        active.hidden.insert(field.to_string());
        if clear_on_exit && fields.contains_key(field) {
            active.cleared.insert(field.to_string());
        }
    }

    active
}

/// Remove every field the rules say must be cleared, repeating until a
/// pass clears nothing. Returns the cleared field ids in clearing order.
pub fn apply_clears(rules: &[Rule], fields: &mut Fields) -> Vec<String> {
    let mut cleared = Vec::new();
    loop {
        let active = evaluate(rules, fields);
        if active.cleared.is_empty() {
            return cleared;
        }
        for field in active.cleared {
            fields.remove(&field);
            cleared.push(field);
        }
    }
}

/// Evaluate the record rules and every group element's rules.
///
/// Element results are reported under `group[index].field` paths.
pub fn evaluate_record(record: &Record) -> ActiveRuleSet {
    let mut active = evaluate(RECORD_RULES, &record.fields);
    for kind in GroupKind::ALL {
        let rules = kind.policy().rules;
        if rules.is_empty() {
            continue;
        }
        for (index, element) in record.group(kind).iter().enumerate() {
            let element_active = evaluate(rules, element);
            active.absorb(element_active, |f| element_path(kind, index, f));
        }
    }
    active
}

/// Apply clears across the record scalars and every group element.
/// Returns the cleared paths.
pub fn apply_record_clears(record: &mut Record) -> Vec<String> {
    let mut cleared = apply_clears(RECORD_RULES, &mut record.fields);
    for kind in GroupKind::ALL {
        let rules = kind.policy().rules;
        if rules.is_empty() {
            continue;
        }
        for (index, element) in record.group_mut(kind).iter_mut().enumerate() {
            cleared.extend(
                apply_clears(rules, element)
                    .into_iter()
                    .map(|f| element_path(kind, index, &f)),
            );
        }
    }
    cleared
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
