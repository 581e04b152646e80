//! Repeatable group lifecycle.
//!
//! Trigger-bound groups (siblings, prior schools, guardians) follow
//! their "Yes"/"No" trigger: a "Yes" on an empty list appends one
//! default element, a "No" empties the list. Parents and languages are
//! user-managed within their cardinality bounds and are topped up to
//! their minimum, never cleared.
//!
//! The manager remembers the `(trigger value, length)` pair it last
//! reconciled for each group, so re-running reconciliation after an
//! unrelated edit is a no-op.

use std::collections::BTreeMap;

use serde::Serialize;

use admit_core::{default_element, Fields, GroupKind, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Appended,
    Cleared,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("{group} already has the maximum of {max} entries")]
    TooMany { group: GroupKind, max: usize },
    #[error("{group} must keep at least {min} entries")]
    TooFew { group: GroupKind, min: usize },
    #[error("{group} has no entry at index {index}")]
    NoSuchElement { group: GroupKind, index: usize },
}

/// Minimum number of elements the group must hold right now.
///
/// Trigger-bound groups only have a minimum while their trigger asks for
/// the group to be populated.
pub fn effective_min(record: &Record, kind: GroupKind) -> usize {
    let policy = kind.policy();
    match policy.trigger {
        None => policy.min,
        Some(trigger) if record.text(trigger.field) == Some(trigger.populate) => policy.min,
        Some(_) => 0,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupManager {
    seen: BTreeMap<GroupKind, (Option<String>, usize)>,
}

impl GroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring one group in line with its trigger.
    pub fn reconcile(&mut self, record: &mut Record, kind: GroupKind) -> ReconcileOutcome {
        let policy = kind.policy();
        let trigger_value = policy
            .trigger
            .and_then(|t| record.text(t.field))
            .map(str::to_string);
        let key = (trigger_value, record.group(kind).len());
        if self.seen.get(&kind) == Some(&key) {
            return ReconcileOutcome::Unchanged;
        }

        let (trigger_value, len) = key;
        let outcome = match policy.trigger {
            Some(trigger) => match trigger_value.as_deref() {
                Some(v) if v == trigger.populate && len == 0 => {
                    record.group_mut(kind).push(default_element(kind));
                    ReconcileOutcome::Appended
                }
                Some(v) if v == trigger.depopulate && len > 0 => {
                    record.group_mut(kind).clear();
                    ReconcileOutcome::Cleared
                }
                _ => ReconcileOutcome::Unchanged,
            },
            None if len < policy.min => {
                let group = record.group_mut(kind);
                while group.len() < policy.min {
                    group.push(default_element(kind));
                }
                ReconcileOutcome::Appended
            }
            None => ReconcileOutcome::Unchanged,
        };

        self.seen
            .insert(kind, (trigger_value, record.group(kind).len()));
        outcome
    }

    /// Reconcile every group; returns only the groups that changed.
    pub fn reconcile_all(&mut self, record: &mut Record) -> Vec<(GroupKind, ReconcileOutcome)> {
        GroupKind::ALL
            .into_iter()
            .map(|kind| (kind, self.reconcile(record, kind)))
            .filter(|(_, outcome)| *outcome != ReconcileOutcome::Unchanged)
            .collect()
    }

    /// Append a default element. Returns its index.
    pub fn add_element(&mut self, record: &mut Record, kind: GroupKind) -> Result<usize, GroupError> {
        let max = kind.policy().max;
        let group = record.group_mut(kind);
        if group.len() >= max {
            return Err(GroupError::TooMany { group: kind, max });
        }
        group.push(default_element(kind));
        Ok(group.len() - 1)
    }

    /// Remove the element at `index`, keeping the group at or above its
    /// effective minimum.
    pub fn remove_element(
        &mut self,
        record: &mut Record,
        kind: GroupKind,
        index: usize,
    ) -> Result<Fields, GroupError> {
        let min = effective_min(record, kind);
        let group = record.group_mut(kind);
        if index >= group.len() {
            return Err(GroupError::NoSuchElement { group: kind, index });
        }
        if group.len() <= min {
            return Err(GroupError::TooFew { group: kind, min });
        }
        Ok(group.remove(index))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
