//! The editing session: single owner and writer of the record.
//!
//! Every mutation runs the same settle pass before returning: clear the
//! fields the rules hide, reconcile group sizes, refresh copied
//! addresses, re-evaluate, and diff each address group's lookup inputs.
//! Lookups themselves run elsewhere; their outcomes come back through
//! [`Session::apply_lookup`], which drops any answer whose staleness tag
//! no longer matches the group's inputs.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use admit_core::catalog::{self, FIELDS};
use admit_core::{GroupKind, Record, Value};

use crate::address::{
    AddressEnricher, AddressGroup, AddressQuery, AddressResult, LookupError, LookupOutcome,
    LookupState, COMMUNICATION, ELEMENT, SAME_AS_APPLICANT,
};
use crate::groups::{GroupError, GroupManager, ReconcileOutcome};
use crate::payload::{self, Payload, PayloadError};
use crate::rules::{apply_record_clears, evaluate_record, ActiveRuleSet};
use crate::validate::{self, Issue, ValidationContext};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("unknown field '{field}' for {group}")]
    UnknownElementField { group: GroupKind, field: String },
    #[error(transparent)]
    Group(#[from] GroupError),
}

/// What a mutation changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Update {
    pub active: ActiveRuleSet,
    /// Paths cleared because their governing rules stopped holding.
    pub cleared: Vec<String>,
    pub outcomes: Vec<(GroupKind, ReconcileOutcome)>,
    /// Address groups whose inputs changed and need a lookup.
    pub queries: Vec<(AddressGroup, AddressQuery)>,
}

impl Update {
    /// Hand this update's queries to the enricher.
    pub fn schedule(&self, enricher: &AddressEnricher) {
        for (group, query) in &self.queries {
            enricher.schedule(*group, query.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    record: Record,
    active: ActiveRuleSet,
    groups: GroupManager,
    last_queries: BTreeMap<AddressGroup, AddressQuery>,
    lookups: BTreeMap<AddressGroup, LookupState>,
    /// Last successful lookup per group, kept until its inputs change.
    results: BTreeMap<AddressGroup, AddressResult>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    /// A session over a fresh record.
    pub fn new() -> Self {
        Session::from_record(Record::new())
    }

    /// A session over an existing record.
    pub fn from_record(record: Record) -> Self {
        Session::open(record).0
    }

    /// Like [`Session::from_record`], also returning what the initial
    /// settle pass changed. The record's address inputs at this point
    /// are taken as already enriched, so the update carries no queries.
    pub fn open(record: Record) -> (Self, Update) {
        let mut session = Session {
            record,
            active: ActiveRuleSet::default(),
            groups: GroupManager::new(),
            last_queries: BTreeMap::new(),
            lookups: BTreeMap::new(),
            results: BTreeMap::new(),
        };
        for group in AddressGroup::all(&session.record) {
            if let Some(query) = group.query(&session.record) {
                session.last_queries.insert(group, query);
            }
        }
        let mut update = session.settle();
        update.queries.clear();
        session.lookups.clear();
        (session, update)
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn active(&self) -> &ActiveRuleSet {
        &self.active
    }

    pub fn lookup_state(&self, group: AddressGroup) -> LookupState {
        self.lookups.get(&group).cloned().unwrap_or_default()
    }

    /// Region and city options from the last lookup that landed for the
    /// group's current inputs.
    pub fn lookup_result(&self, group: AddressGroup) -> Option<&AddressResult> {
        self.results.get(&group)
    }

    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) -> Result<Update, SessionError> {
        let def = catalog::field(field).ok_or_else(|| SessionError::UnknownField(field.to_string()))?;
        self.record.set(def.id, value);
        Ok(self.settle())
    }

    pub fn clear_value(&mut self, field: &str) -> Result<Update, SessionError> {
        let def = catalog::field(field).ok_or_else(|| SessionError::UnknownField(field.to_string()))?;
        self.record.remove(def.id);
        Ok(self.settle())
    }

    pub fn set_element_value(
        &mut self,
        kind: GroupKind,
        index: usize,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Update, SessionError> {
        let def = catalog::find(kind.policy().fields, field).ok_or_else(|| {
            SessionError::UnknownElementField {
                group: kind,
                field: field.to_string(),
            }
        })?;
        let element = self
            .record
            .element_mut(kind, index)
            .ok_or(GroupError::NoSuchElement { group: kind, index })?;
        element.insert(def.id.to_string(), value.into());
        Ok(self.settle())
    }

    pub fn add_element(&mut self, kind: GroupKind) -> Result<Update, SessionError> {
        self.groups.add_element(&mut self.record, kind)?;
        Ok(self.settle())
    }

    pub fn remove_element(&mut self, kind: GroupKind, index: usize) -> Result<Update, SessionError> {
        self.groups.remove_element(&mut self.record, kind, index)?;
        self.shift_address_state(kind, index);
        Ok(self.settle())
    }

    /// Apply a finished lookup. Returns `false` when the outcome was stale
    /// and dropped.
    pub fn apply_lookup(&mut self, outcome: LookupOutcome) -> bool {
        let LookupOutcome { group, tag, result } = outcome;
        let current = group.query(&self.record);
        if !current.as_ref().is_some_and(|q| tag.matches(q)) {
            debug!(%group, postal_code = %tag.postal_code, "discarding stale lookup result");
            return false;
        }

        let fields = group.fields();
        let state = match result {
            Ok(found) => {
                if let Some(slot) = group.slot_mut(&mut self.record) {
                    put(slot, fields.region, found.chosen_region.clone());
                    put(slot, fields.city, found.chosen_city.clone());
                }
                self.results.insert(group, found);
                LookupState::default()
            }
            Err(e) => {
                self.clear_region_and_city(group);
                self.results.remove(&group);
                LookupState {
                    loading: false,
                    error: Some(e.to_string()),
                }
            }
        };
        self.lookups.insert(group, state);

        if group == AddressGroup::Communication {
            self.copy_applicant_addresses();
        }
        self.active = evaluate_record(&self.record);
        true
    }

    pub fn validate(&self, ctx: &ValidationContext) -> Vec<Issue> {
        validate::validate(FIELDS, &self.record, &self.active, ctx)
    }

    pub fn build_payload(&self, ctx: &ValidationContext) -> Result<Payload, PayloadError> {
        payload::build(FIELDS, &self.record, ctx)
    }

    // ──────────────────────────────────────────────
    // Settle pass
    // ──────────────────────────────────────────────

    fn settle(&mut self) -> Update {
        let mut cleared = apply_record_clears(&mut self.record);
        let outcomes = self.groups.reconcile_all(&mut self.record);
        if !outcomes.is_empty() {
            cleared.extend(apply_record_clears(&mut self.record));
        }
        self.copy_applicant_addresses();
        self.active = evaluate_record(&self.record);
        let queries = self.diff_queries();

        Update {
            active: self.active.clone(),
            cleared,
            outcomes,
            queries,
        }
    }

    /// Copy the communication address into every parent and guardian
    /// that asked for it.
    fn copy_applicant_addresses(&mut self) {
        let source: Vec<Option<Value>> = COMMUNICATION
            .all()
            .iter()
            .map(|id| self.record.get(id).cloned())
            .collect();
        for kind in [GroupKind::Parents, GroupKind::Guardians] {
            for element in self.record.group_mut(kind) {
                if element.get(SAME_AS_APPLICANT).and_then(Value::as_bool) != Some(true) {
                    continue;
                }
                for (id, value) in ELEMENT.all().iter().zip(&source) {
                    match value {
                        Some(v) => element.insert(id.to_string(), v.clone()),
                        None => element.remove(*id),
                    };
                }
            }
        }
    }

    fn diff_queries(&mut self) -> Vec<(AddressGroup, AddressQuery)> {
        let groups = AddressGroup::all(&self.record);
        self.last_queries.retain(|g, _| groups.contains(g));
        self.lookups.retain(|g, _| groups.contains(g));
        self.results.retain(|g, _| groups.contains(g));

        let mut queries = Vec::new();
        for group in groups {
            let Some(query) = group.query(&self.record) else {
                self.last_queries.remove(&group);
                self.lookups.remove(&group);
                self.results.remove(&group);
                continue;
            };
            let unchanged = match self.last_queries.get(&group) {
                Some(prev) => *prev == query,
                None => query.is_blank(),
            };
            if unchanged {
                self.last_queries.insert(group, query);
                continue;
            }
            self.last_queries.insert(group, query.clone());
            self.results.remove(&group);

            match query.check() {
                Ok(_) => {
                    self.lookups.insert(
                        group,
                        LookupState {
                            loading: true,
                            error: None,
                        },
                    );
                    queries.push((group, query));
                }
                Err(e) => {
                    self.clear_region_and_city(group);
                    let incomplete =
                        query.country.trim().is_empty() || query.postal_code.trim().is_empty();
                    let error = (!incomplete).then(|| e.to_string());
                    if let LookupError::PostalCodeTooShort { .. } = e {
                        debug!(%group, "postal code too short for lookup");
                    }
                    self.lookups.insert(group, LookupState { loading: false, error });
                }
            }
        }
        queries
    }

    fn clear_region_and_city(&mut self, group: AddressGroup) {
        let fields = group.fields();
        if let Some(slot) = group.slot_mut(&mut self.record) {
            slot.remove(fields.region);
            slot.remove(fields.city);
        }
    }

    /// Re-key per-element address state after removing `removed` from
    /// `kind`, so later elements keep their history. A lookup in flight
    /// for a shifted element is tagged with its old index and will be
    /// dropped, so its baseline is forgotten and the next settle asks
    /// again under the new index.
    fn shift_address_state(&mut self, kind: GroupKind, removed: usize) {
        fn shift<T>(map: &mut BTreeMap<AddressGroup, T>, kind: GroupKind, removed: usize) {
            let keys: Vec<AddressGroup> = map.keys().copied().collect();
            let mut moved = Vec::new();
            for group in keys {
                let Some((k, i)) = group.element() else { continue };
                if k != kind || i < removed {
                    continue;
                }
                if let Some(v) = map.remove(&group) {
                    if i > removed {
                        moved.push((i - 1, v));
                    }
                }
            }
            for (i, v) in moved {
                if let Some(group) = AddressGroup::for_element(kind, i) {
                    map.insert(group, v);
                }
            }
        }
        let in_flight: Vec<AddressGroup> = self
            .lookups
            .iter()
            .filter(|(_, state)| state.loading)
            .filter_map(|(group, _)| match group.element() {
                Some((k, i)) if k == kind && i > removed => AddressGroup::for_element(kind, i - 1),
                _ => None,
            })
            .collect();

        shift(&mut self.last_queries, kind, removed);
        shift(&mut self.lookups, kind, removed);
        shift(&mut self.results, kind, removed);

        for group in in_flight {
            self.last_queries.remove(&group);
            self.lookups.remove(&group);
        }
    }
}

fn put(slot: &mut admit_core::Fields, id: &str, value: Option<String>) {
    match value {
        Some(v) => slot.insert(id.to_string(), Value::Text(v)),
        None => slot.remove(id),
    };
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
