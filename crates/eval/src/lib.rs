//! Admissions record engine -- evaluates conditional rules over a record
//! snapshot, keeps repeatable groups in shape, enriches addresses,
//! validates, and builds the submission payload.
//!
//! The [`Session`] is the stateful entry point used by interactive
//! front ends. The `*_json` functions below are one-shot equivalents
//! over a record read from JSON.

pub mod address;
pub mod config;
pub mod groups;
pub mod payload;
pub mod rules;
pub mod session;
pub mod submit;
pub mod validate;

#[cfg(all(test, feature = "http"))]
mod test_server;

use admit_core::{GroupKind, Record, RecordError};

pub use address::{
    AddressEnricher, AddressGroup, AddressQuery, AddressResult, EnricherSettings, LookupError,
    LookupOutcome, LookupState, PostalLookup, PostalRecord, StalenessTag, StaticPostalLookup,
};
#[cfg(feature = "http")]
pub use address::HttpPostalLookup;
pub use config::{AdmitConfig, ConfigError};
pub use groups::{GroupError, GroupManager, ReconcileOutcome};
pub use payload::{Payload, PayloadError};
pub use rules::ActiveRuleSet;
pub use session::{Session, SessionError, Update};
#[cfg(feature = "http")]
pub use submit::HttpSubmission;
pub use submit::{AuthSignals, Receipt, SubmissionTransport, TokenAuth, TransportError};
pub use validate::{Issue, IssueKind, Severity, ValidationContext};

/// Issue path of a field inside a group element: `group[index].field`.
pub fn element_path(kind: GroupKind, index: usize, field: &str) -> String {
    format!("{}[{}].{}", kind.key(), index, field)
}

/// Read a record and settle it as a session would. Returns the settled
/// record and what settling changed.
pub fn evaluate_json(record: &serde_json::Value) -> Result<(Record, Update), RecordError> {
    let (session, update) = Session::open(Record::from_json(record)?);
    Ok((session.into_record(), update))
}

/// Read, settle and validate a record.
pub fn validate_json(
    record: &serde_json::Value,
    ctx: &ValidationContext,
) -> Result<Vec<Issue>, RecordError> {
    let (session, _) = Session::open(Record::from_json(record)?);
    Ok(session.validate(ctx))
}

/// Errors from the one-shot payload path.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Read, settle and encode a record. Refuses while errors remain.
pub fn payload_json(
    record: &serde_json::Value,
    ctx: &ValidationContext,
) -> Result<Payload, BuildError> {
    let (session, _) = Session::open(Record::from_json(record)?);
    Ok(session.build_payload(ctx)?)
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn element_paths() {
        assert_eq!(element_path(GroupKind::Parents, 1, "relation"), "parents[1].relation");
        assert_eq!(
            element_path(GroupKind::PriorSchools, 0, "to_year"),
            "prior_schools[0].to_year"
        );
    }

    #[test]
    fn settling_clears_hidden_values_and_reconciles() {
        let (record, update) = evaluate_json(&json!({
            "id_proof": "Aadhaar Card",
            "passport_number": "K1234567",
            "has_guardian": "Yes"
        }))
        .unwrap();
        assert_eq!(update.cleared, vec!["passport_number"]);
        assert_eq!(record.get("passport_number"), None);
        assert_eq!(record.group(GroupKind::Guardians).len(), 1);
        assert!(update.active.is_required("aadhaar_number"));
    }

    #[test]
    fn malformed_record_is_an_error() {
        let ctx = ValidationContext::new(date!(2026 - 03 - 01));
        assert!(matches!(
            validate_json(&json!([1, 2]), &ctx),
            Err(RecordError::NotAnObject)
        ));
        assert!(matches!(
            payload_json(&json!({ "nickname": "A" }), &ctx),
            Err(BuildError::Record(RecordError::UnknownField(_)))
        ));
    }
}
