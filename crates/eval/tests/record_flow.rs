//! End-to-end record behaviour through the public session API.
//!
//! Each test drives a [`Session`] the way an editing front end would and
//! checks the rule, group, validation and payload outcomes together.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use time::macros::date;

use admit_core::{default_element, Attachment, GroupKind, Record, Value};
use admit_eval::{
    payload_json, validate::is_valid, Issue, IssueKind, ReconcileOutcome, Session,
    ValidationContext,
};

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn ctx() -> ValidationContext {
    ValidationContext::new(date!(2026 - 03 - 01))
}

fn complete_json() -> serde_json::Value {
    serde_json::from_str(include_str!("fixtures/complete_record.json")).unwrap()
}

fn complete_session() -> Session {
    Session::from_record(Record::from_json(&complete_json()).unwrap())
}

fn at<'a>(issues: &'a [Issue], path: &str) -> Vec<&'a Issue> {
    issues.iter().filter(|i| i.path == path).collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn complete_record_is_valid() {
    let session = complete_session();
    let issues = session.validate(&ctx());
    assert!(is_valid(&issues), "unexpected issues: {issues:#?}");
}

#[test]
fn aadhaar_requires_number_not_passport() {
    let mut session = complete_session();
    session.clear_value("aadhaar_number").unwrap();
    let issues = session.validate(&ctx());
    assert_eq!(at(&issues, "aadhaar_number").len(), 1);
    for field in [
        "passport_number",
        "passport_place_of_issue",
        "passport_issue_date",
        "passport_expiry_date",
    ] {
        assert!(at(&issues, field).is_empty(), "{field} should not be required");
    }
}

#[test]
fn switching_to_passport_clears_aadhaar() {
    let mut session = complete_session();
    let update = session.set_value("id_proof", "Passport").unwrap();
    assert_eq!(update.cleared, vec!["aadhaar_number"]);
    let issues = session.validate(&ctx());
    let required: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::Required && i.path.starts_with("passport_"))
        .collect();
    assert_eq!(required.len(), 4);
}

#[test]
fn two_fathers_raise_one_consistency_issue() {
    let mut session = complete_session();
    session.add_element(GroupKind::Parents).unwrap();
    for (field, value) in [
        ("relation", "Father"),
        ("first_name", "Vikram"),
        ("last_name", "Rao"),
        ("email", "vikram@example.com"),
        ("phone", "+91 90000 12345"),
    ] {
        session
            .set_element_value(GroupKind::Parents, 1, field, value)
            .unwrap();
    }
    session
        .set_element_value(GroupKind::Parents, 1, "address_same_as_applicant", true)
        .unwrap();

    let issues = session.validate(&ctx());
    let consistency: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::Consistency)
        .collect();
    assert_eq!(consistency.len(), 1, "{issues:#?}");
    assert_eq!(consistency[0].path, "parents[1].relation");

    session
        .set_element_value(GroupKind::Parents, 1, "relation", "Mother")
        .unwrap();
    assert!(is_valid(&session.validate(&ctx())));
}

#[test]
fn parents_stay_within_one_and_two() {
    let mut session = complete_session();
    session.add_element(GroupKind::Parents).unwrap();
    assert!(session.add_element(GroupKind::Parents).is_err());
    session.remove_element(GroupKind::Parents, 1).unwrap();
    assert!(session.remove_element(GroupKind::Parents, 0).is_err());
    assert_eq!(session.record().group(GroupKind::Parents).len(), 1);
}

#[test]
fn sibling_list_follows_its_trigger() {
    let mut session = complete_session();
    assert!(session.record().group(GroupKind::Siblings).is_empty());

    let update = session.set_value("has_sibling_in_ihs", "Yes").unwrap();
    assert_eq!(update.outcomes, vec![(GroupKind::Siblings, ReconcileOutcome::Appended)]);
    assert_eq!(session.record().group(GroupKind::Siblings).len(), 1);
    let issues = session.validate(&ctx());
    assert_eq!(at(&issues, "siblings[0].name").len(), 1);

    session
        .set_element_value(GroupKind::Siblings, 0, "name", "Meera Rao")
        .unwrap();
    session.add_element(GroupKind::Siblings).unwrap();
    session.set_value("has_sibling_in_ihs", "No").unwrap();
    assert!(session.record().group(GroupKind::Siblings).is_empty());

    session.set_value("has_sibling_in_ihs", "Yes").unwrap();
    let siblings = session.record().group(GroupKind::Siblings);
    assert_eq!(siblings.len(), 1);
    assert_eq!(siblings[0], default_element(GroupKind::Siblings));
}

#[test]
fn other_gender_needs_a_description() {
    let mut session = complete_session();
    session.set_value("gender", "Other").unwrap();
    session.set_value("other_gender", "").unwrap();
    let issues = session.validate(&ctx());
    let other: Vec<_> = at(&issues, "other_gender");
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].kind, IssueKind::Required);

    session.set_value("other_gender", "Genderfluid").unwrap();
    assert!(is_valid(&session.validate(&ctx())));
}

#[test]
fn class_two_asks_about_bed_wetting() {
    let mut session = complete_session();
    let update = session.set_value("applied_for", "Class II").unwrap();
    assert!(update.active.is_required("wets_bed"));
    assert_eq!(at(&session.validate(&ctx()), "wets_bed").len(), 1);

    session.set_value("wets_bed", "Yes").unwrap();
    session.set_value("bed_wet_frequency", "").unwrap();
    let issues = session.validate(&ctx());
    let frequency = at(&issues, "bed_wet_frequency");
    assert_eq!(frequency.len(), 1);
    assert_eq!(frequency[0].kind, IssueKind::Required);

    session.set_value("bed_wet_frequency", "Rarely").unwrap();
    assert!(is_valid(&session.validate(&ctx())));
}

#[test]
fn class_eleven_requires_subjects_and_questions() {
    let mut session = complete_session();
    session.set_value("applied_for", "Class XI").unwrap();
    let issues = session.validate(&ctx());
    let required = issues
        .iter()
        .filter(|i| i.kind == IssueKind::Required)
        .count();
    assert_eq!(required, 17);
}

#[test]
fn divorced_parents_need_custody_details() {
    let mut session = complete_session();
    session.set_value("parent_marital_status", "Divorced").unwrap();
    let issues = session.validate(&ctx());
    for field in [
        "custody_holder",
        "custody_arrangement",
        "court_order_number",
        "divorce_date",
        "custody_order",
    ] {
        assert_eq!(at(&issues, field).len(), 1, "{field}");
    }
    assert!(at(&issues, "visitation_details").is_empty());
}

#[test]
fn photo_round_trips_through_payload() {
    let mut session = complete_session();
    let bytes: Vec<u8> = (0u8..=255).collect();
    session
        .set_value("recent_photograph", Attachment::new("photo.png", bytes.clone()))
        .unwrap();

    let payload = session.build_payload(&ctx()).unwrap();
    assert_eq!(payload["recent_photograph_filename"], "photo.png");
    let encoded = payload["recent_photograph"].as_str().unwrap();
    assert_eq!(BASE64.decode(encoded).unwrap(), bytes);
}

#[test]
fn payload_keeps_empty_strings_and_copies_parent_address() {
    let payload = payload_json(&complete_json(), &ctx()).unwrap();
    assert_eq!(payload["middle_name"], "");
    assert!(!payload.contains_key("other_gender"));
    assert_eq!(payload["billing_same_as_communication"], true);

    let parent = &payload["parents"][0];
    assert_eq!(parent["city"], "Bengaluru");
    assert_eq!(parent["postal_code"], "560001");
    assert_eq!(parent["annual_income"], 1800000);
    assert_eq!(payload["languages"].as_array().unwrap().len(), 2);
}

#[test]
fn hidden_values_never_reach_the_payload() {
    let mut json = complete_json();
    json["passport_number"] = "K1234567".into();
    json["billing_city"] = "Mysuru".into();
    let payload = payload_json(&json, &ctx()).unwrap();
    assert!(!payload.contains_key("passport_number"));
    assert!(!payload.contains_key("billing_city"));
}

#[test]
fn invalid_attachment_blocks_payload() {
    let mut session = complete_session();
    session
        .set_value("birth_certificate", Value::Attachment(Attachment::new("birth.docx", vec![1])))
        .unwrap();
    let err = session.build_payload(&ctx()).unwrap_err();
    let admit_eval::PayloadError::Invalid { issues } = err;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].path, "birth_certificate");
    assert_eq!(issues[0].kind, IssueKind::Format);
}
