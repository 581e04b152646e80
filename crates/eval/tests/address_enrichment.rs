//! Address enrichment driven through a session and a debounced enricher.
//!
//! Time is paused, so the debounce interval and service delays advance
//! only as the runtime goes idle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use admit_core::GroupKind;
use admit_eval::{
    AddressEnricher, AddressGroup, EnricherSettings, LookupOutcome, PostalRecord, Session,
    StaticPostalLookup,
};

fn postal(state: &str, cities: &[&str], default: Option<&str>) -> PostalRecord {
    PostalRecord {
        state: state.to_string(),
        accepted_cities: cities.iter().map(|c| c.to_string()).collect(),
        defaultcity: default.map(str::to_string),
    }
}

fn enricher(lookup: &Arc<StaticPostalLookup>) -> (AddressEnricher, UnboundedReceiver<LookupOutcome>) {
    AddressEnricher::new(lookup.clone(), EnricherSettings::default())
}

#[tokio::test(start_paused = true)]
async fn rapid_postal_edits_issue_one_request() {
    let lookup = Arc::new(
        StaticPostalLookup::new()
            .with_record("IN", "400", postal("Wrong", &["Wrong"], None))
            .with_record("IN", "4000", postal("Wrong", &["Wrong"], None))
            .with_record("IN", "40001", postal("Maharashtra", &["Mumbai"], Some("Mumbai"))),
    );
    let (enricher, mut rx) = enricher(&lookup);
    let mut session = Session::new();

    session.set_value("comm_country", "India").unwrap().schedule(&enricher);
    for code in ["400", "4000", "40001"] {
        session
            .set_value("comm_postal_code", code)
            .unwrap()
            .schedule(&enricher);
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    let outcome = rx.recv().await.unwrap();
    assert!(session.apply_lookup(outcome));
    assert_eq!(session.record().text("comm_region"), Some("Maharashtra"));
    assert_eq!(session.record().text("comm_city"), Some("Mumbai"));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(lookup.calls(), vec![("IN".to_string(), "40001".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn india_110001_uses_default_city() {
    let lookup = Arc::new(StaticPostalLookup::new().with_record(
        "IN",
        "110001",
        postal("Delhi", &["Delhi", "New Delhi"], Some("New Delhi")),
    ));
    let (enricher, mut rx) = enricher(&lookup);
    let mut session = Session::new();

    session.set_value("comm_country", "India").unwrap();
    session
        .set_value("comm_postal_code", "110001")
        .unwrap()
        .schedule(&enricher);
    assert!(session.lookup_state(AddressGroup::Communication).loading);

    session.apply_lookup(rx.recv().await.unwrap());
    assert_eq!(session.record().text("comm_region"), Some("Delhi"));
    assert_eq!(session.record().text("comm_city"), Some("New Delhi"));
    assert!(!session.lookup_state(AddressGroup::Communication).loading);
}

#[tokio::test(start_paused = true)]
async fn unlisted_default_city_falls_back_to_first_accepted() {
    let lookup = Arc::new(StaticPostalLookup::new().with_record(
        "IN",
        "110001",
        postal("Delhi", &["Delhi", "New Delhi"], Some("Gurugram")),
    ));
    let (enricher, mut rx) = enricher(&lookup);
    let mut session = Session::new();

    session.set_value("billing_country", "India").unwrap();
    session
        .set_value("billing_postal_code", "110001")
        .unwrap()
        .schedule(&enricher);

    session.apply_lookup(rx.recv().await.unwrap());
    assert_eq!(session.record().text("billing_city"), Some("Delhi"));
}

#[tokio::test(start_paused = true)]
async fn answer_for_superseded_input_is_dropped() {
    let lookup = Arc::new(
        StaticPostalLookup::new()
            .with_record("IN", "110001", postal("Delhi", &["New Delhi"], None))
            .with_record("IN", "560001", postal("Karnataka", &["Bengaluru"], None))
            .with_delay(Duration::from_secs(2)),
    );
    let (enricher, mut rx) = enricher(&lookup);
    let mut session = Session::new();

    session.set_value("comm_country", "India").unwrap();
    session
        .set_value("comm_postal_code", "110001")
        .unwrap()
        .schedule(&enricher);
    // Past the debounce: the first request is in flight.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    session
        .set_value("comm_postal_code", "560001")
        .unwrap()
        .schedule(&enricher);

    let first = rx.recv().await.unwrap();
    assert_eq!(first.tag.postal_code, "110001");
    assert!(!session.apply_lookup(first));
    assert_eq!(session.record().get("comm_region"), None);

    let second = rx.recv().await.unwrap();
    assert!(session.apply_lookup(second));
    assert_eq!(session.record().text("comm_region"), Some("Karnataka"));
    assert_eq!(lookup.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn guardian_address_is_enriched_in_place() {
    let lookup = Arc::new(StaticPostalLookup::new().with_record(
        "GB",
        "SW1A 1AA",
        postal("England", &["London"], Some("London")),
    ));
    let (enricher, mut rx) = enricher(&lookup);
    let mut session = Session::new();

    session.set_value("has_guardian", "Yes").unwrap();
    session
        .set_element_value(GroupKind::Guardians, 0, "country", "United Kingdom")
        .unwrap();
    let update = session
        .set_element_value(GroupKind::Guardians, 0, "postal_code", "SW1A 1AA")
        .unwrap();
    assert_eq!(update.queries.len(), 1);
    assert_eq!(update.queries[0].0, AddressGroup::Guardian(0));
    update.schedule(&enricher);

    assert!(session.apply_lookup(rx.recv().await.unwrap()));
    let guardian = &session.record().group(GroupKind::Guardians)[0];
    assert_eq!(guardian.get("region").and_then(|v| v.as_str()), Some("England"));
    assert_eq!(guardian.get("city").and_then(|v| v.as_str()), Some("London"));
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_leaves_a_message() {
    let lookup = Arc::new(StaticPostalLookup::new());
    let (enricher, mut rx) = enricher(&lookup);
    let mut session = Session::new();

    session.set_value("comm_country", "India").unwrap();
    session
        .set_value("comm_postal_code", "999999")
        .unwrap()
        .schedule(&enricher);

    assert!(session.apply_lookup(rx.recv().await.unwrap()));
    let state = session.lookup_state(AddressGroup::Communication);
    assert!(!state.loading);
    assert!(state.error.is_some());
    assert_eq!(session.record().get("comm_city"), None);
}
