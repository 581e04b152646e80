//! Postal-code enrichment for address groups.
//!
//! Each address group (communication, billing, current school, every
//! parent and guardian) owns a country and postal code pair. When the
//! pair changes, a [`PostalLookup`] resolves it to a region and a city.
//! Lookups run off the editing path through the [`AddressEnricher`];
//! results carry a [`StalenessTag`] so the session can drop any answer
//! that no longer matches its inputs.

pub mod country;
mod enricher;
#[cfg(feature = "http")]
pub mod http;
pub mod static_lookup;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use admit_core::{Fields, GroupKind, Record};

pub use enricher::{AddressEnricher, EnricherSettings, LookupOutcome};
#[cfg(feature = "http")]
pub use http::HttpPostalLookup;
pub use static_lookup::StaticPostalLookup;

/// Shortest postal code worth sending to the lookup service.
pub const MIN_POSTAL_LEN: usize = 3;

// ──────────────────────────────────────────────
// Address groups
// ──────────────────────────────────────────────

/// Field ids making up one address block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFields {
    pub line1: &'static str,
    pub line2: &'static str,
    pub country: &'static str,
    pub postal_code: &'static str,
    pub region: &'static str,
    pub city: &'static str,
}

impl AddressFields {
    /// All six ids, in copy order.
    pub fn all(&self) -> [&'static str; 6] {
        [
            self.line1,
            self.line2,
            self.country,
            self.postal_code,
            self.region,
            self.city,
        ]
    }
}

pub const COMMUNICATION: AddressFields = AddressFields {
    line1: "comm_address_line1",
    line2: "comm_address_line2",
    country: "comm_country",
    postal_code: "comm_postal_code",
    region: "comm_region",
    city: "comm_city",
};

pub const BILLING: AddressFields = AddressFields {
    line1: "billing_address_line1",
    line2: "billing_address_line2",
    country: "billing_country",
    postal_code: "billing_postal_code",
    region: "billing_region",
    city: "billing_city",
};

pub const CURRENT_SCHOOL: AddressFields = AddressFields {
    line1: "current_school_address_line1",
    line2: "current_school_address_line2",
    country: "current_school_country",
    postal_code: "current_school_postal_code",
    region: "current_school_region",
    city: "current_school_city",
};

/// Address fields inside parent and guardian elements.
pub const ELEMENT: AddressFields = AddressFields {
    line1: "address_line1",
    line2: "address_line2",
    country: "country",
    postal_code: "postal_code",
    region: "region",
    city: "city",
};

/// Element flag that copies the communication address.
pub const SAME_AS_APPLICANT: &str = "address_same_as_applicant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressGroup {
    Communication,
    Billing,
    CurrentSchool,
    Parent(usize),
    Guardian(usize),
}

impl AddressGroup {
    pub fn fields(self) -> &'static AddressFields {
        match self {
            AddressGroup::Communication => &COMMUNICATION,
            AddressGroup::Billing => &BILLING,
            AddressGroup::CurrentSchool => &CURRENT_SCHOOL,
            AddressGroup::Parent(_) | AddressGroup::Guardian(_) => &ELEMENT,
        }
    }

    /// The group element this address lives in, if any.
    pub fn element(self) -> Option<(GroupKind, usize)> {
        match self {
            AddressGroup::Parent(i) => Some((GroupKind::Parents, i)),
            AddressGroup::Guardian(i) => Some((GroupKind::Guardians, i)),
            _ => None,
        }
    }

    /// The address group of a group element, if that group carries one.
    pub fn for_element(kind: GroupKind, index: usize) -> Option<AddressGroup> {
        match kind {
            GroupKind::Parents => Some(AddressGroup::Parent(index)),
            GroupKind::Guardians => Some(AddressGroup::Guardian(index)),
            _ => None,
        }
    }

    /// Every address group present in the record, in a stable order.
    pub fn all(record: &Record) -> Vec<AddressGroup> {
        let mut groups = vec![
            AddressGroup::Communication,
            AddressGroup::Billing,
            AddressGroup::CurrentSchool,
        ];
        groups.extend((0..record.group(GroupKind::Parents).len()).map(AddressGroup::Parent));
        groups.extend((0..record.group(GroupKind::Guardians).len()).map(AddressGroup::Guardian));
        groups
    }

    pub fn slot(self, record: &Record) -> Option<&Fields> {
        match self.element() {
            Some((kind, index)) => record.element(kind, index),
            None => Some(&record.fields),
        }
    }

    pub fn slot_mut(self, record: &mut Record) -> Option<&mut Fields> {
        match self.element() {
            Some((kind, index)) => record.element_mut(kind, index),
            None => Some(&mut record.fields),
        }
    }

    /// Whether this element copies the communication address instead of
    /// owning one.
    pub fn copies_applicant(self, record: &Record) -> bool {
        self.element().is_some()
            && self
                .slot(record)
                .and_then(|f| f.get(SAME_AS_APPLICANT))
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
    }

    /// The group's current lookup inputs. `None` when the group does not
    /// exist or does not own its address.
    pub fn query(self, record: &Record) -> Option<AddressQuery> {
        if self.copies_applicant(record) {
            return None;
        }
        let slot = self.slot(record)?;
        let fields = self.fields();
        let text = |id: &str| {
            slot.get(id)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Some(AddressQuery {
            country: text(fields.country),
            postal_code: text(fields.postal_code),
        })
    }
}

impl fmt::Display for AddressGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressGroup::Communication => f.write_str("communication address"),
            AddressGroup::Billing => f.write_str("billing address"),
            AddressGroup::CurrentSchool => f.write_str("current school address"),
            AddressGroup::Parent(i) => write!(f, "parents[{i}] address"),
            AddressGroup::Guardian(i) => write!(f, "guardians[{i}] address"),
        }
    }
}

// ──────────────────────────────────────────────
// Queries, tags and results
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AddressQuery {
    pub country: String,
    pub postal_code: String,
}

impl AddressQuery {
    pub fn new(country: impl Into<String>, postal_code: impl Into<String>) -> Self {
        AddressQuery {
            country: country.into(),
            postal_code: postal_code.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.country.trim().is_empty() && self.postal_code.trim().is_empty()
    }

    /// Check the lookup preconditions. Returns the ISO code and the
    /// trimmed postal code.
    pub fn check(&self) -> Result<(&'static str, &str), LookupError> {
        let iso2 = country::iso2(&self.country).ok_or_else(|| LookupError::InvalidCountry {
            country: self.country.clone(),
        })?;
        let postal = self.postal_code.trim();
        if postal.chars().count() < MIN_POSTAL_LEN {
            return Err(LookupError::PostalCodeTooShort {
                postal_code: postal.to_string(),
            });
        }
        Ok((iso2, postal))
    }

    pub fn tag(&self) -> StalenessTag {
        StalenessTag {
            country: self.country.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

/// The exact inputs a lookup was issued for. A result is applied only
/// while the group's inputs still equal its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StalenessTag {
    pub country: String,
    pub postal_code: String,
}

impl StalenessTag {
    pub fn matches(&self, query: &AddressQuery) -> bool {
        self.country == query.country && self.postal_code == query.postal_code
    }
}

/// Wire shape of a successful postal lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostalRecord {
    pub state: String,
    #[serde(rename = "acceptedCities", default)]
    pub accepted_cities: Vec<String>,
    #[serde(default)]
    pub defaultcity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressResult {
    pub region_options: Vec<String>,
    pub city_options: Vec<String>,
    pub chosen_region: Option<String>,
    pub chosen_city: Option<String>,
}

impl AddressResult {
    /// Region is the single returned state. City is the default city when
    /// it is one of the accepted cities, else the first accepted city.
    pub fn from_record(record: PostalRecord) -> Self {
        let chosen_region = Some(record.state.clone()).filter(|s| !s.is_empty());
        let chosen_city = record
            .defaultcity
            .as_ref()
            .filter(|d| record.accepted_cities.contains(d))
            .or_else(|| record.accepted_cities.first())
            .cloned();
        AddressResult {
            region_options: chosen_region.iter().cloned().collect(),
            city_options: record.accepted_cities,
            chosen_region,
            chosen_city,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("invalid country '{country}'")]
    InvalidCountry { country: String },
    #[error("postal code '{postal_code}' is too short")]
    PostalCodeTooShort { postal_code: String },
    #[error("lookup rejected ({status}): {}", message.as_deref().unwrap_or("no details"))]
    Rejected { status: u16, message: Option<String> },
    #[error("malformed lookup response: {0}")]
    Malformed(String),
    #[error("lookup transport error: {0}")]
    Transport(String),
    #[error("lookup timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

/// Per-group enrichment status surfaced to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupState {
    pub loading: bool,
    pub error: Option<String>,
}

// ──────────────────────────────────────────────
// PostalLookup
// ──────────────────────────────────────────────

/// Resolves an ISO country code and postal code to a postal record.
#[async_trait]
pub trait PostalLookup: Send + Sync {
    async fn lookup(&self, iso2: &str, postal_code: &str) -> Result<PostalRecord, LookupError>;

    /// Short identifier used in logs.
    fn lookup_id(&self) -> &str;
}

/// Check preconditions, then look the query up. Never touches the
/// network when the preconditions fail.
pub async fn resolve(
    lookup: &dyn PostalLookup,
    query: &AddressQuery,
) -> Result<AddressResult, LookupError> {
    let (iso2, postal) = query.check()?;
    let record = lookup.lookup(iso2, postal).await?;
    Ok(AddressResult::from_record(record))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use admit_core::Value;

    fn record(state: &str, cities: &[&str], default: Option<&str>) -> PostalRecord {
        PostalRecord {
            state: state.to_string(),
            accepted_cities: cities.iter().map(|c| c.to_string()).collect(),
            defaultcity: default.map(str::to_string),
        }
    }

    #[test]
    fn default_city_wins_when_accepted() {
        let r = AddressResult::from_record(record("Delhi", &["Delhi", "New Delhi"], Some("New Delhi")));
        assert_eq!(r.chosen_region.as_deref(), Some("Delhi"));
        assert_eq!(r.chosen_city.as_deref(), Some("New Delhi"));
    }

    #[test]
    fn first_accepted_city_when_default_missing_or_unlisted() {
        let r = AddressResult::from_record(record("Delhi", &["Delhi", "New Delhi"], Some("Noida")));
        assert_eq!(r.chosen_city.as_deref(), Some("Delhi"));
        let r = AddressResult::from_record(record("Delhi", &["Delhi"], None));
        assert_eq!(r.chosen_city.as_deref(), Some("Delhi"));
        let r = AddressResult::from_record(record("Delhi", &[], Some("Delhi")));
        assert_eq!(r.chosen_city, None);
    }

    #[test]
    fn postal_record_reads_wire_names() {
        let r: PostalRecord = serde_json::from_str(
            r#"{"state":"Maharashtra","acceptedCities":["Mumbai"],"defaultcity":"Mumbai"}"#,
        )
        .unwrap();
        assert_eq!(r, record("Maharashtra", &["Mumbai"], Some("Mumbai")));
        let r: PostalRecord = serde_json::from_str(r#"{"state":"Goa"}"#).unwrap();
        assert!(r.accepted_cities.is_empty());
    }

    #[test]
    fn preconditions() {
        assert_eq!(AddressQuery::new("India", " 110001 ").check(), Ok(("IN", "110001")));
        assert!(matches!(
            AddressQuery::new("India", "40").check(),
            Err(LookupError::PostalCodeTooShort { .. })
        ));
        assert!(matches!(
            AddressQuery::new("Narnia", "110001").check(),
            Err(LookupError::InvalidCountry { .. })
        ));
    }

    #[test]
    fn tag_matches_exact_inputs_only() {
        let tag = AddressQuery::new("India", "40001").tag();
        assert!(tag.matches(&AddressQuery::new("India", "40001")));
        assert!(!tag.matches(&AddressQuery::new("India", "4000")));
        assert!(!tag.matches(&AddressQuery::new("india", "40001")));
    }

    #[test]
    fn copied_element_has_no_query() {
        let mut rec = Record::new();
        rec.group_mut(GroupKind::Parents)[0].insert(SAME_AS_APPLICANT.into(), Value::Bool(true));
        assert_eq!(AddressGroup::Parent(0).query(&rec), None);
        assert_eq!(AddressGroup::Parent(1).query(&rec), None);
        assert_eq!(
            AddressGroup::Communication.query(&rec),
            Some(AddressQuery::default())
        );
    }
}
