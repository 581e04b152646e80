//! Table-backed postal lookup for tests and offline use.
//!
//! Entries are keyed by `(ISO code, postal code)`. Every call is logged
//! so tests can assert how many requests actually went out.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{LookupError, PostalLookup, PostalRecord};

#[derive(Debug, Default)]
pub struct StaticPostalLookup {
    entries: HashMap<(String, String), Result<PostalRecord, LookupError>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticPostalLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, iso2: &str, postal_code: &str, record: PostalRecord) -> Self {
        self.entries
            .insert((iso2.to_string(), postal_code.to_string()), Ok(record));
        self
    }

    pub fn with_error(mut self, iso2: &str, postal_code: &str, error: LookupError) -> Self {
        self.entries
            .insert((iso2.to_string(), postal_code.to_string()), Err(error));
        self
    }

    /// Sleep this long before answering, to simulate a slow service.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Load a table of the form `{ "IN": { "110001": { "state": .. } } }`.
    pub fn from_json(table: &serde_json::Value) -> Result<Self, LookupError> {
        let countries = table
            .as_object()
            .ok_or_else(|| LookupError::Malformed("lookup table must be an object".into()))?;
        let mut lookup = StaticPostalLookup::new();
        for (iso2, codes) in countries {
            let codes = codes.as_object().ok_or_else(|| {
                LookupError::Malformed(format!("entries for '{iso2}' must be an object"))
            })?;
            for (postal, raw) in codes {
                let record: PostalRecord = serde_json::from_value(raw.clone())
                    .map_err(|e| LookupError::Malformed(format!("{iso2}/{postal}: {e}")))?;
                lookup = lookup.with_record(&iso2.to_uppercase(), postal, record);
            }
        }
        Ok(lookup)
    }

    /// Every `(ISO code, postal code)` looked up so far, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PostalLookup for StaticPostalLookup {
    async fn lookup(&self, iso2: &str, postal_code: &str) -> Result<PostalRecord, LookupError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((iso2.to_string(), postal_code.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.entries.get(&(iso2.to_string(), postal_code.to_string())) {
            Some(entry) => entry.clone(),
            None => Err(LookupError::Rejected {
                status: 404,
                message: Some(format!("no postal record for {iso2}/{postal_code}")),
            }),
        }
    }

    fn lookup_id(&self) -> &str {
        "static"
    }
}
