//! Debounced lookup scheduling.
//!
//! Every [`AddressEnricher::schedule`] call bumps the group's generation
//! and spawns a task that sleeps for the debounce interval. A task that
//! wakes to find a newer generation exits without calling the service,
//! so a burst of edits produces a single request for the last input.
//! Results never touch the record: they are sent to the session owner
//! as [`LookupOutcome`]s.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{resolve, AddressGroup, AddressQuery, AddressResult, LookupError, PostalLookup, StalenessTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnricherSettings {
    pub debounce: Duration,
    pub timeout: Duration,
}

impl Default for EnricherSettings {
    fn default() -> Self {
        EnricherSettings {
            debounce: Duration::from_millis(800),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    pub group: AddressGroup,
    pub tag: StalenessTag,
    pub result: Result<AddressResult, LookupError>,
}

pub struct AddressEnricher {
    lookup: Arc<dyn PostalLookup>,
    settings: EnricherSettings,
    generations: Arc<Mutex<HashMap<AddressGroup, u64>>>,
    tx: mpsc::UnboundedSender<LookupOutcome>,
}

impl AddressEnricher {
    pub fn new(
        lookup: Arc<dyn PostalLookup>,
        settings: EnricherSettings,
    ) -> (Self, mpsc::UnboundedReceiver<LookupOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let enricher = AddressEnricher {
            lookup,
            settings,
            generations: Arc::new(Mutex::new(HashMap::new())),
            tx,
        };
        (enricher, rx)
    }

    /// Schedule a lookup for `group`, superseding any pending one.
    pub fn schedule(&self, group: AddressGroup, query: AddressQuery) -> JoinHandle<()> {
        let generation = {
            let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
            let entry = generations.entry(group).or_insert(0);
            *entry += 1;
            *entry
        };
        debug!(%group, country = %query.country, postal_code = %query.postal_code, generation, "lookup scheduled");

        let lookup = Arc::clone(&self.lookup);
        let generations = Arc::clone(&self.generations);
        let tx = self.tx.clone();
        let EnricherSettings { debounce, timeout } = self.settings;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let latest = generations
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(&group)
                .copied();
            if latest != Some(generation) {
                debug!(%group, generation, "lookup superseded during debounce");
                return;
            }

            let tag = query.tag();
            let result = match tokio::time::timeout(timeout, resolve(lookup.as_ref(), &query)).await {
                Ok(result) => result,
                Err(_) => Err(LookupError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }),
            };
            if let Err(ref e) = result {
                warn!(%group, lookup = lookup.lookup_id(), error = %e, "postal lookup failed");
            }

            if tx.send(LookupOutcome { group, tag, result }).is_err() {
                debug!(%group, "lookup outcome dropped: receiver closed");
            }
        })
    }
}
