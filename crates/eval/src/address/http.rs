//! HTTP postal lookup.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` to avoid
//! blocking the async runtime. Requests go to
//! `{base_url}/countries/{ISO2}/pincodes/{postal}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{LookupError, PostalLookup, PostalRecord};

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpPostalLookup {
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl HttpPostalLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpPostalLookup {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self, iso2: &str, postal_code: &str) -> String {
        format!(
            "{}/countries/{}/pincodes/{}",
            self.base_url.trim_end_matches('/'),
            iso2,
            encode_segment(postal_code)
        )
    }
}

/// Percent-encode everything outside the unreserved set.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[async_trait]
impl PostalLookup for HttpPostalLookup {
    async fn lookup(&self, iso2: &str, postal_code: &str) -> Result<PostalRecord, LookupError> {
        let url = self.url(iso2, postal_code);
        let auth_token = self.auth_token.clone();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || -> Result<PostalRecord, LookupError> {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .into();
            let mut request = agent.get(&url);
            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let mut response = request.call().map_err(|e| match e {
                ureq::Error::Timeout(_) => LookupError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                },
                other => LookupError::Transport(other.to_string()),
            })?;

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let message = response
                    .body_mut()
                    .read_json::<ErrorBody>()
                    .ok()
                    .and_then(|b| b.message);
                return Err(LookupError::Rejected { status, message });
            }

            response
                .body_mut()
                .read_json::<PostalRecord>()
                .map_err(|e| LookupError::Malformed(e.to_string()))
        })
        .await
        .map_err(|e| LookupError::Transport(format!("task join error: {}", e)))?
    }

    fn lookup_id(&self) -> &str {
        "http"
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
