//! Submission transport.
//!
//! A single POST of the payload, no retry. A 401 answer tells the
//! injected [`AuthSignals`] to log out before the error is returned.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::payload::Payload;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("submission rejected ({status}): {}", message.as_deref().unwrap_or("no details"))]
    Rejected { status: u16, message: Option<String> },
    #[error("malformed submission response: {0}")]
    Malformed(String),
    #[error("submission transport error: {0}")]
    Transport(String),
    #[error("submission timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

/// Server acknowledgement of an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Session authentication as seen by the transport.
pub trait AuthSignals: Send + Sync {
    fn is_logged_in(&self) -> bool;

    /// Drop the session after the server rejected its credentials.
    fn logout(&self);

    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Bearer-token authentication. Logging out forgets the token.
#[derive(Debug, Default)]
pub struct TokenAuth {
    token: Mutex<Option<String>>,
}

impl TokenAuth {
    pub fn new(token: Option<String>) -> Self {
        TokenAuth {
            token: Mutex::new(token),
        }
    }
}

impl AuthSignals for TokenAuth {
    fn is_logged_in(&self) -> bool {
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn logout(&self) {
        warn!("credentials rejected; logging out");
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn bearer_token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, payload: &Payload) -> Result<Receipt, TransportError>;
}

#[cfg(feature = "http")]
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// POSTs the payload as JSON to a fixed URL.
#[cfg(feature = "http")]
pub struct HttpSubmission {
    url: String,
    auth: Arc<dyn AuthSignals>,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl HttpSubmission {
    pub fn new(url: impl Into<String>, auth: Arc<dyn AuthSignals>) -> Self {
        HttpSubmission {
            url: url.into(),
            auth,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl SubmissionTransport for HttpSubmission {
    async fn submit(&self, payload: &Payload) -> Result<Receipt, TransportError> {
        if !self.auth.is_logged_in() {
            return Err(TransportError::NotLoggedIn);
        }

        let url = self.url.clone();
        let token = self.auth.bearer_token();
        let timeout = self.timeout;
        let body = serde_json::Value::Object(payload.clone());

        let result = tokio::task::spawn_blocking(move || -> Result<Receipt, TransportError> {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .into();
            let mut request = agent.post(&url);
            if let Some(ref token) = token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let mut response = request.send_json(&body).map_err(|e| match e {
                ureq::Error::Timeout(_) => TransportError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                },
                other => TransportError::Transport(other.to_string()),
            })?;

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let message = response
                    .body_mut()
                    .read_json::<ErrorBody>()
                    .ok()
                    .and_then(|b| b.message);
                return Err(TransportError::Rejected { status, message });
            }

            let body = response
                .body_mut()
                .read_json::<serde_json::Value>()
                .map_err(|e| TransportError::Malformed(e.to_string()))?;
            Ok(Receipt { status, body })
        })
        .await
        .map_err(|e| TransportError::Transport(format!("task join error: {}", e)))?;

        match &result {
            Ok(receipt) => info!(status = receipt.status, "submission accepted"),
            Err(TransportError::Rejected { status: 401, .. }) => self.auth.logout(),
            Err(e) => warn!(error = %e, "submission failed"),
        }
        result
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
