//! Scripted credential source.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use carebridge_client::{ClientError, CredentialFetcher, SessionCredential};

/// Server URL handed out by [`SimFetcher::granting`].
pub const SIM_SERVER_URL: &str = "wss://media.sim";

/// Credential fetcher with a fixed outcome that counts its calls.
#[derive(Debug, Clone)]
pub struct SimFetcher {
    /// Backend status to fail with. `None` to grant a credential.
    failure: Option<u16>,
    calls: Arc<AtomicUsize>,
}

impl SimFetcher {
    /// Fetcher that always grants a credential.
    pub fn granting() -> Self {
        Self { failure: None, calls: Arc::default() }
    }

    /// Fetcher that always fails with the given backend status.
    pub fn failing(status: u16) -> Self {
        Self { failure: Some(status), calls: Arc::default() }
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialFetcher for SimFetcher {
    async fn fetch(&self, session_id: &str) -> Result<SessionCredential, ClientError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(status) => Err(ClientError::Status { status, body: "simulated".to_string() }),
            None => SessionCredential::new(format!("sim-{session_id}-{call}"), SIM_SERVER_URL),
        }
    }
}
