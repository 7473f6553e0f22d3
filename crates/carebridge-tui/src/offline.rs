//! Credential source for offline sessions.
//!
//! Offline mode joins the in-process loopback room instead of a media server,
//! so no backend is involved. The credential is still minted per join, the
//! same way the backend would.

use std::sync::atomic::{AtomicU64, Ordering};

use carebridge_client::{ClientError, CredentialFetcher, SessionCredential};

/// Server URL of the loopback room.
pub const LOOPBACK_SERVER_URL: &str = "ws://loopback.local";

/// Issues loopback credentials without contacting a backend.
#[derive(Debug, Default)]
pub struct OfflineFetcher {
    issued: AtomicU64,
}

impl OfflineFetcher {
    /// New fetcher.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialFetcher for OfflineFetcher {
    async fn fetch(&self, session_id: &str) -> Result<SessionCredential, ClientError> {
        let serial = self.issued.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session_id, serial, "issuing offline credential");
        SessionCredential::new(format!("offline-{session_id}-{serial}"), LOOPBACK_SERVER_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_credential_per_join() {
        let fetcher = OfflineFetcher::new();

        let first = fetcher.fetch("12").await.unwrap();
        let second = fetcher.fetch("12").await.unwrap();

        assert_eq!(first.server_url(), LOOPBACK_SERVER_URL);
        assert_ne!(first.token(), second.token());
    }
}
