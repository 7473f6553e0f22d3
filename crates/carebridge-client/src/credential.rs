//! Media credentials.
//!
//! A credential is fetched fresh for every join attempt and handed by value to
//! [`MediaRoom::connect`](crate::room::MediaRoom::connect), which consumes it.
//! It is never cached, persisted or refreshed.

use std::{fmt, future::Future};

use carebridge_proto::RoomName;

use crate::{api::ApiClient, config::ClientConfig, error::ClientError};

/// Single-use token plus the media server it is valid for.
#[derive(PartialEq, Eq)]
pub struct SessionCredential {
    token: String,
    server_url: String,
}

impl SessionCredential {
    /// Build a credential. Rejects an empty token or server URL.
    pub fn new(
        token: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let token = token.into();
        let server_url = server_url.into();

        if token.trim().is_empty() {
            return Err(ClientError::InvalidCredential("empty token".to_string()));
        }
        if server_url.trim().is_empty() {
            return Err(ClientError::MissingServerUrl);
        }
        Ok(Self { token, server_url })
    }

    /// Opaque access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Media server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Source of media credentials.
pub trait CredentialFetcher: Send + Sync {
    /// Fetch a fresh credential for the session's room. No retry.
    fn fetch(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionCredential, ClientError>> + Send;
}

/// Fetches credentials from the session backend.
#[derive(Debug, Clone)]
pub struct HttpCredentialFetcher {
    api: ApiClient,
    media_url_override: Option<String>,
}

impl HttpCredentialFetcher {
    /// Fetcher using `api`, honoring the configured media URL override.
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        Self { api, media_url_override: config.media_url_override.clone() }
    }
}

impl CredentialFetcher for HttpCredentialFetcher {
    async fn fetch(&self, session_id: &str) -> Result<SessionCredential, ClientError> {
        let room = RoomName::for_session(session_id);
        let response = self.api.fetch_video_token(&room).await?;

        // Configured URL wins over whatever the backend returns.
        let non_blank = |url: &String| !url.trim().is_empty();
        let server_url = self
            .media_url_override
            .clone()
            .filter(non_blank)
            .or_else(|| response.server_url.filter(non_blank))
            .ok_or(ClientError::MissingServerUrl)?;

        tracing::info!(room = %room, server_url = %server_url, "media credential issued");
        SessionCredential::new(response.token, server_url)
    }
}
