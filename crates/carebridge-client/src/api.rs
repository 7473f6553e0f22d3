//! Session backend REST client.
//!
//! Every request carries the bearer token of the injected [`AuthSession`].
//! A `401` from any endpoint invalidates that session before the error is
//! returned, so the next screen sees a logged-out state. Responses are
//! accepted bare or wrapped in `{"data": ...}`.

use carebridge_proto::{
    RoomName,
    api::{
        ApiEnvelope, AuthResponse, DemoMinutes, LoginRequest, SessionRecord, SessionStatus,
        SignupRequest, SignupRole, StatusUpdate, User, VideoTokenRequest, VideoTokenResponse,
    },
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::{
    auth::{AuthSession, AuthState},
    config::ClientConfig,
    error::ClientError,
};

/// HTTP client for the session backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: AuthSession,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the TLS backend cannot be initialized.
    pub fn new(config: &ClientConfig, auth: AuthSession) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client, base_url: config.api_base_url.clone(), auth })
    }

    /// Auth session shared with this client.
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Log in and persist the resulting token.
    #[instrument(skip(self, pin))]
    pub async fn login(&self, alias: &str, pin: &str) -> Result<User, ClientError> {
        let body = LoginRequest { alias: alias.to_string(), pin: pin.to_string() };
        let request = self.client.post(self.url("/auth/login")).json(&body);
        let response: AuthResponse = self.json(request).await?;

        let user = response.user.clone();
        let state = AuthState { access_token: response.access_token, user: response.user };
        self.auth.establish(state).await?;
        Ok(user)
    }

    /// Create a patient or psychologist account, then log in with it.
    #[instrument(skip(self, pin))]
    pub async fn register(
        &self,
        alias: &str,
        pin: &str,
        role: SignupRole,
    ) -> Result<User, ClientError> {
        let body = SignupRequest { alias: alias.to_string(), pin: pin.to_string(), role };
        self.send(self.client.post(self.url("/auth/signup")).json(&body)).await?;
        self.login(alias, pin).await
    }

    /// Forget the current login. Local only; the backend keeps no session.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.auth.invalidate().await
    }

    /// Request a media credential for `room`.
    #[instrument(skip(self), fields(room = %room))]
    pub async fn fetch_video_token(
        &self,
        room: &RoomName,
    ) -> Result<VideoTokenResponse, ClientError> {
        let body = VideoTokenRequest { room_name: room.clone() };
        self.json(self.client.post(self.url("/video/token")).json(&body)).await
    }

    /// Look up a booked session.
    #[instrument(skip(self))]
    pub async fn get_session(&self, session_id: &str) -> Result<SessionRecord, ClientError> {
        self.json(self.client.get(self.url(&format!("/sessions/{session_id}")))).await
    }

    /// Move a session to `status`.
    #[instrument(skip(self))]
    pub async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<(), ClientError> {
        let url = self.url(&format!("/sessions/{session_id}/status"));
        self.send(self.client.patch(url).json(&StatusUpdate { status })).await?;
        Ok(())
    }

    /// Free minutes left between a psychologist and a patient.
    #[instrument(skip(self))]
    pub async fn get_demo_minutes(
        &self,
        psychologist_id: &str,
        patient_id: &str,
    ) -> Result<DemoMinutes, ClientError> {
        let url = self.url(&format!("/demo-minutes/psychologist/{psychologist_id}"));
        self.json(self.client.get(url).query(&[("patientId", patient_id)])).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        Ok(envelope.into_inner())
    }

    /// Attach the bearer token, send, and map non-success statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = match self.auth.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, "backend request failed");
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("backend rejected credentials, clearing login");
            if let Err(e) = self.auth.invalidate().await {
                warn!(error = %e, "failed to clear persisted login");
            }
            return Err(ClientError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "backend returned error status");
        Err(ClientError::Status { status: status.as_u16(), body })
    }
}
