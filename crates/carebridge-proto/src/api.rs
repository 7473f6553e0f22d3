//! REST payload types.
//!
//! Request and response bodies exchanged with the session backend. The
//! backend wraps most responses as `{"data": ...}` but some endpoints return
//! the bare object; [`ApiEnvelope`] accepts both.

use serde::{Deserialize, Serialize};

use crate::room::RoomName;

/// Response body that may or may not be wrapped in a `data` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    /// `{"data": T, ...}`
    Wrapped {
        /// Wrapped payload.
        data: T,
    },
    /// `T` at the top level.
    Bare(T),
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload regardless of framing.
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// `POST /video/token` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTokenRequest {
    /// Room to issue a credential for.
    pub room_name: RoomName,
}

/// `POST /video/token` response.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTokenResponse {
    /// Opaque media access token.
    pub token: String,
    /// Media server URL. `None` if the backend leaves it to the client.
    #[serde(default)]
    pub server_url: Option<String>,
}

impl std::fmt::Debug for VideoTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTokenResponse")
            .field("token", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Books and attends sessions.
    Patient,
    /// Offers and hosts sessions.
    Psychologist,
    /// Back-office account.
    Admin,
}

/// Role a new account may sign up with. Admin accounts are not
/// self-service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignupRole {
    /// Books and attends sessions.
    Patient,
    /// Offers and hosts sessions.
    Psychologist,
}

impl From<SignupRole> for Role {
    fn from(role: SignupRole) -> Self {
        match role {
            SignupRole::Patient => Self::Patient,
            SignupRole::Psychologist => Self::Psychologist,
        }
    }
}

/// Authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account ID.
    pub id: String,
    /// Public alias.
    pub alias: String,
    /// Account role.
    pub role: Role,
    /// Contact email, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `POST /auth/login` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account alias.
    pub alias: String,
    /// Numeric PIN.
    pub pin: String,
}

/// `POST /auth/signup` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    /// Desired alias.
    pub alias: String,
    /// Numeric PIN.
    pub pin: String,
    /// Role to register as.
    pub role: SignupRole,
}

/// `POST /auth/login` response payload.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// The logged-in account.
    pub user: User,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Lifecycle status of a booked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Requested, awaiting the psychologist.
    Pending,
    /// Accepted and on the calendar.
    Scheduled,
    /// In progress.
    Live,
    /// Finished.
    Completed,
    /// Cancelled by either side.
    Cancelled,
    /// Status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// `GET /sessions/{id}` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session ID.
    pub id: String,
    /// Patient account ID.
    pub patient_id: String,
    /// Psychologist account ID.
    pub psychologist_id: String,
    /// Booked service ID.
    pub service_id: String,
    /// Scheduled start (ISO-8601, as sent by the backend).
    pub scheduled_at: String,
    /// Duration in minutes.
    pub duration: u32,
    /// Current status.
    pub status: SessionStatus,
    /// Media room name, if the backend pre-assigned one.
    #[serde(default)]
    pub room_name: Option<String>,
    /// Media token stored with the session. Unused for joining; a fresh
    /// credential is always fetched.
    #[serde(default)]
    pub room_token: Option<String>,
}

/// `PATCH /sessions/{id}/status` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    /// Target status.
    pub status: SessionStatus,
}

/// `GET /demo-minutes/psychologist/{pid}?patientId=...` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoMinutes {
    /// Psychologist the allowance applies to.
    #[serde(default)]
    pub psychologist_id: Option<String>,
    /// Patient the allowance applies to.
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Free minutes left for this pair.
    #[serde(alias = "remainingMinutes")]
    pub minutes_remaining: u32,
}
