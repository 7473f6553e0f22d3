//! Scriptable media room.
//!
//! `SimRoom` records every call the runtime makes so tests can assert exact
//! counts (one disconnect, one unregister) and can be told to fail connects,
//! publishes or track toggles. Room events are queued up front and delivered
//! in order once the runtime starts listening.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use carebridge_client::{MediaRoom, RoomEvent, SessionCredential};
use carebridge_proto::DeliveryMode;

/// Identity the room assigns to the local participant.
pub const SIM_LOCAL_IDENTITY: &str = "local-sim";

/// Error returned by scripted failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRoomError(pub String);

impl std::fmt::Display for SimRoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimRoomError: {}", self.0)
    }
}

impl std::error::Error for SimRoomError {}

/// Calls observed by a [`SimRoom`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomLog {
    /// Connect attempts.
    pub connect_attempts: usize,
    /// Connects that succeeded.
    pub connects: usize,
    /// Tokens of the credentials consumed, in order.
    pub tokens: Vec<String>,
    /// Camera calls, in order.
    pub camera_calls: Vec<bool>,
    /// Microphone calls, in order.
    pub microphone_calls: Vec<bool>,
    /// Payloads published successfully.
    pub published: Vec<Vec<u8>>,
    /// Data handler registrations.
    pub registers: usize,
    /// Data handler unregistrations.
    pub unregisters: usize,
    /// Disconnect calls.
    pub disconnects: usize,
}

#[derive(Debug, Default)]
struct Script {
    connect_failure: Option<String>,
    publish_failure: Option<String>,
    toggle_failure: Option<String>,
    events: VecDeque<RoomEvent>,
}

#[derive(Debug, Default)]
struct Shared {
    script: Script,
    log: RoomLog,
    handler_registered: bool,
    connected: bool,
}

/// Media room double.
#[derive(Debug, Clone, Default)]
pub struct SimRoom {
    shared: Arc<Mutex<Shared>>,
}

impl SimRoom {
    /// Room that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every connect with `reason`.
    #[must_use]
    pub fn failing_connect(self, reason: &str) -> Self {
        self.lock().script.connect_failure = Some(reason.to_string());
        self
    }

    /// Fail every data publish with `reason`.
    #[must_use]
    pub fn failing_publish(self, reason: &str) -> Self {
        self.lock().script.publish_failure = Some(reason.to_string());
        self
    }

    /// Fail every camera and microphone toggle with `reason`.
    #[must_use]
    pub fn failing_toggles(self, reason: &str) -> Self {
        self.lock().script.toggle_failure = Some(reason.to_string());
        self
    }

    /// Queue an event for delivery after connect.
    pub fn push_event(&self, event: RoomEvent) {
        self.lock().script.events.push_back(event);
    }

    /// Snapshot of the calls observed so far.
    pub fn log(&self) -> RoomLog {
        self.lock().log.clone()
    }

    /// Whether a data handler is currently registered.
    pub fn has_data_handler(&self) -> bool {
        self.lock().handler_registered
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the next deliverable event, dropping data nobody listens for.
    fn pop_event(&self) -> Option<RoomEvent> {
        let mut shared = self.lock();
        while let Some(event) = shared.script.events.pop_front() {
            match event {
                RoomEvent::Data { .. } if !shared.handler_registered => {
                    tracing::debug!("sim room dropping data, no handler");
                },
                event => return Some(event),
            }
        }
        None
    }
}

impl MediaRoom for SimRoom {
    type Error = SimRoomError;

    async fn connect(&mut self, credential: SessionCredential) -> Result<(), SimRoomError> {
        let mut shared = self.lock();
        shared.log.connect_attempts += 1;
        shared.log.tokens.push(credential.token().to_string());

        if let Some(reason) = shared.script.connect_failure.clone() {
            return Err(SimRoomError(reason));
        }

        shared.connected = true;
        shared.log.connects += 1;
        Ok(())
    }

    fn local_identity(&self) -> Option<String> {
        self.lock().connected.then(|| SIM_LOCAL_IDENTITY.to_string())
    }

    async fn set_camera_enabled(&mut self, enabled: bool) -> Result<(), SimRoomError> {
        let mut shared = self.lock();
        shared.log.camera_calls.push(enabled);
        match shared.script.toggle_failure.clone() {
            Some(reason) => Err(SimRoomError(reason)),
            None => Ok(()),
        }
    }

    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<(), SimRoomError> {
        let mut shared = self.lock();
        shared.log.microphone_calls.push(enabled);
        match shared.script.toggle_failure.clone() {
            Some(reason) => Err(SimRoomError(reason)),
            None => Ok(()),
        }
    }

    async fn publish_data(
        &mut self,
        payload: Vec<u8>,
        _mode: DeliveryMode,
    ) -> Result<(), SimRoomError> {
        let mut shared = self.lock();
        if let Some(reason) = shared.script.publish_failure.clone() {
            return Err(SimRoomError(reason));
        }
        shared.log.published.push(payload);
        Ok(())
    }

    fn register_data_handler(&mut self) {
        let mut shared = self.lock();
        shared.handler_registered = true;
        shared.log.registers += 1;
    }

    fn unregister_data_handler(&mut self) {
        let mut shared = self.lock();
        shared.handler_registered = false;
        shared.log.unregisters += 1;
    }

    async fn next_event(&mut self) -> Option<RoomEvent> {
        match self.pop_event() {
            Some(event) => Some(event),
            // Nothing scripted: stay quiet and let input drive the loop.
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) {
        let mut shared = self.lock();
        shared.connected = false;
        shared.log.disconnects += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_scripted_failures() {
        let mut room = SimRoom::new().failing_publish("channel closed");
        let credential = SessionCredential::new("t", "wss://x").unwrap();

        room.connect(credential).await.unwrap();
        assert_eq!(room.local_identity().as_deref(), Some(SIM_LOCAL_IDENTITY));

        let err = room.publish_data(b"x".to_vec(), DeliveryMode::Reliable).await.unwrap_err();
        assert_eq!(err, SimRoomError("channel closed".into()));

        room.disconnect().await;
        let log = room.log();
        assert_eq!((log.connects, log.disconnects, log.published.len()), (1, 1, 0));
        assert_eq!(log.tokens, vec!["t".to_string()]);
    }

    #[tokio::test]
    async fn data_needs_a_handler() {
        let mut room = SimRoom::new();
        room.push_event(RoomEvent::Data { payload: b"early".to_vec(), from: None });
        room.push_event(RoomEvent::Disconnected { reason: "bye".into() });

        assert_eq!(room.next_event().await, Some(RoomEvent::Disconnected { reason: "bye".into() }));
    }
}
