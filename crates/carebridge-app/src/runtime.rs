//! Generic runtime for the session screen.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`App`]: session screen state machine
//! - [`Driver`]: platform-specific UI I/O
//! - [`CredentialFetcher`]: media credentials from the backend
//! - [`MediaRoom`]: the media session
//!
//! Actions are executed in the order the app returns them. I/O results are
//! fed back into the app as events, and the actions those produce run before
//! the rest of the current batch: a failing render queued earlier cannot cut
//! off the `RegisterDataHandler` that follows `Connected`.

use std::collections::VecDeque;

use carebridge_client::{CredentialFetcher, MediaRoom, RoomEvent};
use carebridge_core::{ConnectionState, env::Environment};
use carebridge_proto::DeliveryMode;

use crate::{App, AppAction, AppEvent, Driver};

/// Generic runtime that orchestrates App, Driver, fetcher and room.
///
/// # Type Parameters
///
/// - `D`: Platform-specific UI driver
/// - `F`: Credential source
/// - `R`: Media room
/// - `E`: Environment providing time
pub struct Runtime<D, F, R, E>
where
    D: Driver,
    F: CredentialFetcher,
    R: MediaRoom,
    E: Environment,
{
    driver: D,
    fetcher: F,
    room: R,
    app: App<E>,
}

impl<D, F, R, E> Runtime<D, F, R, E>
where
    D: Driver,
    F: CredentialFetcher,
    R: MediaRoom,
    E: Environment,
{
    /// Create a runtime for joining `session_id`.
    pub fn new(driver: D, fetcher: F, room: R, env: E, session_id: impl Into<String>) -> Self {
        Self { driver, fetcher, room, app: App::new(env, session_id) }
    }

    /// Run the session until the screen exits.
    ///
    /// Teardown runs on every exit path, including driver errors: the data
    /// handler is unregistered and the room disconnected if they were set up.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if input or rendering fails.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        let result = self.drive().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "driver failed, tearing session down");
        }

        let actions = self.app.unmount();
        self.execute_teardown(actions).await;
        result
    }

    /// Main loop. Returns once the app has exited.
    async fn drive(&mut self) -> Result<(), D::Error> {
        let actions = self.app.mount();
        self.execute(actions).await?;

        while !self.app.has_exited() {
            let event = if self.app.connection_state() == ConnectionState::Connected {
                tokio::select! {
                    // Drain room events before input.
                    biased;

                    room_event = self.room.next_event() => Some(Self::from_room(room_event)),
                    input = self.driver.poll_event() => input?,
                }
            } else {
                self.driver.poll_event().await?
            };

            if let Some(event) = event {
                let actions = self.app.handle(event);
                self.execute(actions).await?;
            }
        }

        Ok(())
    }

    fn from_room(event: Option<RoomEvent>) -> AppEvent {
        match event {
            Some(RoomEvent::Data { payload, from }) => AppEvent::DataReceived { payload, from },
            Some(RoomEvent::ParticipantsChanged(participants)) => {
                AppEvent::ParticipantsChanged(participants)
            },
            Some(RoomEvent::Disconnected { reason }) => AppEvent::LinkLost { reason },
            None => AppEvent::LinkLost { reason: "room closed".to_string() },
        }
    }

    /// Execute actions and everything they lead to.
    async fn execute(&mut self, actions: Vec<AppAction>) -> Result<(), D::Error> {
        let mut pending: VecDeque<AppAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            if let Some(event) = self.execute_one(action).await? {
                Self::run_next(&mut pending, self.app.handle(event));
            }
        }
        Ok(())
    }

    /// Execute teardown actions, continuing past driver errors so the room
    /// is always released.
    async fn execute_teardown(&mut self, actions: Vec<AppAction>) {
        let mut pending: VecDeque<AppAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            match self.execute_one(action).await {
                Ok(Some(event)) => Self::run_next(&mut pending, self.app.handle(event)),
                Ok(None) => {},
                Err(e) => tracing::warn!(error = %e, "driver error during teardown"),
            }
        }
    }

    /// Queue `follow_up` ahead of everything still pending, in order.
    fn run_next(pending: &mut VecDeque<AppAction>, follow_up: Vec<AppAction>) {
        for action in follow_up.into_iter().rev() {
            pending.push_front(action);
        }
    }

    /// Execute one action. Returns the event its result produces, if any.
    async fn execute_one(&mut self, action: AppAction) -> Result<Option<AppEvent>, D::Error> {
        let event = match action {
            AppAction::Render => {
                self.driver.render(&self.app)?;
                None
            },
            AppAction::FetchCredential { session_id } => {
                Some(match self.fetcher.fetch(&session_id).await {
                    Ok(credential) => AppEvent::CredentialFetched(credential),
                    Err(e) => AppEvent::CredentialFailed { reason: e.to_string() },
                })
            },
            AppAction::Connect { credential } => Some(match self.room.connect(credential).await {
                Ok(()) => AppEvent::Connected { identity: self.room.local_identity() },
                Err(e) => AppEvent::ConnectFailed { reason: e.to_string() },
            }),
            AppAction::SetCamera(enabled) => {
                // UI state is optimistic; a failed toggle is only logged.
                if let Err(e) = self.room.set_camera_enabled(enabled).await {
                    tracing::warn!(error = %e, enabled, "camera toggle failed");
                }
                None
            },
            AppAction::SetMicrophone(enabled) => {
                if let Err(e) = self.room.set_microphone_enabled(enabled).await {
                    tracing::warn!(error = %e, enabled, "microphone toggle failed");
                }
                None
            },
            AppAction::RegisterDataHandler => {
                self.room.register_data_handler();
                None
            },
            AppAction::UnregisterDataHandler => {
                self.room.unregister_data_handler();
                None
            },
            AppAction::PublishChat { text, payload } => {
                Some(match self.room.publish_data(payload, DeliveryMode::Reliable).await {
                    Ok(()) => AppEvent::MessageSent { text },
                    Err(e) => AppEvent::MessageSendFailed { reason: e.to_string() },
                })
            },
            AppAction::Disconnect => {
                self.room.disconnect().await;
                None
            },
            AppAction::Alert(message) => {
                self.driver.alert(&message)?;
                None
            },
            AppAction::Exit => {
                self.driver.exit();
                None
            },
        };
        Ok(event)
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App<E> {
        &self.app
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a reference to the media room
    pub fn room(&self) -> &R {
        &self.room
    }
}
