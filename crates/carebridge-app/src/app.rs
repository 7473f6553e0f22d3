//! Session screen state machine.
//!
//! [`App`] holds everything the session screen shows and decides every side
//! effect, but performs none: it consumes [`AppEvent`]s and API calls and
//! returns [`AppAction`]s for the [`Runtime`](crate::Runtime) to execute.
//!
//! # Lifecycle
//!
//! ```text
//! mount ──> FetchCredential ──CredentialFetched──> Connect ──Connected──> SetCamera(true)
//!                 │                                   │                   RegisterDataHandler
//!                 │ CredentialFailed                  │ ConnectFailed
//!                 ↓                                   ↓
//!     Alert("Failed to join session")      Alert("Failed to connect")
//!     Exit                                 Exit
//! ```
//!
//! `end_call` and `unmount` tear down from any point. After that the screen
//! is no longer mounted and late results of in-flight I/O are discarded, with
//! one exception: a connect that resolves after teardown still produces a
//! `Disconnect`, so the link is released rather than leaked.
//!
//! # Invariants
//!
//! - `Exit` is returned at most once.
//! - `UnregisterDataHandler` and `Disconnect` are each returned at most once,
//!   and exactly once for a link that came up.
//! - A chat message enters the transcript only from a decoded chat envelope
//!   or after its publish succeeded.

use carebridge_core::{
    ConnectionAction, ConnectionState, MediaAction, MediaPublisher, OutgoingChat, ParticipantView,
    ReceiveOutcome, SessionConnection, Transcript, env::Environment, participant,
};

use crate::{
    AppAction, AppEvent, Composer, KeyInput,
    state::{CONNECT_FAILED_ALERT, JOIN_FAILED_ALERT, Phase, SEND_FAILED_ALERT},
};

/// Session screen state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
pub struct App<E: Environment> {
    env: E,
    /// Session being joined.
    session_id: String,
    connection: SessionConnection<E::Instant>,
    media: MediaPublisher,
    transcript: Transcript,
    tiles: Vec<ParticipantView>,
    composer: Composer,
    /// Draft whose publish has not resolved yet.
    in_flight: Option<String>,
    /// Identity assigned by the media server. `None` before connect.
    local_identity: Option<String>,
    chat_visible: bool,
    /// Chat messages received while the chat panel was hidden.
    unread: usize,
    mounted: bool,
    exited: bool,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Last notice shown to the user. `None` if none.
    status_message: Option<String>,
}

impl<E: Environment> std::fmt::Debug for App<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("session_id", &self.session_id)
            .field("connection", &self.connection.state())
            .field("media", &self.media)
            .field("messages", &self.transcript.len())
            .field("tiles", &self.tiles)
            .field("mounted", &self.mounted)
            .field("exited", &self.exited)
            .finish_non_exhaustive()
    }
}

impl<E: Environment> App<E> {
    /// Create an unmounted screen for `session_id`.
    pub fn new(env: E, session_id: impl Into<String>) -> Self {
        Self {
            env,
            session_id: session_id.into(),
            connection: SessionConnection::new(),
            media: MediaPublisher::new(),
            transcript: Transcript::new(),
            tiles: Vec::new(),
            composer: Composer::new(),
            in_flight: None,
            local_identity: None,
            chat_visible: false,
            unread: 0,
            mounted: false,
            exited: false,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Screen appeared: start joining. Only the first call has an effect.
    pub fn mount(&mut self) -> Vec<AppAction> {
        if self.mounted || self.exited || self.connection.state() != ConnectionState::Idle {
            return vec![];
        }

        self.mounted = true;
        tracing::info!(session_id = %self.session_id, "joining session");
        vec![AppAction::FetchCredential { session_id: self.session_id.clone() }, AppAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            // Live calls redraw on tick so the call timer advances.
            AppEvent::Tick if self.connection.is_connected() => vec![AppAction::Render],
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            event if !self.mounted => self.handle_unmounted(event),
            AppEvent::CredentialFetched(credential) => {
                match self.connection.begin_connect(self.env.now()) {
                    Ok(_) => vec![AppAction::Connect { credential }, AppAction::Render],
                    Err(e) => {
                        tracing::warn!(error = %e, "discarding credential");
                        vec![]
                    },
                }
            },
            AppEvent::CredentialFailed { reason } => {
                tracing::warn!(%reason, "credential fetch failed");
                let released = self.connection.teardown(reason);
                let mut actions = self.apply(released, None);
                actions.extend(self.fail(JOIN_FAILED_ALERT));
                actions
            },
            AppEvent::Connected { identity } => {
                match self.connection.handle_connected(self.env.now()) {
                    Ok(connection_actions) => {
                        self.local_identity = identity;
                        self.status_message = None;
                        let mut actions = self.apply(connection_actions, None);
                        actions.push(AppAction::Render);
                        actions
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring connect result");
                        vec![]
                    },
                }
            },
            AppEvent::ConnectFailed { reason } => {
                match self.connection.handle_connect_failed(reason) {
                    Ok(connection_actions) => {
                        self.apply(connection_actions, Some(CONNECT_FAILED_ALERT))
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring connect failure");
                        vec![]
                    },
                }
            },
            AppEvent::DataReceived { payload, from } => {
                if !self.connection.is_connected() {
                    return vec![];
                }
                let received_at = self.env.wall_clock_millis();
                match self.transcript.receive(&payload, from.as_deref(), received_at) {
                    ReceiveOutcome::Appended => {
                        if !self.chat_visible {
                            self.unread += 1;
                        }
                        vec![AppAction::Render]
                    },
                    ReceiveOutcome::Ignored { .. } | ReceiveOutcome::Rejected(_) => vec![],
                }
            },
            AppEvent::ParticipantsChanged(participants) => {
                self.tiles = participant::project(&participants);
                vec![AppAction::Render]
            },
            AppEvent::LinkLost { reason } => {
                let connection_actions = self.connection.handle_link_lost(reason);
                if connection_actions.is_empty() {
                    return vec![];
                }
                self.mounted = false;
                self.apply(connection_actions, None)
            },
            AppEvent::MessageSent { text } => {
                self.in_flight = None;
                self.transcript.push_local(text, self.env.wall_clock_millis());
                vec![AppAction::Render]
            },
            AppEvent::MessageSendFailed { reason } => {
                tracing::warn!(%reason, "chat publish failed");
                if let Some(draft) = self.in_flight.take() {
                    self.composer.set(draft);
                }
                self.status_message = Some(SEND_FAILED_ALERT.to_string());
                vec![AppAction::Alert(SEND_FAILED_ALERT.to_string()), AppAction::Render]
            },
        }
    }

    /// Events arriving after teardown. Only a late connect needs handling.
    fn handle_unmounted(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Connected { .. } => match self.connection.handle_connected(self.env.now()) {
                Ok(connection_actions) => self.apply(connection_actions, None),
                Err(_) => vec![],
            },
            AppEvent::ConnectFailed { reason } => {
                let _ = self.connection.handle_connect_failed(reason);
                vec![]
            },
            other => {
                tracing::debug!(event = ?other, "discarding event after teardown");
                vec![]
            },
        }
    }

    /// Key routing: the chat panel captures typing while open.
    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if self.exited {
            return vec![];
        }

        if self.chat_visible {
            return match key {
                KeyInput::Enter => self.send_message(),
                KeyInput::Esc | KeyInput::Tab => self.hide_chat(),
                other if self.composer.edit(other) => vec![AppAction::Render],
                _ => vec![],
            };
        }

        match key {
            KeyInput::Char('m') => self.toggle_microphone(),
            KeyInput::Char('v') => self.toggle_camera(),
            KeyInput::Char('c') | KeyInput::Tab => self.show_chat(),
            KeyInput::Char('q') | KeyInput::Esc => self.end_call(),
            _ => vec![],
        }
    }

    /// Flip the microphone. Ignored unless the call is live.
    pub fn toggle_microphone(&mut self) -> Vec<AppAction> {
        if !self.connection.is_connected() {
            return vec![];
        }
        vec![Self::media_action(self.media.toggle_microphone()), AppAction::Render]
    }

    /// Flip the camera. Ignored unless the call is live.
    pub fn toggle_camera(&mut self) -> Vec<AppAction> {
        if !self.connection.is_connected() {
            return vec![];
        }
        vec![Self::media_action(self.media.toggle_camera()), AppAction::Render]
    }

    /// Replace the chat draft.
    pub fn set_composer(&mut self, text: impl Into<String>) -> Vec<AppAction> {
        self.composer.set(text);
        vec![AppAction::Render]
    }

    /// Publish the current draft.
    ///
    /// The draft is trimmed; a blank draft is not sent. The composer is
    /// cleared immediately and restored if the publish fails. Only one
    /// message is in flight at a time.
    pub fn send_message(&mut self) -> Vec<AppAction> {
        if !self.connection.is_connected() || self.in_flight.is_some() {
            return vec![];
        }

        match OutgoingChat::compose(self.local_identity.as_deref(), self.composer.text()) {
            Ok(Some(outgoing)) => {
                self.in_flight = Some(self.composer.take());
                vec![
                    AppAction::PublishChat { text: outgoing.text, payload: outgoing.payload },
                    AppAction::Render,
                ]
            },
            Ok(None) => vec![],
            Err(e) => {
                tracing::warn!(error = %e, "chat message could not be encoded");
                self.status_message = Some(SEND_FAILED_ALERT.to_string());
                vec![AppAction::Alert(SEND_FAILED_ALERT.to_string()), AppAction::Render]
            },
        }
    }

    /// Open the chat panel and mark everything read.
    pub fn show_chat(&mut self) -> Vec<AppAction> {
        self.chat_visible = true;
        self.unread = 0;
        vec![AppAction::Render]
    }

    /// Close the chat panel.
    pub fn hide_chat(&mut self) -> Vec<AppAction> {
        self.chat_visible = false;
        vec![AppAction::Render]
    }

    /// User hung up.
    pub fn end_call(&mut self) -> Vec<AppAction> {
        self.leave("call ended")
    }

    /// Screen is going away.
    pub fn unmount(&mut self) -> Vec<AppAction> {
        self.leave("screen unmounted")
    }

    fn leave(&mut self, reason: &str) -> Vec<AppAction> {
        if self.mounted {
            tracing::info!(session_id = %self.session_id, reason, "leaving session");
        }
        self.mounted = false;

        let released = self.connection.teardown(reason);
        let mut actions = self.apply(released, None);
        actions.extend(self.exit());
        actions
    }

    /// Translate connection actions. `ReportFailure` becomes the given alert
    /// (if any) followed by the screen exit.
    fn apply(
        &mut self,
        connection_actions: Vec<ConnectionAction>,
        failure_alert: Option<&str>,
    ) -> Vec<AppAction> {
        let mut actions = Vec::with_capacity(connection_actions.len());

        for action in connection_actions {
            match action {
                // Emitted with the credential when it arrives.
                ConnectionAction::Connect => {},
                ConnectionAction::EnableCamera => {
                    actions.push(AppAction::SetCamera(self.media.camera_enabled()));
                },
                ConnectionAction::RegisterDataHandler => {
                    actions.push(AppAction::RegisterDataHandler);
                },
                ConnectionAction::UnregisterDataHandler => {
                    actions.push(AppAction::UnregisterDataHandler);
                },
                ConnectionAction::Terminate => actions.push(AppAction::Disconnect),
                ConnectionAction::ReportFailure { reason } => {
                    tracing::info!(%reason, "session ended by failure");
                    match failure_alert {
                        Some(alert) => actions.extend(self.fail(alert)),
                        None => actions.extend(self.exit()),
                    }
                },
            }
        }

        actions
    }

    fn fail(&mut self, alert: &str) -> Vec<AppAction> {
        self.mounted = false;
        self.status_message = Some(alert.to_string());

        let mut actions = vec![AppAction::Alert(alert.to_string())];
        actions.extend(self.exit());
        actions
    }

    fn exit(&mut self) -> Option<AppAction> {
        if self.exited {
            return None;
        }
        self.exited = true;
        Some(AppAction::Exit)
    }

    fn media_action(action: MediaAction) -> AppAction {
        match action {
            MediaAction::SetMicrophone(enabled) => AppAction::SetMicrophone(enabled),
            MediaAction::SetCamera(enabled) => AppAction::SetCamera(enabled),
        }
    }

    /// Session being joined.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Coarse screen progress.
    pub fn phase(&self) -> Phase {
        Phase::derive(self.mounted, self.exited, self.connection.state())
    }

    /// Media connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// How long the call has been live. `None` if it never connected.
    pub fn call_duration(&self) -> Option<std::time::Duration> {
        self.connection.connected_for(self.env.now())
    }

    /// Whether the local microphone is on.
    pub fn microphone_enabled(&self) -> bool {
        self.media.microphone_enabled()
    }

    /// Whether the local camera is on.
    pub fn camera_enabled(&self) -> bool {
        self.media.camera_enabled()
    }

    /// Chat history.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Remote participant tiles in room order.
    pub fn tiles(&self) -> &[ParticipantView] {
        &self.tiles
    }

    /// Chat draft.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Whether a chat publish is in flight.
    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Identity assigned by the media server. `None` before connect.
    pub fn local_identity(&self) -> Option<&str> {
        self.local_identity.as_deref()
    }

    /// Whether the chat panel is open.
    pub fn chat_visible(&self) -> bool {
        self.chat_visible
    }

    /// Chat messages received while the panel was closed.
    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Whether the screen is mounted and not torn down.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether `Exit` has been returned.
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Last notice shown to the user. `None` if none.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use carebridge_client::SessionCredential;
    use carebridge_core::{Participant, TrackKind};
    use carebridge_proto::ChatPayload;

    use super::*;

    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn wall_clock_millis(&self) -> u64 {
            1_000
        }
    }

    fn credential() -> SessionCredential {
        SessionCredential::new("tok", "wss://media").unwrap()
    }

    fn live_app() -> App<TestEnv> {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        app.handle(AppEvent::CredentialFetched(credential()));
        app.handle(AppEvent::Connected { identity: Some("patient-7".into()) });
        app
    }

    #[test]
    fn mount_fetches_credential_once() {
        let mut app = App::new(TestEnv, "42");
        let actions = app.mount();

        assert!(matches!(actions.as_slice(), [
            AppAction::FetchCredential { session_id },
            AppAction::Render
        ] if session_id == "42"));
        assert!(app.mount().is_empty());
        assert_eq!(app.phase(), Phase::Joining);
    }

    #[test]
    fn credential_leads_to_connect() {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        let actions = app.handle(AppEvent::CredentialFetched(credential()));

        assert!(matches!(actions.as_slice(), [AppAction::Connect { .. }, AppAction::Render]));
        assert_eq!(app.phase(), Phase::Connecting);
    }

    #[test]
    fn connected_publishes_camera_and_registers_handler() {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        app.handle(AppEvent::CredentialFetched(credential()));
        let actions = app.handle(AppEvent::Connected { identity: Some("p".into()) });

        assert!(matches!(actions.as_slice(), [
            AppAction::SetCamera(true),
            AppAction::RegisterDataHandler,
            AppAction::Render
        ]));
        assert!(!app.microphone_enabled());
        assert_eq!(app.phase(), Phase::Live);
    }

    #[test]
    fn credential_failure_alerts_and_exits() {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        let actions = app.handle(AppEvent::CredentialFailed { reason: "500".into() });

        assert!(matches!(actions.as_slice(), [
            AppAction::Alert(msg),
            AppAction::Exit
        ] if msg == JOIN_FAILED_ALERT));
        assert!(app.handle(AppEvent::Connected { identity: None }).is_empty());
        assert_ne!(app.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn connect_failure_alerts_and_exits() {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        app.handle(AppEvent::CredentialFetched(credential()));
        let actions = app.handle(AppEvent::ConnectFailed { reason: "refused".into() });

        assert!(matches!(actions.as_slice(), [
            AppAction::Alert(msg),
            AppAction::Exit
        ] if msg == CONNECT_FAILED_ALERT));
        assert!(app.end_call().is_empty());
    }

    #[test]
    fn end_call_releases_once() {
        let mut app = live_app();
        let actions = app.end_call();

        assert!(matches!(actions.as_slice(), [
            AppAction::UnregisterDataHandler,
            AppAction::Disconnect,
            AppAction::Exit
        ]));
        assert!(app.unmount().is_empty());
    }

    #[test]
    fn late_connect_after_unmount_is_released() {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        app.handle(AppEvent::CredentialFetched(credential()));

        let actions = app.unmount();
        assert!(matches!(actions.as_slice(), [AppAction::Exit]));

        let actions = app.handle(AppEvent::Connected { identity: None });
        assert!(matches!(actions.as_slice(), [AppAction::Disconnect]));
        assert_eq!(app.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn late_credential_after_unmount_is_dropped() {
        let mut app = App::new(TestEnv, "42");
        app.mount();
        app.unmount();

        assert!(app.handle(AppEvent::CredentialFetched(credential())).is_empty());
        assert_eq!(app.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn send_uses_identity_and_echoes_on_success() {
        let mut app = live_app();
        app.set_composer("  hello  ");

        let actions = app.send_message();
        let [AppAction::PublishChat { text, payload }, AppAction::Render] = actions.as_slice() else {
            panic!("expected publish, got {actions:?}");
        };
        assert_eq!(text, "hello");
        assert_eq!(payload, &ChatPayload::new("patient-7", "hello").encode().unwrap());
        assert!(app.composer().is_empty());
        assert!(app.transcript().is_empty());

        app.handle(AppEvent::MessageSent { text: text.clone() });
        let last = app.transcript().last().unwrap();
        assert_eq!((last.sender.as_str(), last.text.as_str()), ("Me", "hello"));
    }

    #[test]
    fn send_failure_restores_composer() {
        let mut app = live_app();
        app.set_composer("are you there?");
        app.send_message();

        let actions = app.handle(AppEvent::MessageSendFailed { reason: "closed".into() });

        assert!(matches!(
            actions.as_slice(),
            [AppAction::Alert(msg), AppAction::Render] if msg == SEND_FAILED_ALERT
        ));
        assert_eq!(app.composer().text(), "are you there?");
        assert!(app.transcript().is_empty());
        assert!(!app.is_sending());
    }

    #[test]
    fn blank_draft_is_not_sent() {
        let mut app = live_app();
        app.set_composer("   ");
        assert!(app.send_message().is_empty());
    }

    #[test]
    fn toggles_require_live_call() {
        let mut app = App::new(TestEnv, "42");
        assert!(app.toggle_microphone().is_empty());

        let mut app = live_app();
        assert!(matches!(app.toggle_microphone().as_slice(), [
            AppAction::SetMicrophone(true),
            AppAction::Render
        ]));
        assert!(matches!(app.toggle_camera().as_slice(), [
            AppAction::SetCamera(false),
            AppAction::Render
        ]));
    }

    #[test]
    fn unread_counts_while_chat_hidden() {
        let mut app = live_app();
        let payload = ChatPayload::new("dr", "hi").encode().unwrap();

        app.handle(AppEvent::DataReceived { payload: payload.clone(), from: None });
        app.handle(AppEvent::DataReceived { payload: b"not json".to_vec(), from: None });
        assert_eq!(app.unread(), 1);

        app.show_chat();
        assert_eq!(app.unread(), 0);
        app.handle(AppEvent::DataReceived { payload, from: None });
        assert_eq!(app.unread(), 0);
        assert_eq!(app.transcript().len(), 2);
    }

    #[test]
    fn participants_become_tiles() {
        let mut app = live_app();
        app.handle(AppEvent::ParticipantsChanged(vec![
            Participant::new("dr").with_track("TR_v", TrackKind::Video, true),
            Participant::new(""),
        ]));

        assert!(matches!(app.tiles(), [
            ParticipantView::Video { .. },
            ParticipantView::Placeholder { initial: '?', .. }
        ]));
    }

    #[test]
    fn link_lost_releases_and_exits_without_alert() {
        let mut app = live_app();
        let actions = app.handle(AppEvent::LinkLost { reason: "server gone".into() });

        assert!(matches!(actions.as_slice(), [
            AppAction::UnregisterDataHandler,
            AppAction::Disconnect,
            AppAction::Exit
        ]));
        assert!(app.end_call().is_empty());
    }

    #[test]
    fn keys_route_by_panel() {
        let mut app = live_app();
        app.handle(AppEvent::Key(KeyInput::Char('m')));
        assert!(app.microphone_enabled());

        app.handle(AppEvent::Key(KeyInput::Tab));
        app.handle(AppEvent::Key(KeyInput::Char('m')));
        assert_eq!(app.composer().text(), "m");
        assert!(app.microphone_enabled());

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));
        assert!(matches!(actions.first(), Some(AppAction::PublishChat { .. })));

        app.handle(AppEvent::Key(KeyInput::Esc));
        assert!(!app.chat_visible());
        let actions = app.handle(AppEvent::Key(KeyInput::Char('q')));
        assert!(matches!(actions.last(), Some(AppAction::Exit)));
    }
}
