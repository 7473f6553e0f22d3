//! Property-based tests for the session screen state machine.
//!
//! Arbitrary interleavings of user calls, I/O results and room events are
//! fed to a mounted [`App`]. Whatever the order, the screen exits at most
//! once and the media link is released at most once.

use std::time::Duration;

use carebridge_app::{App, AppAction, AppEvent, KeyInput, Phase};
use carebridge_client::SessionCredential;
use carebridge_core::ConnectionState;
use carebridge_harness::SimEnv;
use carebridge_proto::ChatPayload;
use proptest::prelude::*;

/// Operation applied to the app. Cloneable stand-in for events that carry a
/// credential.
#[derive(Debug, Clone)]
enum Op {
    Credential,
    CredentialFailed,
    Connected,
    ConnectFailed,
    Chat(String),
    Garbage(Vec<u8>),
    LinkLost,
    Key(KeyInput),
    Sent,
    SendFailed,
    ToggleMicrophone,
    ToggleCamera,
    Send(String),
    EndCall,
    Unmount,
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Credential),
        1 => Just(Op::CredentialFailed),
        2 => Just(Op::Connected),
        1 => Just(Op::ConnectFailed),
        2 => "[a-z]{0,8}".prop_map(Op::Chat),
        1 => prop::collection::vec(any::<u8>(), 0..12).prop_map(Op::Garbage),
        1 => Just(Op::LinkLost),
        2 => prop::sample::select(vec![
            KeyInput::Char('x'),
            KeyInput::Tab,
            KeyInput::Enter,
            KeyInput::Backspace,
        ])
        .prop_map(Op::Key),
        1 => Just(Op::Sent),
        1 => Just(Op::SendFailed),
        2 => Just(Op::ToggleMicrophone),
        2 => Just(Op::ToggleCamera),
        2 => "[a-z ]{0,8}".prop_map(Op::Send),
        1 => Just(Op::EndCall),
        1 => Just(Op::Unmount),
        1 => (1u64..5_000).prop_map(Op::Advance),
    ]
}

fn apply(app: &mut App<SimEnv>, env: &SimEnv, op: Op) -> Vec<AppAction> {
    match op {
        Op::Credential => {
            let credential = SessionCredential::new("tok", "wss://media").unwrap();
            app.handle(AppEvent::CredentialFetched(credential))
        },
        Op::CredentialFailed => app.handle(AppEvent::CredentialFailed { reason: "503".into() }),
        Op::Connected => app.handle(AppEvent::Connected { identity: Some("me".into()) }),
        Op::ConnectFailed => app.handle(AppEvent::ConnectFailed { reason: "refused".into() }),
        Op::Chat(text) => app.handle(AppEvent::DataReceived {
            payload: ChatPayload::new("peer", text).encode().unwrap(),
            from: Some("peer".into()),
        }),
        Op::Garbage(payload) => app.handle(AppEvent::DataReceived { payload, from: None }),
        Op::LinkLost => app.handle(AppEvent::LinkLost { reason: "gone".into() }),
        Op::Key(key) => app.handle(AppEvent::Key(key)),
        Op::Sent => app.handle(AppEvent::MessageSent { text: "sent".into() }),
        Op::SendFailed => app.handle(AppEvent::MessageSendFailed { reason: "closed".into() }),
        Op::ToggleMicrophone => app.toggle_microphone(),
        Op::ToggleCamera => app.toggle_camera(),
        Op::Send(text) => {
            app.set_composer(text);
            app.send_message()
        },
        Op::EndCall => app.end_call(),
        Op::Unmount => app.unmount(),
        Op::Advance(ms) => {
            env.advance(Duration::from_millis(ms));
            app.handle(AppEvent::Tick)
        },
    }
}

#[derive(Debug, Default)]
struct Tally {
    exits: usize,
    disconnects: usize,
    registers: usize,
    unregisters: usize,
    connects: usize,
}

impl Tally {
    fn record(&mut self, actions: &[AppAction]) {
        for action in actions {
            match action {
                AppAction::Exit => self.exits += 1,
                AppAction::Disconnect => self.disconnects += 1,
                AppAction::RegisterDataHandler => self.registers += 1,
                AppAction::UnregisterDataHandler => self.unregisters += 1,
                AppAction::Connect { .. } => self.connects += 1,
                _ => {},
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_exit_and_release_at_most_once(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let env = SimEnv::new();
        let mut app = App::new(env.clone(), "9");
        let mut tally = Tally::default();

        tally.record(&app.mount());
        for op in ops {
            tally.record(&apply(&mut app, &env, op));

            prop_assert!(tally.exits <= 1);
            prop_assert!(tally.connects <= 1);
            prop_assert!(tally.disconnects <= 1);
            prop_assert!(tally.registers <= 1);
            prop_assert!(tally.unregisters <= tally.registers);
            prop_assert_eq!(app.has_exited(), tally.exits == 1);
        }

        // Leaving always completes the release.
        tally.record(&app.unmount());
        prop_assert_eq!(tally.exits, 1);
        prop_assert_eq!(tally.unregisters, tally.registers);
        prop_assert!(tally.disconnects <= 1);
        prop_assert_eq!(app.phase(), Phase::Ended);
        prop_assert_ne!(app.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn prop_double_toggle_restores_media(
        microphone_first in any::<bool>(),
        toggles in 0usize..6,
    ) {
        let env = SimEnv::new();
        let mut app = App::new(env.clone(), "9");
        app.mount();
        apply(&mut app, &env, Op::Credential);
        apply(&mut app, &env, Op::Connected);

        let before = (app.microphone_enabled(), app.camera_enabled());
        for _ in 0..toggles {
            if microphone_first {
                app.toggle_microphone();
                app.toggle_microphone();
            } else {
                app.toggle_camera();
                app.toggle_camera();
            }
        }
        prop_assert_eq!((app.microphone_enabled(), app.camera_enabled()), before);
    }

    #[test]
    fn prop_call_duration_tracks_clock(steps in prop::collection::vec(1u64..10_000, 1..10)) {
        let env = SimEnv::new();
        let mut app = App::new(env.clone(), "9");
        app.mount();
        apply(&mut app, &env, Op::Credential);
        prop_assert_eq!(app.call_duration(), None);
        apply(&mut app, &env, Op::Connected);

        let mut total = 0;
        for ms in steps {
            apply(&mut app, &env, Op::Advance(ms));
            total += ms;
            prop_assert_eq!(app.call_duration(), Some(Duration::from_millis(total)));
        }
    }
}
