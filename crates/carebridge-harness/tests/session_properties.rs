//! Property-based tests for whole sessions.
//!
//! Random key scripts, room events and failure modes are run through the
//! runtime; the standard invariants must hold at the end of every run.

use carebridge_app::{AppEvent, KeyInput, Runtime};
use carebridge_client::RoomEvent;
use carebridge_core::{Participant, TrackKind};
use carebridge_harness::{
    InvariantRegistry, SessionSnapshot, SimDriver, SimEnv, SimFetcher, SimRoom, Step,
};
use carebridge_proto::ChatPayload;
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        4 => prop::sample::select(vec!['a', 'z', ' ', 'é', 'm', 'v', 'c']).prop_map(KeyInput::Char),
        1 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Tab),
        1 => Just(KeyInput::Left),
        1 => Just(KeyInput::Home),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        8 => key_strategy().prop_map(|key| Step::Event(AppEvent::Key(key))),
        1 => Just(()).prop_map(|()| Step::Event(AppEvent::Tick)),
        1 => (20u16..200, 5u16..80).prop_map(|(c, r)| Step::Event(AppEvent::Resize(c, r))),
        1 => Just(()).prop_map(|()| Step::Idle),
    ]
}

fn room_event_strategy() -> impl Strategy<Value = RoomEvent> {
    prop_oneof![
        3 => "[a-z ]{0,12}".prop_map(|text| RoomEvent::Data {
            payload: ChatPayload::new("peer", text).encode().unwrap_or_default(),
            from: Some("peer".to_string()),
        }),
        1 => prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|payload| RoomEvent::Data { payload, from: None }),
        1 => (0usize..3).prop_map(|n| RoomEvent::ParticipantsChanged(
            (0..n)
                .map(|i| Participant::new(format!("p{i}")).with_track("v", TrackKind::Video, true))
                .collect(),
        )),
    ]
}

#[derive(Debug, Clone)]
struct Failures {
    fetch: bool,
    connect: bool,
    publish: bool,
    toggles: bool,
    link_lost: bool,
}

fn failures_strategy() -> impl Strategy<Value = Failures> {
    (
        prop::bool::weighted(0.1),
        prop::bool::weighted(0.1),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(fetch, connect, publish, toggles, link_lost)| Failures {
            fetch,
            connect,
            publish,
            toggles,
            link_lost,
        })
}

fn run_session(steps: Vec<Step>, events: Vec<RoomEvent>, failures: &Failures) -> SessionSnapshot {
    let mut room = SimRoom::new();
    if failures.connect {
        room = room.failing_connect("refused");
    }
    if failures.publish {
        room = room.failing_publish("channel closed");
    }
    if failures.toggles {
        room = room.failing_toggles("no device");
    }
    for event in events {
        room.push_event(event);
    }
    if failures.link_lost {
        room.push_event(RoomEvent::Disconnected { reason: "gone".into() });
    }

    let fetcher = if failures.fetch { SimFetcher::failing(503) } else { SimFetcher::granting() };

    // Always leave: close the chat if open, then hang up.
    let mut driver = SimDriver::scripted(steps);
    driver.press(KeyInput::Esc);
    driver.press(KeyInput::Esc);
    driver.press(KeyInput::Char('q'));

    let mut runtime = Runtime::new(driver, fetcher, room, SimEnv::new(), "7");
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(runtime.run());
    assert!(result.is_ok(), "driver never fails in this script: {result:?}");

    SessionSnapshot::capture(runtime.room().log(), runtime.driver(), runtime.app())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_session_invariants_hold(
        steps in prop::collection::vec(step_strategy(), 0..40),
        events in prop::collection::vec(room_event_strategy(), 0..8),
        failures in failures_strategy(),
    ) {
        let snapshot = run_session(steps, events, &failures);

        if let Err(violations) = InvariantRegistry::standard().check_all(&snapshot) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            prop_assert!(false, "{failures:?}: {}", messages.join(", "));
        }
    }

    #[test]
    fn prop_nothing_published_without_a_link(
        steps in prop::collection::vec(step_strategy(), 0..40),
    ) {
        let failures = Failures {
            fetch: false,
            connect: true,
            publish: false,
            toggles: false,
            link_lost: false,
        };
        let snapshot = run_session(steps, vec![], &failures);

        prop_assert_eq!(snapshot.room.connects, 0);
        prop_assert!(snapshot.room.published.is_empty());
        prop_assert!(snapshot.room.camera_calls.is_empty());
        prop_assert_eq!(snapshot.room.registers, 0);
    }
}
