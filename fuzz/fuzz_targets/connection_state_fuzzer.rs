//! Fuzz target for the session connection state machine
//!
//! # Strategy
//!
//! Arbitrary sequences of connect, connect result, link loss and teardown
//! calls, in any order, including calls that are invalid for the current
//! state.
//!
//! # Invariants
//!
//! - `Connect` emitted at most once
//! - `RegisterDataHandler`, `UnregisterDataHandler` and `Terminate` each
//!   emitted at most once
//! - A handler is never unregistered before it was registered
//! - Once the link was reported up, a final teardown leaves nothing to
//!   release: every open link was terminated
//! - Terminal states never change

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use carebridge_core::{ConnectionAction, SessionConnection};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    BeginConnect,
    Connected,
    ConnectFailed,
    LinkLost,
    Teardown,
    Advance(u16),
}

#[derive(Debug, Default)]
struct Counts {
    connect: usize,
    register: usize,
    unregister: usize,
    terminate: usize,
    link_up: bool,
}

impl Counts {
    fn record(&mut self, actions: &[ConnectionAction]) {
        for action in actions {
            match action {
                ConnectionAction::Connect => self.connect += 1,
                ConnectionAction::RegisterDataHandler => self.register += 1,
                ConnectionAction::UnregisterDataHandler => self.unregister += 1,
                ConnectionAction::Terminate => self.terminate += 1,
                ConnectionAction::EnableCamera | ConnectionAction::ReportFailure { .. } => {}
            }
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut connection: SessionConnection<Duration> = SessionConnection::new();
    let mut now = Duration::ZERO;
    let mut counts = Counts::default();

    for op in ops {
        let before = connection.state();

        let actions = match op {
            Op::BeginConnect => connection.begin_connect(now).unwrap_or_default(),
            Op::Connected => match connection.handle_connected(now) {
                Ok(actions) => {
                    counts.link_up = true;
                    actions
                }
                Err(_) => vec![],
            },
            Op::ConnectFailed => connection.handle_connect_failed("refused").unwrap_or_default(),
            Op::LinkLost => connection.handle_link_lost("gone"),
            Op::Teardown => connection.teardown("leaving"),
            Op::Advance(ms) => {
                now += Duration::from_millis(u64::from(ms));
                vec![]
            }
        };
        counts.record(&actions);

        if before.is_terminal() {
            assert_eq!(connection.state(), before, "terminal state changed");
            assert!(actions.is_empty(), "terminal state emitted {actions:?}");
        }

        assert!(counts.connect <= 1);
        assert!(counts.register <= 1);
        assert!(counts.unregister <= counts.register);
        assert!(counts.terminate <= 1);
    }

    counts.record(&connection.teardown("final"));
    if counts.link_up {
        assert_eq!(counts.terminate, 1);
        assert_eq!(counts.unregister, counts.register);
    }
});
