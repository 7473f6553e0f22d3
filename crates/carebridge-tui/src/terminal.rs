//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Media and backend traffic never
//! pass through here.

use std::{
    io::{self, Stdout, stdout},
    time::Duration,
};

use carebridge_app::{App, AppEvent, Driver, KeyInput};
use carebridge_core::env::Environment;
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::ui;

/// Redraw interval while no input arrives, so the call timer advances.
const TICK: Duration = Duration::from_millis(250);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The terminal's input stream ended.
    #[error("terminal input closed")]
    InputClosed,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Raw mode and the alternate screen are entered on creation and restored on
/// drop. Alerts are kept and shown as a banner until the screen exits.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    alert: Option<String>,
    exited: bool,
}

impl TerminalDriver {
    /// Take over the terminal.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal, event_stream: EventStream::new(), alert: None, exited: false })
    }

    /// Most recent alert, if any.
    pub fn last_alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Whether the app asked to leave the screen.
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::select! {
            biased;

            maybe_event = self.event_stream.next() => match maybe_event {
                Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                    Ok(Self::convert_key(key_event.code).map(AppEvent::Key))
                },
                Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                Some(Ok(_)) => Ok(None),
                Some(Err(e)) => Err(TerminalError::Io(e)),
                None => Err(TerminalError::InputClosed),
            },

            () = tokio::time::sleep(TICK) => Ok(Some(AppEvent::Tick)),
        }
    }

    fn render<E: Environment>(&mut self, app: &App<E>) -> Result<(), Self::Error> {
        let alert = self.alert.as_deref();
        self.terminal.draw(|frame| ui::render(frame, app, alert))?;
        Ok(())
    }

    fn alert(&mut self, message: &str) -> Result<(), Self::Error> {
        tracing::warn!(message, "session alert");
        self.alert = Some(message.to_string());
        Ok(())
    }

    fn exit(&mut self) {
        self.exited = true;
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_editing_and_control_keys() {
        assert_eq!(TerminalDriver::convert_key(KeyCode::Char('é')), Some(KeyInput::Char('é')));
        assert_eq!(TerminalDriver::convert_key(KeyCode::Esc), Some(KeyInput::Esc));
        assert_eq!(TerminalDriver::convert_key(KeyCode::Up), None);
        assert_eq!(TerminalDriver::convert_key(KeyCode::F(1)), None);
    }
}
