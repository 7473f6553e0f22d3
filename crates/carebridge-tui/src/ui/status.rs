//! Status bar
//!
//! Call phase, timer, local media state, unread count, and either the latest
//! notice or the key hints.

use std::time::Duration;

use carebridge_app::{App, Phase};
use carebridge_core::env::Environment;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const CALL_HINTS: &str = "m mic  v video  c chat  q end";
const CHAT_HINTS: &str = "Enter send  Esc close";

/// Format a call duration as `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Everything after the phase label, as plain text.
fn details<E: Environment>(app: &App<E>, alert: Option<&str>) -> String {
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };

    let mut text = String::new();
    if let Some(duration) = app.call_duration() {
        text.push(' ');
        text.push_str(&format_duration(duration));
    }
    text.push_str(&format!(
        " | mic {} | cam {}",
        on_off(app.microphone_enabled()),
        on_off(app.camera_enabled())
    ));
    if app.unread() > 0 {
        text.push_str(&format!(" | {} unread", app.unread()));
    }

    let notice = alert.or(app.status_message());
    let tail = match notice {
        Some(notice) => notice,
        None if app.chat_visible() => CHAT_HINTS,
        None => CALL_HINTS,
    };
    text.push_str(" | ");
    text.push_str(tail);
    text
}

/// The whole status line as plain text.
pub fn status_text<E: Environment>(app: &App<E>, alert: Option<&str>) -> String {
    format!("{}{}", app.phase().label(), details(app, alert))
}

/// Render the status bar.
pub fn render<E: Environment>(frame: &mut Frame, app: &App<E>, alert: Option<&str>, area: Rect) {
    let phase_color = match app.phase() {
        Phase::Live => Color::Green,
        Phase::Joining | Phase::Connecting => Color::Yellow,
        Phase::Idle | Phase::Ended => Color::Red,
    };

    let status_line = Line::from(vec![
        Span::styled(
            app.phase().label(),
            Style::default().fg(phase_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(details(app, alert)),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
