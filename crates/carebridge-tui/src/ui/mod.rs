//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! drawing into the frame.

mod chat;
mod input;
mod status;
mod tiles;

use carebridge_app::{App, Phase};
use carebridge_core::env::Environment;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

pub use status::{format_duration, status_text};

/// Render the entire UI. `alert` is the last alert the driver was given.
pub fn render<E: Environment>(frame: &mut Frame, app: &App<E>, alert: Option<&str>) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let input_height = if app.chat_visible() { INPUT_HEIGHT } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(input_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    match app.phase() {
        Phase::Idle | Phase::Joining | Phase::Connecting => render_connecting(frame, *main_area),
        Phase::Live | Phase::Ended => render_main_area(frame, app, *main_area),
    }
    if app.chat_visible() {
        input::render(frame, app, *input_area);
    }
    status::render(frame, app, alert, *status_area);
}

fn render_connecting(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("Connecting to session...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// Render the main area (participant tiles + chat panel).
fn render_main_area<E: Environment>(frame: &mut Frame, app: &App<E>, area: Rect) {
    const CHAT_PANEL_PERCENT: u16 = 40;

    if !app.chat_visible() {
        tiles::render(frame, app, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(100 - CHAT_PANEL_PERCENT),
            Constraint::Percentage(CHAT_PANEL_PERCENT),
        ])
        .split(area);

    let [tiles_area, chat_area] = chunks.as_ref() else {
        return;
    };

    tiles::render(frame, app, *tiles_area);
    chat::render(frame, app, *chat_area);
}
