//! Composer line
//!
//! Displays the chat draft with cursor.

use carebridge_app::App;
use carebridge_core::env::Environment;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const PROMPT: &str = "> ";
const PROMPT_WIDTH: u16 = 3; // border + "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the composer.
pub fn render<E: Environment>(frame: &mut Frame, app: &App<E>, area: Rect) {
    let title = if app.is_sending() { " Sending... " } else { "" };
    let block = Block::default().borders(Borders::ALL).title(title);

    let composer = app.composer();
    let line = if composer.is_empty() {
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled("Type a message...", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![Span::raw(PROMPT), Span::raw(composer.text())])
    };

    frame.render_widget(Paragraph::new(line).block(block), area);

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = u16::try_from(composer.cursor()).unwrap_or(u16::MAX).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
