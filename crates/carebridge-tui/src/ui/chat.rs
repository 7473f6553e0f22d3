//! Chat panel
//!
//! The session transcript, newest at the bottom.

use carebridge_app::App;
use carebridge_core::env::Environment;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat panel.
pub fn render<E: Environment>(frame: &mut Frame, app: &App<E>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Session Chat ");

    let transcript = app.transcript();
    let items: Vec<ListItem> = if transcript.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        transcript
            .messages()
            .iter()
            .map(|msg| {
                let color = if msg.is_local() { Color::Cyan } else { Color::Green };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}:", msg.sender),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    Span::raw(msg.text.as_str()),
                ]))
            })
            .collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
