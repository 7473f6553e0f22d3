//! Participant tiles
//!
//! One tile for the local preview, then one per remote participant in room
//! order. Video tiles name the track being shown; the rest show the
//! participant's initial.

use carebridge_app::App;
use carebridge_core::{ParticipantView, env::Environment};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

struct Tile {
    title: String,
    body: String,
    style: Style,
}

impl Tile {
    fn local(camera_enabled: bool) -> Self {
        let (body, color) =
            if camera_enabled { ("camera on", Color::Green) } else { ("camera off", Color::Red) };
        Self { title: " You ".to_string(), body: body.to_string(), style: Style::default().fg(color) }
    }

    fn remote(view: &ParticipantView) -> Self {
        match view {
            ParticipantView::Video { identity, track_sid } => Self {
                title: format!(" {identity} "),
                body: format!("▶ {track_sid}"),
                style: Style::default().fg(Color::Cyan),
            },
            ParticipantView::Placeholder { identity, initial } => Self {
                title: format!(" {identity} "),
                body: initial.to_string(),
                style: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            },
        }
    }

    fn waiting() -> Self {
        Self {
            title: String::new(),
            body: "Waiting for others to join...".to_string(),
            style: Style::default().fg(Color::DarkGray),
        }
    }
}

/// Render the tile row.
pub fn render<E: Environment>(frame: &mut Frame, app: &App<E>, area: Rect) {
    let mut tiles = vec![Tile::local(app.camera_enabled())];
    if app.tiles().is_empty() {
        tiles.push(Tile::waiting());
    } else {
        tiles.extend(app.tiles().iter().map(Tile::remote));
    }

    let count = u32::try_from(tiles.len()).unwrap_or(u32::MAX);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(tiles.iter().map(|_| Constraint::Ratio(1, count)))
        .split(area);

    for (tile, tile_area) in tiles.into_iter().zip(chunks.iter()) {
        let paragraph = Paragraph::new(Line::from(tile.body))
            .style(tile.style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(tile.title));

        frame.render_widget(paragraph, *tile_area);
    }
}
