//! Top header with fleet size, refresh status and key help.

use fleettop::fleet::FleetView;
use fleettop::metrics::format_time_ago;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, view: &FleetView, source: &str) {
    let status = match (view.last_refresh(), view.last_error()) {
        (None, None) => Span::raw("connecting..."),
        (None, Some(e)) => Span::styled(format!("error: {e}"), Style::default().fg(Color::Red)),
        (Some(t), None) => Span::raw(format!("updated {}", format_time_ago(view.now(), t))),
        // stale-but-available: keep showing data, flag the failure
        (Some(t), Some(e)) => Span::styled(
            format!("stale ({}): {e}", format_time_ago(view.now(), t)),
            Style::default().fg(Color::Yellow),
        ),
    };
    let line = Line::from(vec![
        Span::raw(format!(
            "fleettop - {source} | {} servers | ",
            view.servers().len()
        )),
        status,
        Span::raw("  (arrows: select, Enter: details, Esc: back, q: quit)"),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}
