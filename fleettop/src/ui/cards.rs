//! Fleet grid: one card per server with two headline gauges.

use fleettop::fleet::FleetView;
use fleettop::metrics::{format_time_ago, is_recent_update, CardMetrics, Gauge as CardGauge};
use fleettop::types::ServerSnapshot;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::ui::theme::{freshness_color, usage_color, MUTED, SELECTED_BORDER};
use crate::ui::util::truncate_middle;

pub const CARD_WIDTH: u16 = 38;
pub const CARD_HEIGHT: u16 = 7;

/// How many cards fit side by side in `area`.
pub fn grid_columns(area: Rect) -> usize {
    (area.width / CARD_WIDTH).max(1) as usize
}

/// Draw the grid and return the column count used, so arrow keys can move
/// by rows. Scrolls so the selected card stays visible.
pub fn draw_cards(f: &mut ratatui::Frame<'_>, area: Rect, view: &FleetView) -> usize {
    let cols = grid_columns(area);
    let servers = view.servers();
    if servers.is_empty() {
        let msg = if view.last_refresh().is_some() {
            "No servers reported"
        } else {
            "Waiting for the first summary..."
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(MUTED)),
            area,
        );
        return cols;
    }

    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let sel_row = view.selected_index() / cols;
    let first_row = sel_row.saturating_sub(visible_rows - 1);
    let now = view.now();
    let metrics = view.card_metrics();

    for (i, (s, m)) in servers.iter().zip(&metrics).enumerate().skip(first_row * cols) {
        let row = i / cols - first_row;
        if row >= visible_rows {
            break;
        }
        let col = i % cols;
        let rect = Rect {
            x: area.x + col as u16 * CARD_WIDTH,
            y: area.y + row as u16 * CARD_HEIGHT,
            width: CARD_WIDTH.min(area.width),
            height: CARD_HEIGHT.min(area.height.saturating_sub(row as u16 * CARD_HEIGHT)),
        };
        draw_card(f, rect, s, m, now, i == view.selected_index());
    }
    cols
}

fn draw_card(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    s: &ServerSnapshot,
    m: &CardMetrics,
    now: i64,
    selected: bool,
) {
    let border = if selected {
        Style::default().fg(SELECTED_BORDER).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(truncate_middle(&s.machine_name, CARD_WIDTH as usize - 4));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 5 || inner.width < 10 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 5])
        .split(inner);

    let ago = format_time_ago(now, s.timestamp);
    let alias_w = (inner.width as usize).saturating_sub(ago.chars().count() + 1);
    let top = Line::from(vec![
        Span::styled(
            format!("{:<alias_w$}", truncate_middle(&s.machine_alias, alias_w)),
            Style::default().fg(MUTED),
        ),
        Span::raw(" "),
        Span::styled(
            ago,
            Style::default().fg(freshness_color(is_recent_update(now, s.timestamp))),
        ),
    ]);
    f.render_widget(Paragraph::new(top), rows[0]);

    draw_gauge(f, rows[1], rows[2], &m.primary);
    draw_gauge(f, rows[3], rows[4], &m.secondary);
}

fn draw_gauge(f: &mut ratatui::Frame<'_>, title_row: Rect, bar_row: Rect, g: &CardGauge) {
    f.render_widget(
        Paragraph::new(g.title).style(Style::default().fg(MUTED)),
        title_row,
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(usage_color(g.level())))
        .ratio((g.percent / 100.0).clamp(0.0, 1.0))
        .label(g.label.clone());
    f.render_widget(gauge, bar_row);
}
