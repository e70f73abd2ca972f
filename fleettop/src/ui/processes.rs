//! Processes grouped by user: a header row per user with summed memory,
//! followed by that user's commands, with a scrollbar.

use crossterm::event::{KeyCode, KeyEvent};
use fleettop::metrics::{format_gb, group_processes_by_user};
use fleettop::types::ProcessStat;
use ratatui::style::Modifier;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::ui::theme::{SB_ARROW, SB_THUMB, SB_TRACK};
use crate::ui::util::truncate_middle;

const COLS: [Constraint; 2] = [
    Constraint::Min(16),    // user / command
    Constraint::Length(10), // memory
];

/// Flattened row count (user headers + processes) for scroll clamping.
pub fn process_rows(procs: &[ProcessStat]) -> usize {
    let groups = group_processes_by_user(procs);
    groups.len() + groups.iter().map(|g| g.processes.len()).sum::<usize>()
}

pub fn draw_processes(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    procs: &[ProcessStat],
    scroll_offset: usize,
) {
    let groups = group_processes_by_user(procs);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Processes ({} users)", groups.len()));
    f.render_widget(block, area);

    // Inner area and content area (reserve 2 columns for scrollbar)
    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if inner.height < 1 || inner.width < 3 {
        return;
    }
    if groups.is_empty() {
        f.render_widget(
            Paragraph::new("No process info").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }
    let content = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: inner.height,
    };
    let cmd_width = content.width.saturating_sub(12) as usize;

    let mut rows: Vec<Row> = Vec::new();
    for g in &groups {
        let user = if g.user.is_empty() { "unknown" } else { g.user };
        rows.push(
            Row::new(vec![
                Cell::from(user.to_string()),
                Cell::from(format_gb(g.total_memory)),
            ])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        );
        for p in &g.processes {
            rows.push(Row::new(vec![
                Cell::from(format!(
                    "  {}",
                    truncate_middle(&p.full_cmd, cmd_width.saturating_sub(2))
                )),
                Cell::from(format!("{:.0} MB", p.used_memory))
                    .style(Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    // Scrolling
    let total_rows = rows.len();
    let header_rows = 1usize;
    let viewport_rows = content.height.saturating_sub(header_rows as u16) as usize;
    let max_off = total_rows.saturating_sub(viewport_rows);
    let offset = scroll_offset.min(max_off);
    let visible: Vec<Row> = rows.into_iter().skip(offset).take(viewport_rows).collect();

    let header = Row::new(vec!["User / Command", "Memory"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED),
    );
    let table = Table::new(visible, COLS.to_vec())
        .header(header)
        .column_spacing(1);
    f.render_widget(table, content);

    let scroll_area = Rect {
        x: inner.x + inner.width.saturating_sub(1),
        y: inner.y,
        width: 1,
        height: inner.height,
    };
    draw_scrollbar(f, scroll_area, total_rows, viewport_rows, offset);
}

fn draw_scrollbar(
    f: &mut ratatui::Frame<'_>,
    scroll_area: Rect,
    total_rows: usize,
    viewport_rows: usize,
    offset: usize,
) {
    if scroll_area.height < 3 {
        return;
    }
    let track = (scroll_area.height - 2) as usize;
    let total = total_rows.max(1);
    let view = viewport_rows.clamp(1, total);
    let max_off = total.saturating_sub(view);

    let thumb_len = (track * view).div_ceil(total).max(1).min(track);
    let thumb_top = if max_off == 0 {
        0
    } else {
        ((track - thumb_len) * offset + max_off / 2) / max_off
    };

    // Build lines: top arrow, track (with thumb), bottom arrow
    let mut lines: Vec<Line> = Vec::with_capacity(scroll_area.height as usize);
    lines.push(Line::from(Span::styled("▲", Style::default().fg(SB_ARROW))));
    for i in 0..track {
        if i >= thumb_top && i < thumb_top + thumb_len {
            lines.push(Line::from(Span::styled("█", Style::default().fg(SB_THUMB))));
        } else {
            lines.push(Line::from(Span::styled("│", Style::default().fg(SB_TRACK))));
        }
    }
    lines.push(Line::from(Span::styled("▼", Style::default().fg(SB_ARROW))));
    f.render_widget(Paragraph::new(lines), scroll_area);
}

/// Handle keyboard scrolling (Up/Down/PageUp/PageDown/Home/End)
pub fn processes_handle_key(scroll_offset: &mut usize, key: KeyEvent, page_size: usize) {
    let page = page_size.max(1);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => *scroll_offset = scroll_offset.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *scroll_offset = scroll_offset.saturating_add(1),
        KeyCode::PageUp => *scroll_offset = scroll_offset.saturating_sub(page),
        KeyCode::PageDown => *scroll_offset = scroll_offset.saturating_add(page),
        KeyCode::Home => *scroll_offset = 0,
        KeyCode::End => *scroll_offset = usize::MAX,
        _ => {}
    }
}

/// Clamp to the last full page.
pub fn processes_clamp(scroll_offset: &mut usize, total_rows: usize, viewport_rows: usize) {
    let max_off = total_rows.saturating_sub(viewport_rows);
    if *scroll_offset > max_off {
        *scroll_offset = max_off;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn scroll_keys_and_clamp() {
        let mut off = 0;
        processes_handle_key(&mut off, key(KeyCode::PageDown), 5);
        assert_eq!(off, 5);
        processes_handle_key(&mut off, key(KeyCode::Up), 5);
        assert_eq!(off, 4);
        processes_handle_key(&mut off, key(KeyCode::End), 5);
        processes_clamp(&mut off, 12, 5);
        assert_eq!(off, 7);
        processes_handle_key(&mut off, key(KeyCode::Home), 5);
        assert_eq!(off, 0);
    }

    #[test]
    fn row_count_includes_user_headers() {
        let p = |u: &str| ProcessStat {
            user: u.into(),
            full_cmd: "x".into(),
            used_memory: 1.0,
        };
        assert_eq!(process_rows(&[p("a"), p("b"), p("a")]), 5);
        assert_eq!(process_rows(&[]), 0);
    }
}
