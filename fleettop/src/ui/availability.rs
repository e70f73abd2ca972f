//! Availability bar: one cell per day colored by severity, with the uptime
//! legend underneath.

use fleettop::availability::{DayBucket, Severity, UptimeSummary};
use fleettop::metrics::format_duration;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::ui::theme::{severity_color, MUTED};
use crate::ui::util::local_date;

const KEY: [Severity; 6] = [
    Severity::Available,
    Severity::Recovered,
    Severity::NetworkDisconnect,
    Severity::Restarted,
    Severity::Minor,
    Severity::Major,
];

pub const AVAILABILITY_HEIGHT: u16 = 6;

/// Index into `buckets` for a cursor counted in days back from today.
pub fn cursor_index(len: usize, days_back: usize) -> Option<usize> {
    len.checked_sub(1 + days_back)
}

/// One-line summary of a day, shown under the bar for the cursor cell.
pub fn day_summary(b: &DayBucket<'_>) -> String {
    let date = local_date(b.day_start);
    if b.events.is_empty() {
        return format!("{date}: {}", b.severity.label());
    }
    format!(
        "{date}: {} - {} event(s), {} downtime",
        b.severity.label(),
        b.events.len(),
        format_duration(Some(b.total_duration()))
    )
}

pub fn draw_availability(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    buckets: &[DayBucket<'_>],
    uptime: Option<UptimeSummary>,
    window_days: u32,
    cursor: usize,
    loaded: bool,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Availability ({window_days} days)"));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 4 || inner.width < 10 {
        return;
    }
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 4])
        .split(inner);

    if !loaded {
        f.render_widget(
            Paragraph::new("loading availability...").style(Style::default().fg(MUTED)),
            rows[0],
        );
        return;
    }

    // Newest days win when the pane is narrower than the window
    let shown = buckets.len().min(inner.width as usize);
    let tail = &buckets[buckets.len() - shown..];
    let at = cursor_index(tail.len(), cursor);
    let bar: Vec<Span> = tail
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let style = Style::default().fg(severity_color(b.severity));
            if Some(i) == at {
                Span::styled("▼", style.add_modifier(Modifier::BOLD))
            } else {
                Span::styled("█", style)
            }
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(bar)), rows[0]);

    let legend = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);
    let muted = Style::default().fg(MUTED);
    f.render_widget(Paragraph::new(format!("{shown} days ago")).style(muted), legend[0]);
    if let Some(u) = uptime {
        f.render_widget(
            Paragraph::new(format!("{u}% uptime"))
                .style(muted)
                .alignment(Alignment::Center),
            legend[1],
        );
    }
    f.render_widget(
        Paragraph::new("Today").style(muted).alignment(Alignment::Right),
        legend[2],
    );

    if let Some(b) = at.map(|i| &tail[i]) {
        f.render_widget(Paragraph::new(day_summary(b)), rows[2]);
    }

    let mut key: Vec<Span> = Vec::with_capacity(KEY.len() * 2);
    for s in KEY {
        key.push(Span::styled("■ ", Style::default().fg(severity_color(s))));
        key.push(Span::styled(format!("{}  ", s.label()), muted));
    }
    f.render_widget(Paragraph::new(Line::from(key)), rows[3]);
}
