//! Detail drawer for one server: overview, load, GPUs, processes,
//! availability timeline and the raw event list.

use fleettop::fleet::{DetailView, FleetView};
use fleettop::metrics::{
    format_duration, format_memory_usage, host_memory_percent, UsageLevel,
};
use fleettop::types::{DowntimeEvent, ServerSnapshot};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Sparkline},
};

use crate::ui::availability::{draw_availability, AVAILABILITY_HEIGHT};
use crate::ui::gpu::{draw_gpus, gpu_block_height};
use crate::ui::processes::draw_processes;
use crate::ui::theme::{usage_color, MUTED};
use crate::ui::util::{drawer_area, local_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventTab {
    #[default]
    Availability,
    EventLog,
}

impl EventTab {
    pub fn toggle(self) -> Self {
        match self {
            EventTab::Availability => EventTab::EventLog,
            EventTab::EventLog => EventTab::Availability,
        }
    }
}

/// Draws the drawer over `area` and returns the processes pane rect so the
/// app can size scroll pages.
pub fn draw_detail(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &FleetView,
    proc_scroll: usize,
    tab: EventTab,
    day_cursor: usize,
) -> Option<Rect> {
    let detail = view.detail()?;
    let server = view.detail_server()?;
    let area = drawer_area(area);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            "{} - {}  (Esc: close, Tab: events, Left/Right: day, PgUp/PgDn: processes)",
            server.machine_alias, server.machine_name
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let show_gpus = !server.gpu_info.is_empty();
    let gpu_h = if show_gpus {
        gpu_block_height(server.gpu_info.len(), 3)
    } else {
        0
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),                   // overview
            Constraint::Length(6),                   // cpu / memory / history
            Constraint::Length(gpu_h),               // gpus
            Constraint::Length(AVAILABILITY_HEIGHT), // availability bar
            Constraint::Min(5),                      // processes + events
        ])
        .split(inner);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    draw_overview(f, top[0], server);
    draw_status(f, top[1], detail);

    draw_usage(f, rows[1], server, view);
    if show_gpus {
        draw_gpus(f, rows[2], &server.gpu_info);
    }

    let buckets = view.availability_buckets().unwrap_or_default();
    draw_availability(
        f,
        rows[3],
        &buckets,
        view.uptime(),
        view.window_days(),
        day_cursor,
        detail.loaded(),
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[4]);
    draw_processes(f, bottom[0], &server.top_processes, proc_scroll);
    let (title, events) = match tab {
        EventTab::Availability => ("Detailed Events", &detail.availability),
        EventTab::EventLog => ("Event Log", &detail.events),
    };
    draw_events(f, bottom[1], title, events);

    Some(bottom[0])
}

fn draw_overview(f: &mut ratatui::Frame<'_>, area: Rect, s: &ServerSnapshot) {
    let label = Style::default().fg(MUTED);
    let row = |k: &'static str, v: String| {
        Line::from(vec![Span::styled(format!("{k:<12}"), label), Span::raw(v)])
    };
    let lines = vec![
        row("Name", s.machine_name.clone()),
        row("Server Type", s.server_type.to_string()),
        row("Memory", format_memory_usage(s.memory_used, s.memory_total)),
        row("GPU Count", s.gpu_info.len().to_string()),
        row("Status", s.network_status.clone()),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Overview")),
        area,
    );
}

fn draw_status(f: &mut ratatui::Frame<'_>, area: Rect, d: &DetailView) {
    let mut lines = if d.loaded() {
        vec![
            Line::from(format!("availability records: {}", d.availability.len())),
            Line::from(format!("event records: {}", d.events.len())),
        ]
    } else {
        vec![Line::from(Span::styled("loading...", Style::default().fg(MUTED)))]
    };
    if let Some(e) = &d.last_error {
        lines.push(Line::from(Span::styled(
            format!("last fetch failed: {e}"),
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("History")),
        area,
    );
}

fn draw_usage(f: &mut ratatui::Frame<'_>, area: Rect, s: &ServerSnapshot, view: &FleetView) {
    let block = Block::default().borders(Borders::ALL).title("CPU Usage");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 4 {
        return;
    }
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(inner);

    let cpu = s.cpu_usage.clamp(0.0, 100.0);
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(usage_color(UsageLevel::of(cpu))))
            .ratio(cpu / 100.0)
            .label(format!("CPU {cpu:.2}%")),
        rows[0],
    );

    let mem = host_memory_percent(s).clamp(0.0, 100.0);
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(usage_color(UsageLevel::of(mem))))
            .ratio(mem / 100.0)
            .label(format!(
                "Memory {}",
                format_memory_usage(s.memory_used, s.memory_total)
            )),
        rows[1],
    );

    let hist: Vec<u64> = view
        .history()
        .get(&s.machine_name)
        .map(|d| {
            let start = d.len().saturating_sub(rows[2].width as usize);
            d.iter().skip(start).copied().collect()
        })
        .unwrap_or_default();
    f.render_widget(
        Sparkline::default()
            .data(&hist)
            .max(100)
            .style(Style::default().fg(Color::Cyan)),
        rows[2],
    );
}

fn draw_events(f: &mut ratatui::Frame<'_>, area: Rect, title: &str, events: &[DowntimeEvent]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{title} ({})", events.len()));
    if events.is_empty() {
        f.render_widget(
            Paragraph::new("No downtime recorded")
                .style(Style::default().fg(MUTED))
                .block(block),
            area,
        );
        return;
    }
    let lines: Vec<Line> = events
        .iter()
        .map(|e| {
            Line::from(vec![
                Span::styled(
                    local_time(e.timestamp),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    ": {} - Duration: {}",
                    e.kind.as_str(),
                    format_duration(e.details.duration)
                )),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}
