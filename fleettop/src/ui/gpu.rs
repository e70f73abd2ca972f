//! Per-GPU utilization and memory bars for the detail pane.

use fleettop::metrics::{format_memory_usage, memory_percent, UsageLevel};
use fleettop::types::GpuStat;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::ui::theme::{usage_color, MUTED};

pub const ROWS_PER_GPU: u16 = 3;

/// Height the GPU block wants for `n` cards (including borders).
pub fn gpu_block_height(n: usize, max_cards: usize) -> u16 {
    if n == 0 {
        return 3;
    }
    n.min(max_cards) as u16 * ROWS_PER_GPU + 2
}

pub fn draw_gpus(f: &mut ratatui::Frame<'_>, area: Rect, gpus: &[GpuStat]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("GPU Usage ({})", gpus.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 || inner.width <= 2 {
        return;
    }
    if gpus.is_empty() {
        f.render_widget(Paragraph::new("No GPUs"), inner);
        return;
    }

    // Show 3 rows per GPU: name, util bar, memory bar.
    let max_gpus = (inner.height / ROWS_PER_GPU) as usize;
    let count = gpus.len().min(max_gpus);
    if count == 0 {
        return;
    }
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); count * ROWS_PER_GPU as usize])
        .split(inner);

    // Per bar horizontal layout: [gauge] [value]
    let split_bar = |r: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(8), Constraint::Length(28)])
            .split(r)
    };

    for (i, g) in gpus.iter().take(count).enumerate() {
        let base = i * ROWS_PER_GPU as usize;
        f.render_widget(
            Paragraph::new(Span::raw(format!("#{i} {}", g.name))).style(Style::default().fg(MUTED)),
            rows[base],
        );

        let util = g.utilization.clamp(0.0, 100.0);
        let util_cols = split_bar(rows[base + 1]);
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(usage_color(UsageLevel::of(util))))
                .label(Span::raw(""))
                .ratio(util / 100.0),
            util_cols[0],
        );
        f.render_widget(
            Paragraph::new(format!("util: {util:.0}%")).style(Style::default().fg(MUTED)),
            util_cols[1],
        );

        let mem_pct = memory_percent(g.memory_used, g.memory_total);
        let mem_cols = split_bar(rows[base + 2]);
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(usage_color(UsageLevel::of(mem_pct))))
                .label(Span::raw(""))
                .ratio((mem_pct / 100.0).clamp(0.0, 1.0)),
            mem_cols[0],
        );
        f.render_widget(
            Paragraph::new(format!(
                "mem: {} ({mem_pct:.0}%)",
                format_memory_usage(g.memory_used, g.memory_total)
            ))
            .style(Style::default().fg(MUTED)),
            mem_cols[1],
        );
    }
}
