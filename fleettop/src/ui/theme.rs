//! Shared UI theme constants.

use fleettop::availability::Severity;
use fleettop::metrics::UsageLevel;
use ratatui::style::Color;

// Scrollbar colors
pub const SB_ARROW: Color = Color::Rgb(170, 170, 180);
pub const SB_TRACK: Color = Color::Rgb(170, 170, 180);
pub const SB_THUMB: Color = Color::Rgb(170, 170, 180);

pub const SELECTED_BORDER: Color = Color::Cyan;
pub const MUTED: Color = Color::Gray;

pub fn usage_color(level: UsageLevel) -> Color {
    match level {
        UsageLevel::Low => Color::Rgb(40, 167, 69),
        UsageLevel::Medium => Color::Rgb(255, 193, 7),
        UsageLevel::High => Color::Rgb(220, 53, 69),
    }
}

pub fn severity_color(s: Severity) -> Color {
    match s {
        Severity::Available => Color::Rgb(40, 167, 69),
        Severity::Recovered => Color::Rgb(23, 162, 184),
        Severity::NetworkDisconnect => Color::Rgb(253, 126, 20),
        Severity::Restarted => Color::Rgb(111, 66, 193),
        Severity::Minor => Color::Rgb(255, 193, 7),
        Severity::Major => Color::Rgb(220, 53, 69),
    }
}

pub fn freshness_color(recent: bool) -> Color {
    if recent {
        Color::Green
    } else {
        Color::Red
    }
}
