//! Small UI helpers: truncation, local time, drawer geometry.

use chrono::{DateTime, Local};
use ratatui::layout::Rect;

pub fn truncate_middle(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(len - right).collect();
    format!("{head}...{tail}")
}

pub fn local_time(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn local_date(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

// Detail drawer: full width on narrow terminals, right 80% otherwise
pub fn drawer_area(area: Rect) -> Rect {
    if area.width < 100 {
        return area;
    }
    let w = area.width * 4 / 5;
    Rect {
        x: area.x + area.width - w,
        y: area.y,
        width: w,
        height: area.height,
    }
}
