//! Derived numbers for cards and the detail pane: averages, percentages,
//! per-user process totals and human-readable labels.

use std::collections::BTreeMap;

use crate::types::{GpuStat, ProcessStat, ServerKind, ServerSnapshot};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `used / total` as a percentage; 0 when `total` is not positive.
pub fn memory_percent(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        round2(used / total * 100.0)
    } else {
        0.0
    }
}

pub fn average_gpu_utilization(gpus: &[GpuStat]) -> f64 {
    if gpus.is_empty() {
        return 0.0;
    }
    let total: f64 = gpus.iter().map(|g| g.utilization).sum();
    round2(total / gpus.len() as f64)
}

/// Summed (used, total) GPU memory in MB.
pub fn gpu_memory_totals(gpus: &[GpuStat]) -> (f64, f64) {
    gpus.iter()
        .fold((0.0, 0.0), |(u, t), g| (u + g.memory_used, t + g.memory_total))
}

/// Aggregate GPU memory percent across all cards; 0 with no memory reported.
pub fn gpu_memory_percent(gpus: &[GpuStat]) -> f64 {
    let (used, total) = gpu_memory_totals(gpus);
    memory_percent(used, total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Low,
    Medium,
    High,
}

impl UsageLevel {
    pub fn of(pct: f64) -> Self {
        if pct < 50.0 {
            UsageLevel::Low
        } else if pct < 75.0 {
            UsageLevel::Medium
        } else {
            UsageLevel::High
        }
    }
}

/// One headline gauge on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub title: &'static str,
    pub percent: f64,
    pub label: String,
}

impl Gauge {
    pub fn level(&self) -> UsageLevel {
        UsageLevel::of(self.percent)
    }
}

/// The two gauges a card shows: GPU servers report accelerator load,
/// CPU servers report host load.
#[derive(Debug, Clone, PartialEq)]
pub struct CardMetrics {
    pub primary: Gauge,
    pub secondary: Gauge,
}

impl CardMetrics {
    pub fn from_snapshot(s: &ServerSnapshot) -> Self {
        match s.server_type {
            ServerKind::Gpu => {
                let util = average_gpu_utilization(&s.gpu_info);
                let (used, total) = gpu_memory_totals(&s.gpu_info);
                Self {
                    primary: Gauge {
                        title: "GPU Utilization",
                        percent: util,
                        label: format!("{util:.1}%"),
                    },
                    secondary: Gauge {
                        title: "GPU Memory",
                        percent: memory_percent(used, total),
                        label: format_memory_usage(used, total),
                    },
                }
            }
            ServerKind::Cpu => {
                let cpu = round2(s.cpu_usage);
                let mem = host_memory_percent(s);
                Self {
                    primary: Gauge {
                        title: "CPU Usage",
                        percent: cpu,
                        label: format!("{cpu:.1}%"),
                    },
                    secondary: Gauge {
                        title: "Memory Usage",
                        percent: mem,
                        label: format!("{mem:.1}%"),
                    },
                }
            }
        }
    }
}

/// Host memory percent: the server's own figure when it sent one.
pub fn host_memory_percent(s: &ServerSnapshot) -> f64 {
    match s.memory_usage {
        Some(p) if p.is_finite() => round2(p),
        _ => memory_percent(s.memory_used, s.memory_total),
    }
}

/// Processes of one user with their summed memory (MB).
#[derive(Debug, Clone, PartialEq)]
pub struct UserProcesses<'a> {
    pub user: &'a str,
    pub total_memory: f64,
    pub processes: Vec<&'a ProcessStat>,
}

/// Group by user, heaviest user first (ties by name).
pub fn group_processes_by_user(procs: &[ProcessStat]) -> Vec<UserProcesses<'_>> {
    let mut by_user: BTreeMap<&str, UserProcesses<'_>> = BTreeMap::new();
    for p in procs {
        let entry = by_user.entry(p.user.as_str()).or_insert_with(|| UserProcesses {
            user: p.user.as_str(),
            total_memory: 0.0,
            processes: Vec::new(),
        });
        entry.total_memory += p.used_memory;
        entry.processes.push(p);
    }
    let mut out: Vec<UserProcesses<'_>> = by_user.into_values().collect();
    out.sort_by(|a, b| {
        b.total_memory
            .total_cmp(&a.total_memory)
            .then_with(|| a.user.cmp(b.user))
    });
    out
}

/// MB in, `"x.xGB"` out.
pub fn format_gb(mb: f64) -> String {
    format!("{:.1}GB", mb / 1024.0)
}

pub fn format_memory_usage(used_mb: f64, total_mb: f64) -> String {
    format!("{} / {}", format_gb(used_mb), format_gb(total_mb))
}

pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        None => "N/A".into(),
        Some(s) if s >= 3600.0 => format!("{:.1} hours", s / 3600.0),
        Some(s) => format!("{:.1} minutes", s / 60.0),
    }
}

/// Coarsest whole unit since `ts`, e.g. `"3 minute(s) ago"`.
pub fn format_time_ago(now: i64, ts: i64) -> String {
    let secs = (now - ts).max(0);
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;
    if days > 0 {
        format!("{days} day(s) ago")
    } else if hours > 0 {
        format!("{hours} hour(s) ago")
    } else if mins > 0 {
        format!("{mins} minute(s) ago")
    } else {
        format!("{secs} second(s) ago")
    }
}

/// Reported within the last minute.
pub fn is_recent_update(now: i64, ts: i64) -> bool {
    now - ts < 60
}
