//! Request-driven sampling: one summary of this host per `/api/get_summary`.

use std::cmp::Ordering;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, UpdateKind};
use tracing::warn;

use crate::gpu;
use crate::state::AppState;
use crate::types::{ProcessInfo, ServerSummary};

const MB: f64 = 1024.0 * 1024.0;

/// Processes at or below this many MB are not reported.
pub const PROCESS_MIN_MB: f64 = 100.0;
pub const TOP_PROCESSES: usize = 5;

pub async fn collect_summary(state: &AppState) -> ServerSummary {
    let mut sys = state.sys.lock().await;
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_memory()
                .with_cmd(UpdateKind::OnlyIfNotSet)
                .with_user(UpdateKind::OnlyIfNotSet),
        );
    })) {
        warn!("sysinfo refresh panicked: {e:?}");
    }

    let cpu_usage = f64::from(sys.global_cpu_usage());
    let memory_total = sys.total_memory() as f64 / MB;
    let memory_used = sys.total_memory().saturating_sub(sys.available_memory()) as f64 / MB;

    let mut users = state.users.lock().await;
    users.refresh();
    let candidates: Vec<ProcessInfo> = sys
        .processes()
        .values()
        .map(|p| {
            let cmd = p
                .cmd()
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            ProcessInfo {
                user: p
                    .user_id()
                    .and_then(|uid| users.get_user_by_id(uid))
                    .map(|u| u.name().to_string())
                    .unwrap_or_default(),
                full_cmd: if cmd.is_empty() {
                    p.name().to_string_lossy().into_owned()
                } else {
                    cmd
                },
                used_memory: p.memory() as f64 / MB,
            }
        })
        .collect();
    drop(users);
    drop(sys);

    let gpu_info = gpu::gpus();
    ServerSummary {
        machine_name: state.machine_name.clone(),
        machine_alias: state.machine_alias.clone(),
        server_type: if gpu_info.is_empty() { "CPU" } else { "GPU" },
        cpu_usage: round2(cpu_usage),
        memory_usage: round2(percent(memory_used, memory_total)),
        memory_used: round2(memory_used),
        memory_total: round2(memory_total),
        gpu_info,
        network_status: "online",
        timestamp: chrono::Utc::now().timestamp(),
        top_processes: top_processes(candidates, PROCESS_MIN_MB, TOP_PROCESSES),
    }
}

/// Largest `limit` processes above `min_mb`, biggest first.
pub fn top_processes(mut procs: Vec<ProcessInfo>, min_mb: f64, limit: usize) -> Vec<ProcessInfo> {
    procs.retain(|p| p.used_memory > min_mb);
    procs.sort_by(|a, b| {
        b.used_memory
            .partial_cmp(&a.used_memory)
            .unwrap_or(Ordering::Equal)
    });
    procs.truncate(limit);
    for p in &mut procs {
        p.used_memory = round2(p.used_memory);
    }
    procs
}

fn percent(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        used / total * 100.0
    } else {
        0.0
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(cmd: &str, mb: f64) -> ProcessInfo {
        ProcessInfo {
            user: "root".into(),
            full_cmd: cmd.into(),
            used_memory: mb,
        }
    }

    #[test]
    fn keeps_five_largest_over_threshold() {
        let procs = vec![
            p("a", 50.0),
            p("b", 100.0),
            p("c", 300.0),
            p("d", 150.5),
            p("e", 1024.0),
            p("f", 101.0),
            p("g", 700.0),
            p("h", 200.0),
        ];
        let top = top_processes(procs, PROCESS_MIN_MB, TOP_PROCESSES);
        let names: Vec<&str> = top.iter().map(|p| p.full_cmd.as_str()).collect();
        assert_eq!(names, ["e", "g", "c", "h", "d"]);
    }

    #[test]
    fn empty_when_nothing_is_large() {
        assert!(top_processes(vec![p("a", 99.9)], PROCESS_MIN_MB, TOP_PROCESSES).is_empty());
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent(5.0, 0.0), 0.0);
        assert_eq!(round2(percent(1.0, 3.0)), 33.33);
    }
}
