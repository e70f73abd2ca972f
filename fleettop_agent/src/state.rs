//! Shared agent state: persistent sysinfo handles and the names this host reports.

use std::sync::Arc;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, ProcessRefreshKind, RefreshKind, System, Users};
use tokio::sync::Mutex;

pub type SharedSystem = Arc<Mutex<System>>;
pub type SharedUsers = Arc<Mutex<Users>>;

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handles; CPU usage needs the previous refresh to diff against
    pub sys: SharedSystem,
    pub users: SharedUsers,

    pub machine_name: String,
    pub machine_alias: String,
}

impl AppState {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything())
            .with_processes(ProcessRefreshKind::everything());
        let mut sys = System::new_with_specifics(refresh_kind);
        sys.refresh_all();

        let hostname = System::host_name().unwrap_or_else(|| "localhost".into());
        let (machine_name, machine_alias) = machine_names(
            std::env::var("FLEETTOP_MACHINE_NAME").ok(),
            std::env::var("FLEETTOP_MACHINE_ALIAS").ok(),
            &hostname,
        );

        Self {
            sys: Arc::new(Mutex::new(sys)),
            users: Arc::new(Mutex::new(Users::new_with_refreshed_list())),
            machine_name,
            machine_alias,
        }
    }
}

/// Name and alias from the environment; each falls back to the hostname.
pub fn machine_names(
    name: Option<String>,
    alias: Option<String>,
    hostname: &str,
) -> (String, String) {
    let pick = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| hostname.to_string())
    };
    (pick(name), pick(alias))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_fall_back_to_hostname() {
        assert_eq!(
            machine_names(None, Some("  ".into()), "box"),
            ("box".to_string(), "box".to_string())
        );
        assert_eq!(
            machine_names(Some("gpu-01".into()), Some("Trainer".into()), "box"),
            ("gpu-01".to_string(), "Trainer".to_string())
        );
    }
}
