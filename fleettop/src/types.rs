//! Types that mirror the dashboard API's JSON schema.
//!
//! The API is loose about shape: fields go missing or come back as `null` on
//! hosts that never reported them. Every field defaults instead of failing the
//! whole response.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerKind {
    #[default]
    Cpu,
    Gpu,
}

impl<'de> Deserialize<'de> for ServerKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: Option<String> = Option::deserialize(d)?;
        Ok(match s.as_deref() {
            Some(v) if v.eq_ignore_ascii_case("gpu") => ServerKind::Gpu,
            _ => ServerKind::Cpu,
        })
    }
}

impl std::fmt::Display for ServerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerKind::Cpu => f.write_str("CPU"),
            ServerKind::Gpu => f.write_str("GPU"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct GpuStat {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    // 0..100
    #[serde(default, deserialize_with = "null_default")]
    pub utilization: f64,
    // MB
    #[serde(default, deserialize_with = "null_default")]
    pub memory_used: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub memory_total: f64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ProcessStat {
    #[serde(default, deserialize_with = "null_default")]
    pub user: String,
    #[serde(default, alias = "full_command", deserialize_with = "null_default")]
    pub full_cmd: String,
    // MB
    #[serde(default, deserialize_with = "null_default")]
    pub used_memory: f64,
}

/// One fleet member as of the latest poll. Replaced wholesale on every refresh.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ServerSnapshot {
    // Empty means the record has no identity; the view skips it
    #[serde(default, deserialize_with = "null_default")]
    pub machine_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub machine_alias: String,
    #[serde(default)]
    pub server_type: ServerKind,
    #[serde(default, deserialize_with = "null_default")]
    pub cpu_usage: f64,
    // Server-side percent; derived from used/total when absent
    #[serde(default)]
    pub memory_usage: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub memory_used: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub memory_total: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub gpu_info: Vec<GpuStat>,
    #[serde(default, deserialize_with = "null_default")]
    pub network_status: String,
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub top_processes: Vec<ProcessStat>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SummaryResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub servers: Vec<ServerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Recovered,
    NetworkDisconnect,
    FirstSendAfterRestart,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Recovered => "recovered",
            EventKind::NetworkDisconnect => "network_disconnect",
            EventKind::FirstSendAfterRestart => "first_send_after_restart",
            EventKind::Other(s) => s,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "recovered" => EventKind::Recovered,
            "network_disconnect" => EventKind::NetworkDisconnect,
            "first_send_after_restart" => EventKind::FirstSendAfterRestart,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: Option<String> = Option::deserialize(d)?;
        Ok(EventKind::from(s.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct EventDetails {
    // seconds; absent means unknown
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DowntimeEvent {
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub timestamp: i64,
    #[serde(rename = "event", default = "unknown_kind")]
    pub kind: EventKind,
    #[serde(default, deserialize_with = "null_default")]
    pub details: EventDetails,
}

impl DowntimeEvent {
    pub fn new(timestamp: i64, kind: &str, duration: Option<f64>) -> Self {
        Self {
            timestamp,
            kind: EventKind::from(kind),
            details: EventDetails { duration },
        }
    }

    /// Duration used for aggregation: absent counts as zero.
    pub fn duration_or_zero(&self) -> f64 {
        self.details.duration.unwrap_or(0.0)
    }
}

fn unknown_kind() -> EventKind {
    EventKind::Other(String::new())
}

fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// Reporters send either integer or fractional epoch seconds.
fn epoch_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v: Option<f64> = Option::deserialize(d)?;
    Ok(v.map(|s| s.floor() as i64).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tolerates_missing_and_null_fields() {
        let json = r#"{"servers":[
            {"machine_name":"a100-01","server_type":"GPU","cpu_usage":12.5,
             "memory_used":2048,"memory_total":8192,"gpu_info":null,
             "timestamp":1700000000.75},
            {"machine_name":"cpu-02","machine_alias":null,"server_type":"weird"}
        ]}"#;
        let s: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(s.servers.len(), 2);
        let a = &s.servers[0];
        assert_eq!(a.server_type, ServerKind::Gpu);
        assert!(a.gpu_info.is_empty());
        assert_eq!(a.timestamp, 1_700_000_000);
        assert_eq!(a.memory_usage, None);
        let b = &s.servers[1];
        assert_eq!(b.server_type, ServerKind::Cpu);
        assert_eq!(b.machine_alias, "");
        assert!(b.top_processes.is_empty());
    }

    #[test]
    fn nameless_server_does_not_fail_the_summary() {
        let json = r#"{"servers":[
            {"machine_name":"ok-01"},
            {"machine_name":null},
            {"cpu_usage":50}
        ]}"#;
        let s: SummaryResponse = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = s.servers.iter().map(|s| s.machine_name.as_str()).collect();
        assert_eq!(names, ["ok-01", "", ""]);
    }

    #[test]
    fn events_parse_known_and_unknown_kinds() {
        let json = r#"[
            {"timestamp":10,"event":"recovered","details":{"duration":30}},
            {"timestamp":20,"event":"network_disconnect","details":{}},
            {"timestamp":30,"event":"first_send_after_restart"},
            {"timestamp":40,"event":"disk_full","details":{"duration":null}}
        ]"#;
        let evs: Vec<DowntimeEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(evs[0].kind, EventKind::Recovered);
        assert_eq!(evs[0].details.duration, Some(30.0));
        assert_eq!(evs[1].kind, EventKind::NetworkDisconnect);
        assert_eq!(evs[1].details.duration, None);
        assert_eq!(evs[2].kind, EventKind::FirstSendAfterRestart);
        assert_eq!(evs[3].kind, EventKind::Other("disk_full".into()));
        assert_eq!(evs[3].kind.as_str(), "disk_full");
        assert_eq!(evs[3].duration_or_zero(), 0.0);
    }

    #[test]
    fn process_accepts_full_command_alias() {
        let p: ProcessStat =
            serde_json::from_str(r#"{"user":"ana","full_command":"python train.py","used_memory":512}"#)
                .unwrap();
        assert_eq!(p.full_cmd, "python train.py");
        assert_eq!(p.used_memory, 512.0);
    }
}
