//! Payloads served on `/api/*`. Field names follow the dashboard API.

use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct GpuInfo {
    pub name: String,
    pub utilization: f64,
    // MB
    pub memory_used: f64,
    pub memory_total: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProcessInfo {
    pub user: String,
    pub full_cmd: String,
    // MB
    pub used_memory: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct ServerSummary {
    pub machine_name: String,
    pub machine_alias: String,
    pub server_type: &'static str,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub memory_used: f64,
    pub memory_total: f64,
    pub gpu_info: Vec<GpuInfo>,
    pub network_status: &'static str,
    pub timestamp: i64,
    pub top_processes: Vec<ProcessInfo>,
}

#[derive(Debug, Serialize, Clone)]
pub struct SummaryResponse {
    pub servers: Vec<ServerSummary>,
}
