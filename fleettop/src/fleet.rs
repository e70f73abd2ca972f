//! View-model: the fleet as last successfully polled, plus the open detail
//! pane. Only [`FleetView::apply`] mutates fetched data.

use tracing::{debug, warn};

use crate::availability::{
    bucket_by_day, uptime, DayBucket, UptimeSummary, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
use crate::history::MachineHistory;
use crate::metrics::{average_gpu_utilization, CardMetrics};
use crate::poller::{DetailKind, PollMessage};
use crate::types::{DowntimeEvent, ServerKind, ServerSnapshot};

const HISTORY_CAP: usize = 600;

/// What `apply` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// Fetch failed; previous data kept.
    Kept,
    /// Older than data already shown.
    Stale,
    /// Detail reply for a pane that is no longer open.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct DetailView {
    pub machine: String,
    pub events: Vec<DowntimeEvent>,
    pub availability: Vec<DowntimeEvent>,
    events_seq: u64,
    availability_seq: u64,
    opened_seq: u64,
    pub last_error: Option<String>,
}

impl DetailView {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            ..Default::default()
        }
    }

    /// A pane that only accepts replies numbered above `floor`.
    fn opened_after(machine: impl Into<String>, floor: u64) -> Self {
        Self {
            events_seq: floor,
            availability_seq: floor,
            opened_seq: floor,
            ..Self::new(machine)
        }
    }

    pub fn loaded(&self) -> bool {
        self.availability_seq > self.opened_seq
    }
}

#[derive(Debug)]
pub struct FleetView {
    servers: Vec<ServerSnapshot>,
    summary_seq: u64,
    // Highest sequence number seen in any message
    seen_seq: u64,
    now: i64,
    last_refresh: Option<i64>,
    last_error: Option<String>,
    history: MachineHistory,
    selected: usize,
    detail: Option<DetailView>,
    window_days: u32,
}

impl Default for FleetView {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl FleetView {
    pub fn new(window_days: u32) -> Self {
        Self {
            servers: Vec::new(),
            summary_seq: 0,
            seen_seq: 0,
            now: 0,
            last_refresh: None,
            last_error: None,
            history: MachineHistory::new(HISTORY_CAP),
            selected: 0,
            detail: None,
            window_days: window_days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn servers(&self) -> &[ServerSnapshot] {
        &self.servers
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn last_refresh(&self) -> Option<i64> {
        self.last_refresh
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn history(&self) -> &MachineHistory {
        &self.history
    }

    pub fn apply(&mut self, msg: PollMessage) -> Applied {
        match msg {
            PollMessage::Summary { seq, now, result } => {
                self.now = self.now.max(now);
                self.seen_seq = self.seen_seq.max(seq);
                match result {
                    Err(e) if seq <= self.summary_seq => {
                        debug!(seq, applied = self.summary_seq, error = %e, "dropping stale summary error");
                        Applied::Stale
                    }
                    Err(e) => {
                        warn!(seq, error = %e, "Error fetching summary");
                        self.last_error = Some(e.to_string());
                        Applied::Kept
                    }
                    Ok(_) if seq <= self.summary_seq => {
                        debug!(seq, applied = self.summary_seq, "dropping stale summary");
                        Applied::Stale
                    }
                    Ok(servers) => {
                        self.replace_servers(seq, now, servers);
                        Applied::Updated
                    }
                }
            }
            PollMessage::Detail {
                seq,
                now,
                machine,
                kind,
                result,
            } => {
                self.now = self.now.max(now);
                self.seen_seq = self.seen_seq.max(seq);
                let Some(detail) = self.detail.as_mut().filter(|d| d.machine == machine) else {
                    return Applied::Ignored;
                };
                let (slot, slot_seq) = match kind {
                    DetailKind::Events => (&mut detail.events, &mut detail.events_seq),
                    DetailKind::Availability => {
                        (&mut detail.availability, &mut detail.availability_seq)
                    }
                };
                match result {
                    Err(_) if seq <= *slot_seq => Applied::Stale,
                    Err(e) => {
                        warn!(seq, machine = %machine, ?kind, error = %e, "Error fetching detail data");
                        detail.last_error = Some(e.to_string());
                        Applied::Kept
                    }
                    Ok(_) if seq <= *slot_seq => Applied::Stale,
                    Ok(events) => {
                        *slot = events;
                        *slot_seq = seq;
                        detail.last_error = None;
                        Applied::Updated
                    }
                }
            }
        }
    }

    // Whole-list replace: a machine missing from the reply is gone.
    fn replace_servers(&mut self, seq: u64, now: i64, servers: Vec<ServerSnapshot>) {
        let keep_selected = self
            .servers
            .get(self.selected)
            .map(|s| s.machine_name.clone());

        let before = servers.len();
        self.servers = servers;
        self.servers.retain(|s| !s.machine_name.is_empty());
        if self.servers.len() < before {
            debug!(skipped = before - self.servers.len(), "servers without a machine name");
        }
        self.summary_seq = seq;
        self.last_refresh = Some(now);
        self.last_error = None;

        for s in &self.servers {
            let load = match s.server_type {
                ServerKind::Gpu => average_gpu_utilization(&s.gpu_info),
                ServerKind::Cpu => s.cpu_usage,
            };
            self.history.push(&s.machine_name, load);
        }
        self.history
            .retain_machines(self.servers.iter().map(|s| s.machine_name.as_str()));

        self.selected = keep_selected
            .and_then(|name| self.servers.iter().position(|s| s.machine_name == name))
            .unwrap_or(self.selected)
            .min(self.servers.len().saturating_sub(1));

        if let Some(d) = &self.detail {
            if !self.servers.iter().any(|s| s.machine_name == d.machine) {
                debug!(machine = %d.machine, "detail machine left the fleet");
                self.detail = None;
            }
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_server(&self) -> Option<&ServerSnapshot> {
        self.servers.get(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.servers.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.servers.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    pub fn server(&self, machine: &str) -> Option<&ServerSnapshot> {
        self.servers.iter().find(|s| s.machine_name == machine)
    }

    /// Open the detail pane for the selected server; returns its name so the
    /// poller can start fetching its history. Replies numbered at or below
    /// anything already seen belong to an earlier pane and are dropped.
    pub fn open_detail(&mut self) -> Option<String> {
        let name = self.selected_server()?.machine_name.clone();
        if self.detail.as_ref().map(|d| d.machine.as_str()) != Some(name.as_str()) {
            self.detail = Some(DetailView::opened_after(name.clone(), self.seen_seq));
        }
        Some(name)
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn detail_server(&self) -> Option<&ServerSnapshot> {
        self.detail.as_ref().and_then(|d| self.server(&d.machine))
    }

    /// Day buckets for the open detail, derived fresh on every call.
    pub fn availability_buckets(&self) -> Option<Vec<DayBucket<'_>>> {
        let d = self.detail.as_ref()?;
        Some(bucket_by_day(&d.availability, self.window_days, self.now))
    }

    pub fn uptime(&self) -> Option<UptimeSummary> {
        let d = self.detail.as_ref()?;
        Some(uptime(&d.availability, self.window_days))
    }

    pub fn card_metrics(&self) -> Vec<CardMetrics> {
        self.servers.iter().map(CardMetrics::from_snapshot).collect()
    }
}
