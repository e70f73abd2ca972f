//! Background polling: a tokio task that fetches the fleet summary on a fixed
//! interval and, while a detail pane is open, that machine's event history.
//!
//! Every request gets a sequence number from one monotonic counter. Fetches
//! run concurrently, so replies can arrive out of order; the view-model uses
//! the numbers to drop stale ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::{FetchError, StatusSource, DEFAULT_TIMEOUT};
use crate::clock::Clock;
use crate::types::{DowntimeEvent, ServerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Events,
    Availability,
}

#[derive(Debug)]
pub enum PollMessage {
    Summary {
        seq: u64,
        now: i64,
        result: Result<Vec<ServerSnapshot>, FetchError>,
    },
    Detail {
        seq: u64,
        now: i64,
        machine: String,
        kind: DetailKind,
        result: Result<Vec<DowntimeEvent>, FetchError>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub detail_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            detail_interval: Duration::from_millis(5000),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Owns the polling task. Dropping it cancels the task and every in-flight
/// fetch.
pub struct PollerHandle {
    task: JoinHandle<()>,
    selected: watch::Sender<Option<String>>,
}

impl PollerHandle {
    /// Start (`Some`) or stop (`None`) detail polling for a machine.
    pub fn select(&self, machine: Option<String>) {
        self.selected.send_replace(machine);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn spawn<S, C>(
    source: Arc<S>,
    clock: Arc<C>,
    settings: PollSettings,
    tx: mpsc::UnboundedSender<PollMessage>,
) -> PollerHandle
where
    S: StatusSource + ?Sized + 'static,
    C: Clock + ?Sized + 'static,
{
    let (sel_tx, sel_rx) = watch::channel(None);
    let task = tokio::spawn(run(source, clock, settings, tx, sel_rx));
    PollerHandle {
        task,
        selected: sel_tx,
    }
}

async fn run<S, C>(
    source: Arc<S>,
    clock: Arc<C>,
    settings: PollSettings,
    tx: mpsc::UnboundedSender<PollMessage>,
    mut selected: watch::Receiver<Option<String>>,
) where
    S: StatusSource + ?Sized + 'static,
    C: Clock + ?Sized + 'static,
{
    let mut summary_tick = interval(settings.interval);
    summary_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut detail_tick = interval(settings.detail_interval);
    detail_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut inflight: JoinSet<PollMessage> = JoinSet::new();
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = summary_tick.tick() => {
                seq += 1;
                let now = clock.now_seconds();
                let src = source.clone();
                let limit = settings.timeout;
                inflight.spawn(async move {
                    let result = timeout(limit, src.summary())
                        .await
                        .unwrap_or(Err(FetchError::Timeout));
                    PollMessage::Summary { seq, now, result }
                });
            }
            _ = detail_tick.tick() => {
                let machine = selected.borrow().clone();
                if let Some(m) = machine {
                    spawn_detail(&mut inflight, &source, &mut seq, clock.now_seconds(), m, settings.timeout);
                }
            }
            changed = selected.changed() => {
                if changed.is_err() {
                    break;
                }
                let machine = selected.borrow_and_update().clone();
                if let Some(m) = machine {
                    debug!(machine = %m, "detail selected");
                    spawn_detail(&mut inflight, &source, &mut seq, clock.now_seconds(), m, settings.timeout);
                    detail_tick.reset();
                }
            }
            Some(joined) = inflight.join_next() => {
                match joined {
                    Ok(msg) => {
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_panic() => warn!("fetch task panicked: {e}"),
                    Err(_) => {}
                }
            }
        }
    }
    debug!("poller stopped");
}

fn spawn_detail<S>(
    inflight: &mut JoinSet<PollMessage>,
    source: &Arc<S>,
    seq: &mut u64,
    now: i64,
    machine: String,
    limit: Duration,
) where
    S: StatusSource + ?Sized + 'static,
{
    for kind in [DetailKind::Events, DetailKind::Availability] {
        *seq += 1;
        let seq = *seq;
        let src = source.clone();
        let machine = machine.clone();
        inflight.spawn(async move {
            let fut = async {
                match kind {
                    DetailKind::Events => src.events(&machine).await,
                    DetailKind::Availability => src.availability(&machine).await,
                }
            };
            let result = timeout(limit, fut).await.unwrap_or(Err(FetchError::Timeout));
            PollMessage::Detail {
                seq,
                now,
                machine,
                kind,
                result,
            }
        });
    }
}
