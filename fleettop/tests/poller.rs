//! Poller behavior against a scripted source, on tokio's paused clock.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fleettop::api::{FetchError, StatusSource};
use fleettop::clock::ManualClock;
use fleettop::fleet::{Applied, FleetView};
use fleettop::poller::{self, DetailKind, PollMessage, PollSettings};
use fleettop::types::{DowntimeEvent, ServerSnapshot};
use tokio::sync::mpsc;
use tokio::time::sleep;

fn server(name: &str) -> ServerSnapshot {
    ServerSnapshot {
        machine_name: name.into(),
        ..Default::default()
    }
}

/// Each summary call pops the next (delay, reply) pair; the last one repeats.
struct Scripted {
    summaries: Mutex<Vec<(Duration, Result<Vec<ServerSnapshot>, ()>)>>,
    summary_calls: AtomicUsize,
    detail_calls: Mutex<Vec<(String, DetailKind)>>,
}

impl Scripted {
    fn new(summaries: Vec<(Duration, Result<Vec<ServerSnapshot>, ()>)>) -> Self {
        Self {
            summaries: Mutex::new(summaries),
            summary_calls: AtomicUsize::new(0),
            detail_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StatusSource for Scripted {
    async fn summary(&self) -> Result<Vec<ServerSnapshot>, FetchError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, reply) = {
            let mut s = self.summaries.lock().unwrap();
            if s.len() > 1 {
                s.remove(0)
            } else {
                s[0].clone()
            }
        };
        sleep(delay).await;
        reply.map_err(|_| FetchError::Network("connection refused".into()))
    }

    async fn events(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError> {
        self.detail_calls
            .lock()
            .unwrap()
            .push((machine.to_string(), DetailKind::Events));
        Ok(vec![DowntimeEvent::new(100, "recovered", Some(60.0))])
    }

    async fn availability(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError> {
        self.detail_calls
            .lock()
            .unwrap()
            .push((machine.to_string(), DetailKind::Availability));
        Ok(Vec::new())
    }
}

fn settings(interval_ms: u64, timeout_ms: u64) -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(interval_ms),
        detail_interval: Duration::from_secs(60),
        timeout: Duration::from_millis(timeout_ms),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_older_summary_is_dropped_as_stale() {
    let src = Arc::new(Scripted::new(vec![
        (Duration::from_millis(2500), Ok(vec![server("old")])),
        (Duration::from_millis(10), Ok(vec![server("new")])),
        (Duration::from_secs(3600), Ok(vec![])),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = poller::spawn(src, Arc::new(ManualClock::new(1_000)), settings(1000, 10_000), tx);

    let mut view = FleetView::default();
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, PollMessage::Summary { seq: 2, .. }));
    assert_eq!(view.apply(first), Applied::Updated);

    let second = rx.recv().await.unwrap();
    assert!(matches!(second, PollMessage::Summary { seq: 1, .. }));
    assert_eq!(view.apply(second), Applied::Stale);

    assert_eq!(view.servers()[0].machine_name, "new");
    assert_eq!(view.last_refresh(), Some(1_000));
}

#[tokio::test(start_paused = true)]
async fn hung_request_times_out_and_keeps_data() {
    let src = Arc::new(Scripted::new(vec![
        (Duration::ZERO, Ok(vec![server("a")])),
        (Duration::from_secs(3600), Ok(vec![])),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = poller::spawn(src, Arc::new(ManualClock::new(0)), settings(1000, 500), tx);

    let mut view = FleetView::default();
    assert_eq!(view.apply(rx.recv().await.unwrap()), Applied::Updated);

    let msg = rx.recv().await.unwrap();
    match &msg {
        PollMessage::Summary { result, .. } => {
            assert!(matches!(result, Err(FetchError::Timeout)))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(view.apply(msg), Applied::Kept);
    assert_eq!(view.servers().len(), 1);
    assert!(view.last_error().unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn selecting_a_machine_fetches_both_histories() {
    let src = Arc::new(Scripted::new(vec![(
        Duration::ZERO,
        Ok(vec![server("a"), server("b")]),
    )]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = poller::spawn(
        src.clone(),
        Arc::new(ManualClock::new(0)),
        settings(1000, 500),
        tx,
    );

    let mut view = FleetView::default();
    view.apply(rx.recv().await.unwrap());
    view.move_selection(1);
    let machine = view.open_detail().unwrap();
    assert_eq!(machine, "b");
    handle.select(Some(machine));

    let mut kinds = Vec::new();
    while kinds.len() < 2 {
        match rx.recv().await.unwrap() {
            msg @ PollMessage::Detail { .. } => {
                if let PollMessage::Detail { kind, .. } = &msg {
                    kinds.push(*kind);
                }
                assert_eq!(view.apply(msg), Applied::Updated);
            }
            msg => {
                view.apply(msg);
            }
        }
    }
    kinds.sort_by_key(|k| matches!(k, DetailKind::Availability));
    assert_eq!(kinds, [DetailKind::Events, DetailKind::Availability]);

    let detail = view.detail().unwrap();
    assert!(detail.loaded());
    assert_eq!(detail.events.len(), 1);
    assert!(src
        .detail_calls
        .lock()
        .unwrap()
        .iter()
        .all(|(m, _)| m == "b"));
}

#[tokio::test(start_paused = true)]
async fn fetch_errors_are_delivered_not_fatal() {
    let src = Arc::new(Scripted::new(vec![
        (Duration::ZERO, Err(())),
        (Duration::ZERO, Ok(vec![server("a")])),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let clock = Arc::new(ManualClock::new(0));
    let _handle = poller::spawn(src, clock.clone(), settings(200, 500), tx);

    let mut view = FleetView::default();
    assert_eq!(view.apply(rx.recv().await.unwrap()), Applied::Kept);
    assert!(view.last_error().is_some());
    assert_eq!(view.last_refresh(), None);

    // The next tick stamps its reply with the clock as read at request time
    clock.advance(30);
    assert_eq!(view.apply(rx.recv().await.unwrap()), Applied::Updated);
    assert!(view.last_error().is_none());
    assert_eq!(view.last_refresh(), Some(30));
    assert_eq!(view.now(), 30);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let src = Arc::new(Scripted::new(vec![(Duration::ZERO, Ok(vec![]))]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = poller::spawn(src.clone(), Arc::new(ManualClock::new(0)), settings(100, 500), tx);
    rx.recv().await.unwrap();
    drop(handle);

    // Sender lives in the aborted task, so the channel closes
    while rx.recv().await.is_some() {}
    let calls = src.summary_calls.load(Ordering::SeqCst);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(src.summary_calls.load(Ordering::SeqCst), calls);
}
