//! Availability timeline: day buckets, per-day severity and rolling uptime.
//!
//! Everything here is pure and takes `now` explicitly so the poll cycle can
//! thread one timestamp through bucketing, classification and aggregation.

use std::cmp::Ordering;
use std::fmt;

use crate::types::{DowntimeEvent, EventKind};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
pub const DEFAULT_WINDOW_DAYS: u32 = 90;
/// Ten years; the timeline allocates one bucket per day.
pub const MAX_WINDOW_DAYS: u32 = 3650;
/// Generic downtime at or above this total within one day is `Major`.
pub const MAJOR_DOWNTIME_SECS: f64 = 3.0 * 60.0 * 60.0;

/// Verdict for one day of the timeline. Variants are listed in the order the
/// classifier checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Available,
    Recovered,
    NetworkDisconnect,
    Restarted,
    Minor,
    Major,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Available => "available",
            Severity::Recovered => "recovered",
            Severity::NetworkDisconnect => "network disconnect",
            Severity::Restarted => "restarted",
            Severity::Minor => "minor downtime",
            Severity::Major => "major downtime",
        }
    }
}

/// Classify the events of one day. Kind signals win over raw duration:
/// recovered, then network disconnect, then restart; otherwise the summed
/// duration decides between minor and major.
pub fn classify<'a, I>(events: I) -> Severity
where
    I: IntoIterator<Item = &'a DowntimeEvent>,
{
    let mut any = false;
    let mut recovered = false;
    let mut disconnect = false;
    let mut restarted = false;
    let mut total = 0.0_f64;

    for ev in events {
        any = true;
        match ev.kind {
            EventKind::Recovered => recovered = true,
            EventKind::NetworkDisconnect => disconnect = true,
            EventKind::FirstSendAfterRestart => restarted = true,
            EventKind::Other(_) => {}
        }
        total += ev.duration_or_zero();
    }

    if !any {
        Severity::Available
    } else if recovered {
        Severity::Recovered
    } else if disconnect {
        Severity::NetworkDisconnect
    } else if restarted {
        Severity::Restarted
    } else if total < MAJOR_DOWNTIME_SECS {
        Severity::Minor
    } else {
        Severity::Major
    }
}

/// One day-wide slot of the timeline: `[day_start, day_end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket<'a> {
    pub day_start: i64,
    pub day_end: i64,
    pub events: Vec<&'a DowntimeEvent>,
    pub severity: Severity,
}

impl DayBucket<'_> {
    /// Summed downtime of the day; events without a duration count as zero.
    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(|e| e.duration_or_zero()).sum()
    }
}

// Total order over events so bucket contents never depend on input order.
fn event_order(a: &DowntimeEvent, b: &DowntimeEvent) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.duration_or_zero().total_cmp(&b.duration_or_zero()))
}

/// Split `events` into exactly `total_days` consecutive day buckets ending at
/// `now`, oldest first. Bucket `i` covers
/// `[now - (total_days - i) * 86400, now - (total_days - i - 1) * 86400)`.
/// Events outside the window are ignored. `total_days == 0` yields no buckets.
pub fn bucket_by_day(events: &[DowntimeEvent], total_days: u32, now: i64) -> Vec<DayBucket<'_>> {
    let days = i64::from(total_days);
    let window_start = now - days * SECONDS_PER_DAY;

    let mut slots: Vec<Vec<&DowntimeEvent>> = vec![Vec::new(); total_days as usize];
    let mut sorted: Vec<&DowntimeEvent> = events.iter().collect();
    sorted.sort_by(|a, b| event_order(a, b));

    for ev in sorted {
        if ev.timestamp < window_start || ev.timestamp >= now {
            continue;
        }
        // ts >= window_start so the quotient is non-negative
        let idx = ((ev.timestamp - window_start) / SECONDS_PER_DAY) as usize;
        if let Some(slot) = slots.get_mut(idx) {
            slot.push(ev);
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, evs)| {
            let day_start = window_start + i as i64 * SECONDS_PER_DAY;
            let severity = classify(evs.iter().copied());
            DayBucket {
                day_start,
                day_end: day_start + SECONDS_PER_DAY,
                events: evs,
                severity,
            }
        })
        .collect()
}

/// Rolling uptime over the window. Not clamped: downtime larger than the
/// window yields a negative percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptimeSummary {
    pub percent: f64,
    pub downtime_seconds: f64,
    pub window_seconds: f64,
}

impl UptimeSummary {
    /// Percentage rounded to two decimals.
    pub fn rounded(&self) -> f64 {
        (self.percent * 100.0).round() / 100.0
    }
}

impl fmt::Display for UptimeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.percent)
    }
}

/// Sum every event's duration (absent as 0) against a `total_days` window.
pub fn uptime(events: &[DowntimeEvent], total_days: u32) -> UptimeSummary {
    let window_seconds = f64::from(total_days) * SECONDS_PER_DAY as f64;
    let downtime_seconds: f64 = events.iter().map(|e| e.duration_or_zero()).sum();
    let percent = if window_seconds > 0.0 {
        (window_seconds - downtime_seconds) / window_seconds * 100.0
    } else {
        100.0
    };
    UptimeSummary {
        percent,
        downtime_seconds,
        window_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn ev(ts: i64, kind: &str, dur: Option<f64>) -> DowntimeEvent {
        DowntimeEvent::new(ts, kind, dur)
    }

    #[test]
    fn buckets_are_contiguous_and_sized() {
        for days in [1u32, 7, 90, 365] {
            let b = bucket_by_day(&[], days, NOW);
            assert_eq!(b.len(), days as usize);
            for pair in b.windows(2) {
                assert_eq!(pair[0].day_end, pair[1].day_start);
                assert_eq!(pair[0].day_end - pair[0].day_start, SECONDS_PER_DAY);
            }
            assert_eq!(b.last().unwrap().day_end, NOW);
            assert_eq!(b[0].day_start, NOW - days as i64 * SECONDS_PER_DAY);
            assert!(b.iter().all(|d| d.severity == Severity::Available));
        }
    }

    #[test]
    fn zero_days_is_empty() {
        assert!(bucket_by_day(&[ev(NOW - 1, "x", None)], 0, NOW).is_empty());
    }

    #[test]
    fn event_on_day_end_goes_to_next_bucket() {
        let b0 = bucket_by_day(&[], 3, NOW);
        let boundary = b0[0].day_end;
        let events = vec![ev(boundary, "disk_full", Some(60.0))];
        let b = bucket_by_day(&events, 3, NOW);
        assert!(b[0].events.is_empty());
        assert_eq!(b[1].events.len(), 1);
        let total: usize = b.iter().map(|d| d.events.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn events_outside_window_are_ignored() {
        let events = vec![
            ev(NOW, "recovered", None),
            ev(NOW + 10, "recovered", None),
            ev(NOW - 2 * SECONDS_PER_DAY - 1, "recovered", None),
            ev(NOW - 2 * SECONDS_PER_DAY, "x", Some(5.0)),
        ];
        let b = bucket_by_day(&events, 2, NOW);
        assert_eq!(b[0].events.len(), 1);
        assert_eq!(b[0].severity, Severity::Minor);
        assert!(b[1].events.is_empty());
    }

    #[test]
    fn output_does_not_depend_on_input_order() {
        let mut events = vec![
            ev(NOW - 100, "network_disconnect", Some(40.0)),
            ev(NOW - 3 * SECONDS_PER_DAY + 5, "x", Some(11_000.0)),
            ev(NOW - 100, "recovered", Some(10.0)),
            ev(NOW - SECONDS_PER_DAY - 7, "first_send_after_restart", None),
        ];
        let original = events.clone();
        let forward = bucket_by_day(&original, 5, NOW);
        events.reverse();
        let backward = bucket_by_day(&events, 5, NOW);
        assert_eq!(forward, backward);
        assert_eq!(forward[4].severity, Severity::Recovered);
        assert_eq!(forward[3].severity, Severity::Restarted);
        assert_eq!(forward[2].severity, Severity::Major);
        assert_eq!(forward[4].events[0].timestamp, NOW - 100);
    }

    #[test]
    fn recovered_beats_disconnect_in_either_order() {
        let a = ev(1, "network_disconnect", None);
        let b = ev(2, "recovered", None);
        assert_eq!(classify([&a, &b]), Severity::Recovered);
        assert_eq!(classify([&b, &a]), Severity::Recovered);
    }

    #[test]
    fn classify_priority_chain() {
        assert_eq!(classify(std::iter::empty()), Severity::Available);
        let d = ev(1, "network_disconnect", Some(99_999.0));
        let r = ev(1, "first_send_after_restart", Some(99_999.0));
        assert_eq!(classify([&d, &r]), Severity::NetworkDisconnect);
        assert_eq!(classify([&r]), Severity::Restarted);
    }

    #[test]
    fn classify_duration_threshold() {
        assert_eq!(classify([&ev(1, "disk_full", Some(7200.0))]), Severity::Minor);
        assert_eq!(classify([&ev(1, "disk_full", Some(10_800.0))]), Severity::Major);
        assert_eq!(classify([&ev(1, "disk_full", None)]), Severity::Minor);
        let parts = [ev(1, "a", Some(6000.0)), ev(2, "b", Some(4800.0))];
        assert_eq!(classify(&parts), Severity::Major);
    }

    #[test]
    fn uptime_single_day_one_hour() {
        let u = uptime(&[ev(NOW - 10, "x", Some(3600.0))], 1);
        assert_eq!(u.to_string(), "95.83");
        assert!((u.rounded() - 95.83).abs() < 1e-9);
        assert_eq!(u.downtime_seconds, 3600.0);
    }

    #[test]
    fn uptime_empty_is_full() {
        for days in [1u32, 30, 90] {
            assert_eq!(uptime(&[], days).to_string(), "100.00");
        }
    }

    #[test]
    fn uptime_is_not_clamped() {
        let u = uptime(&[ev(0, "x", Some(2.0 * SECONDS_PER_DAY as f64))], 1);
        assert_eq!(u.to_string(), "-100.00");
    }

    #[test]
    fn uptime_ignores_missing_durations() {
        let events = [ev(1, "recovered", None), ev(2, "x", Some(864.0))];
        assert_eq!(uptime(&events, 1).to_string(), "99.00");
    }
}
