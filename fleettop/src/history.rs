//! Small utilities to manage bounded history buffers for charts.

use std::collections::{HashMap, VecDeque};

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

// Keeps one load history per machine with a fixed capacity
#[derive(Debug, Default)]
pub struct MachineHistory {
    pub deques: HashMap<String, VecDeque<u64>>,
    cap: usize,
}

impl MachineHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            deques: HashMap::new(),
            cap,
        }
    }

    // Push one sample (0..=100) for a machine
    pub fn push(&mut self, machine: &str, pct: f64) {
        let val = pct.clamp(0.0, 100.0).round() as u64;
        let cap = self.cap;
        let dq = self
            .deques
            .entry(machine.to_string())
            .or_insert_with(|| VecDeque::with_capacity(cap));
        push_capped(dq, val, cap);
    }

    // Drop histories of machines no longer in the fleet
    pub fn retain_machines<'a, I: IntoIterator<Item = &'a str>>(&mut self, live: I) {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.deques.retain(|k, _| live.contains(k.as_str()));
    }

    pub fn get(&self, machine: &str) -> Option<&VecDeque<u64>> {
        self.deques.get(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_and_pruned() {
        let mut h = MachineHistory::new(3);
        for v in [10.0, 20.0, 30.0, 140.0] {
            h.push("a", v);
        }
        h.push("b", -5.0);
        assert_eq!(h.get("a").unwrap().iter().copied().collect::<Vec<_>>(), [20, 30, 100]);
        assert_eq!(h.get("b").unwrap().front(), Some(&0));
        h.retain_machines(["b"]);
        assert!(h.get("a").is_none());
        assert!(h.get("b").is_some());
    }
}
