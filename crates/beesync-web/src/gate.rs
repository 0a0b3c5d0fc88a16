//! In-flight de-duplication for backend requests.
//!
//! Each `(hive, endpoint)` key admits one request at a time. Every admitted
//! request gets a generation number, and its result is applied only if no
//! newer generation for the same key has been applied already.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Latest,
    /// Keyed by window length in hours
    Historical(u32),
    PerformanceHistory(u32),
    Analyze,
    Alerts,
    Notifications,
    Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateKey {
    pub hive_id: Option<i64>,
    pub endpoint: Endpoint,
}

impl GateKey {
    pub fn hive(hive_id: i64, endpoint: Endpoint) -> Self {
        Self { hive_id: Some(hive_id), endpoint }
    }

    pub fn global(endpoint: Endpoint) -> Self {
        Self { hive_id: None, endpoint }
    }
}

#[derive(Debug, Default)]
struct KeyState {
    in_flight: bool,
    issued: u64,
    applied: u64,
}

#[derive(Debug, Default)]
pub struct RequestGate {
    keys: Mutex<HashMap<GateKey, KeyState>>,
}

/// Admission for one request. Dropping it without `complete` releases the key.
#[derive(Debug)]
pub struct Ticket<'a> {
    gate: &'a RequestGate,
    key: GateKey,
    generation: u64,
    done: bool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a request for `key`, or `None` if one is already in flight.
    pub fn try_begin(&self, key: GateKey) -> Option<Ticket<'_>> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        let entry = keys.entry(key).or_default();
        if entry.in_flight {
            return None;
        }
        entry.in_flight = true;
        entry.issued += 1;
        Some(Ticket { gate: self, key, generation: entry.issued, done: false })
    }

    pub fn is_in_flight(&self, key: GateKey) -> bool {
        let keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.get(&key).is_some_and(|s| s.in_flight)
    }

    fn finish(&self, key: GateKey, generation: u64, apply: bool) -> bool {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        let entry = keys.entry(key).or_default();
        entry.in_flight = false;
        if apply && generation > entry.applied {
            entry.applied = generation;
            true
        } else {
            false
        }
    }
}

impl Ticket<'_> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Release the key. Returns true when the caller should apply its
    /// response, false when it is older than one already applied.
    pub fn complete(mut self) -> bool {
        self.done = true;
        self.gate.finish(self.key, self.generation, true)
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.gate.finish(self.key, self.generation, false);
        }
    }
}
