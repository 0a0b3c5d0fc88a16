//! Shared application state for the web server.
//!
//! Holds the latest fetched snapshot of every backend resource. Nothing is
//! persisted; a restart starts from empty snapshots that the pollers refill.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use beesync_analytics::HoneyGrid;
use beesync_client::BackendClients;
use beesync_common::entities::{
    Notification, PerformanceHistoryEntry, Resource, SynchronizedReading, ThreatAlert,
    ThreatPrediction,
};
use beesync_common::Result;
use beesync_config::Config;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use crate::gate::RequestGate;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// New latest/historical readings for a hive
    ReadingsUpdated { hive_id: i64, timestamp: Option<String> },
    /// Threat alert list refreshed
    AlertsUpdated { count: usize, latest: Option<String> },
    /// A manual threat prediction came back
    ThreatDetected { threat_type: String, probability: f64 },
    /// Notification list refreshed
    NotificationsUpdated { count: usize },
    /// Performance analysis finished for a hive
    AnalysisComplete { hive_id: i64, level: Option<u8> },
    /// Placement grid or resources changed
    PlacementUpdated { locations: usize },
}

/// Layout state. Lives for the process only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub sidebar_collapsed: bool,
    pub overlay_open: bool,
}

/// Latest readings held for one hive.
///
/// History is stored per window (in hours) and only for windows whose fetch
/// actually succeeded, so a page never sees readings from another range.
#[derive(Debug, Clone, Default)]
pub struct HiveSnapshot {
    pub latest: Option<SynchronizedReading>,
    pub history: BTreeMap<u32, Vec<SynchronizedReading>>,
    pub performance_history: BTreeMap<u32, Vec<PerformanceHistoryEntry>>,
    /// Window a page last asked for; the readings poller keeps it fresh.
    pub hours: u32,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl HiveSnapshot {
    /// Readings for `hours`, empty when that window was never loaded.
    pub fn history_for(&self, hours: u32) -> &[SynchronizedReading] {
        self.history.get(&hours).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn performance_for(&self, hours: u32) -> &[PerformanceHistoryEntry] {
        self.performance_history.get(&hours).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_window(&self, hours: u32) -> bool {
        self.history.contains_key(&hours)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlacementSnapshot {
    pub grid: HoneyGrid,
    pub resources: Vec<Resource>,
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub clients: BackendClients,
    pub ui: RwLock<UiState>,
    pub hives: RwLock<HashMap<i64, HiveSnapshot>>,
    pub placement: RwLock<PlacementSnapshot>,
    /// Full alert list for the alerts page
    pub alerts: RwLock<Vec<ThreatAlert>>,
    /// Most recent alerts for the threat-detection page
    pub recent_alerts: RwLock<Vec<ThreatAlert>>,
    pub last_threat: RwLock<Option<ThreatPrediction>>,
    pub notifications: RwLock<Vec<Notification>>,
    pub dismissed: RwLock<HashSet<i64>>,
    pub gate: RequestGate,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let clients = BackendClients::from_config(&config.backend)?;
        let (event_tx, _) = broadcast::channel(256);
        Ok(Self {
            config,
            clients,
            ui: RwLock::new(UiState::default()),
            hives: RwLock::new(HashMap::new()),
            placement: RwLock::new(PlacementSnapshot::default()),
            alerts: RwLock::new(Vec::new()),
            recent_alerts: RwLock::new(Vec::new()),
            last_threat: RwLock::new(None),
            notifications: RwLock::new(Vec::new()),
            dismissed: RwLock::new(HashSet::new()),
            gate: RequestGate::new(),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Send to SSE subscribers. Having none is not an error.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }

    pub async fn hive_snapshot(&self, hive_id: i64) -> HiveSnapshot {
        self.hives.read().await.get(&hive_id).cloned().unwrap_or_default()
    }
}

pub type SharedState = Arc<AppState>;
