//! Background refresh of backend snapshots.
//!
//! One task per data source, each driven by its own interval and stopped
//! through a shared `watch` channel. Handlers call the same `refresh_*`
//! functions directly when a page needs fresh data.

use std::future::Future;
use std::time::Duration;

use beesync_analytics::notifications::sort_newest_first;
use beesync_analytics::HoneyGrid;
use beesync_client::{AlertSource, NotificationSource, ReadingSource};
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::gate::{Endpoint, GateKey};
use crate::state::{AppEvent, AppState, SharedState};

/// Alerts shown on the threat-detection page.
pub const RECENT_ALERT_LIMIT: usize = 10;

// ── Refreshers ──────────────────────────────────────────────────────────────

/// Fetch latest reading, historical readings and performance history for one
/// hive concurrently. A failed fetch keeps the previous value; a window that
/// never loaded stays absent.
pub async fn refresh_hive(state: &AppState, hive_id: i64, hours: u32) {
    {
        let mut hives = state.hives.write().await;
        hives.entry(hive_id).or_default().hours = hours;
    }

    let source: &dyn ReadingSource = &state.clients.monitoring;
    let latest = async {
        let ticket = state.gate.try_begin(GateKey::hive(hive_id, Endpoint::Latest))?;
        Some((ticket, source.latest(hive_id).await))
    };
    let history = async {
        let ticket = state.gate.try_begin(GateKey::hive(hive_id, Endpoint::Historical(hours)))?;
        Some((ticket, source.historical(hive_id, hours).await))
    };
    let performance = async {
        let ticket = state.gate.try_begin(GateKey::hive(hive_id, Endpoint::PerformanceHistory(hours)))?;
        Some((ticket, state.clients.monitoring.performance_history(hive_id, hours).await))
    };
    let (latest, history, performance) = tokio::join!(latest, history, performance);

    let mut hives = state.hives.write().await;
    let snap = hives.entry(hive_id).or_default();
    let mut updated = false;

    if let Some((ticket, result)) = latest {
        match result {
            Ok(reading) => {
                if ticket.complete() {
                    snap.latest = reading;
                    updated = true;
                } else {
                    debug!(hive_id, "discarded stale latest reading");
                }
            }
            Err(e) => warn!(hive_id, error = %e, "latest reading fetch failed"),
        }
    }
    if let Some((ticket, result)) = history {
        match result {
            Ok(readings) => {
                if ticket.complete() {
                    snap.history.insert(hours, readings);
                    updated = true;
                } else {
                    debug!(hive_id, hours, "discarded stale history");
                }
            }
            Err(e) => warn!(hive_id, error = %e, "historical readings fetch failed"),
        }
    }
    if let Some((ticket, result)) = performance {
        match result {
            Ok(entries) => {
                if ticket.complete() {
                    snap.performance_history.insert(hours, entries);
                } else {
                    debug!(hive_id, "discarded stale performance history");
                }
            }
            Err(e) => warn!(hive_id, error = %e, "performance history fetch failed"),
        }
    }

    if updated {
        snap.fetched_at = Some(Utc::now());
        let timestamp = snap.latest.as_ref().map(|r| r.collection_timestamp.clone());
        drop(hives);
        state.publish(AppEvent::ReadingsUpdated { hive_id, timestamp });
    }
}

/// Full alert list for the alerts page.
pub async fn refresh_alerts(state: &AppState) {
    let Some(ticket) = state.gate.try_begin(GateKey::global(Endpoint::Alerts)) else {
        return;
    };
    let source: &dyn AlertSource = &state.clients.threat;
    let alerts = match source.alerts(None).await {
        Ok(alerts) => alerts,
        Err(e) => {
            warn!(error = %e, "alert fetch failed");
            return;
        }
    };
    if !ticket.complete() {
        debug!("discarded stale alert list");
        return;
    }
    let mut current = state.alerts.write().await;
    if *current != alerts {
        let count = alerts.len();
        let latest = alerts.first().map(|a| a.threat_type.clone());
        *current = alerts;
        drop(current);
        state.publish(AppEvent::AlertsUpdated { count, latest });
    }
}

/// The ten most recent alerts for the threat-detection page.
pub async fn refresh_recent_alerts(state: &AppState) {
    let source: &dyn AlertSource = &state.clients.threat;
    match source.alerts(Some(RECENT_ALERT_LIMIT)).await {
        Ok(alerts) => {
            let mut current = state.recent_alerts.write().await;
            if *current != alerts {
                let count = alerts.len();
                let latest = alerts.first().map(|a| a.threat_type.clone());
                *current = alerts;
                drop(current);
                state.publish(AppEvent::AlertsUpdated { count, latest });
            }
        }
        Err(e) => warn!(error = %e, "recent alert fetch failed"),
    }
}

pub async fn refresh_notifications(state: &AppState) {
    let Some(ticket) = state.gate.try_begin(GateKey::global(Endpoint::Notifications)) else {
        return;
    };
    let source: &dyn NotificationSource = &state.clients.services;
    let mut list = match source.notifications().await {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "notification fetch failed");
            return;
        }
    };
    if !ticket.complete() {
        debug!("discarded stale notification list");
        return;
    }
    sort_newest_first(&mut list);
    let mut current = state.notifications.write().await;
    if *current != list {
        let count = list.len();
        *current = list;
        drop(current);
        state.publish(AppEvent::NotificationsUpdated { count });
    }
}

/// Candidate locations and resources, fetched together.
pub async fn refresh_placement(state: &AppState) {
    let Some(ticket) = state.gate.try_begin(GateKey::global(Endpoint::Placement)) else {
        return;
    };
    let placement = &state.clients.placement;
    let (locations, resources) = tokio::join!(placement.potential_locations(), placement.resources());
    if !ticket.complete() {
        return;
    }

    let mut snap = state.placement.write().await;
    match locations {
        Ok(locations) => snap.grid = HoneyGrid::build(locations),
        Err(e) => warn!(error = %e, "potential locations fetch failed"),
    }
    match resources {
        Ok(resources) => snap.resources = resources,
        Err(e) => warn!(error = %e, "resources fetch failed"),
    }
    let count = snap.grid.locations().len();
    drop(snap);
    state.publish(AppEvent::PlacementUpdated { locations: count });
}

// ── Poller tasks ────────────────────────────────────────────────────────────

fn spawn_loop<F, Fut>(
    name: &'static str,
    period: Duration,
    state: SharedState,
    mut shutdown: watch::Receiver<bool>,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn(SharedState) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(poller = name, period_secs = period.as_secs(), "poller started");
        loop {
            tokio::select! {
                _ = ticker.tick() => tick(state.clone()).await,
                _ = shutdown.changed() => break,
            }
        }
        info!(poller = name, "poller stopped");
    })
}

/// Hives to keep fresh: the default one plus any a page has asked for.
async fn watched_hives(state: &AppState) -> Vec<(i64, u32)> {
    let default_hours = crate::handlers::dashboard::range_hours(&state.config.dashboard.default_range);
    let hives = state.hives.read().await;
    let mut watched: Vec<(i64, u32)> = hives
        .iter()
        .map(|(id, snap)| (*id, if snap.hours == 0 { default_hours } else { snap.hours }))
        .collect();
    let default_hive = state.config.dashboard.default_hive;
    if !hives.contains_key(&default_hive) {
        watched.push((default_hive, default_hours));
    }
    watched
}

pub fn spawn_pollers(state: SharedState, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
    let polling = state.config.polling.clone();
    vec![
        spawn_loop("readings", polling.readings(), state.clone(), shutdown.clone(), |state| async move {
            for (hive_id, hours) in watched_hives(&state).await {
                refresh_hive(&state, hive_id, hours).await;
            }
        }),
        spawn_loop("alerts", polling.alerts(), state.clone(), shutdown.clone(), |state| async move {
            refresh_alerts(&state).await;
        }),
        spawn_loop("recent_alerts", polling.threat_page(), state.clone(), shutdown.clone(), |state| async move {
            refresh_recent_alerts(&state).await;
        }),
        spawn_loop("notifications", polling.notifications(), state, shutdown, |state| async move {
            refresh_notifications(&state).await;
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use beesync_config::Config;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    fn state_for(server: &Server) -> AppState {
        let mut config = Config::default();
        config.backend.monitoring_url = server.url();
        config.backend.services_url = server.url();
        AppState::new(config).unwrap()
    }

    fn reading(timestamp: &str) -> serde_json::Value {
        json!({"collection_timestamp": timestamp, "hive_id": 3, "sensors": {"temperature": 35.0}})
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let mut server = Server::new_async().await;
        let latest = server
            .mock("GET", "/api/synchronized/latest")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"success": true, "data": reading("2025-03-01T10:00:00")}).to_string())
            .create_async()
            .await;
        let history = server
            .mock("GET", "/api/synchronized/historical")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"success": true, "data": [reading("2025-03-01T09:00:00")]}).to_string())
            .create_async()
            .await;

        let state = state_for(&server);
        let mut events = state.subscribe();
        refresh_hive(&state, 3, 24).await;
        assert!(matches!(events.try_recv(), Ok(AppEvent::ReadingsUpdated { hive_id: 3, .. })));

        latest.remove_async().await;
        history.remove_async().await;
        let _down = server
            .mock("GET", Matcher::Regex("^/api/synchronized/".to_string()))
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        refresh_hive(&state, 3, 24).await;
        let snap = state.hive_snapshot(3).await;
        assert_eq!(
            snap.latest.as_ref().map(|r| r.collection_timestamp.as_str()),
            Some("2025-03-01T10:00:00")
        );
        assert_eq!(snap.history_for(24).len(), 1);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        // A window that never loaded stays empty instead of borrowing another.
        refresh_hive(&state, 3, 168).await;
        let snap = state.hive_snapshot(3).await;
        assert_eq!(snap.hours, 168);
        assert!(snap.history_for(168).is_empty());
        assert!(!snap.has_window(168));
    }
}
