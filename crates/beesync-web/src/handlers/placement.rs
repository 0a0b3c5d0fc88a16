//! Hive placement: honey production grid over candidate locations,
//! nearby resources and the remote grid/prediction jobs.

use axum::{
    extract::{Path, Query, State},
    response::Html,
    Form,
};
use beesync_analytics::grid::{HIGH_COLOR, LOW_COLOR, MEDIUM_COLOR};
use beesync_analytics::HoneyGrid;
use beesync_common::entities::{Hive, NewResource, PotentialLocation, Resource, ResourceKind};
use beesync_common::Result;
use serde::Deserialize;
use tracing::{info, warn};

use crate::handlers::layout::{alert_box, app_page, escape};
use crate::poller::refresh_placement;
use crate::state::{AppEvent, SharedState};

const BASE: &str = "/NewHivePlacement";

#[derive(Debug, Default, Deserialize)]
pub struct PlacementQuery {
    pub cell: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceForm {
    pub lat: f64,
    pub lng: f64,
    pub kind: String,
    #[serde(default)]
    pub cell: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

/// Outcome banner shown above the grid after an action.
struct Banner {
    kind: &'static str,
    message: String,
}

impl Banner {
    fn from_result(result: Result<()>, ok: &str, action: &str) -> Self {
        match result {
            Ok(()) => Banner { kind: "success", message: ok.to_string() },
            Err(e) => {
                warn!(action, error = %e, "placement action failed");
                Banner { kind: "danger", message: format!("Failed to {action}: {e}") }
            }
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn placement_page(State(state): State<SharedState>, Query(q): Query<PlacementQuery>) -> Html<String> {
    refresh_placement(&state).await;
    render(&state, q.cell, None).await
}

pub async fn generate_grid(State(state): State<SharedState>) -> Html<String> {
    let result = state.clients.placement.generate_grid().await;
    finish(&state, Banner::from_result(result, "Location grid generated.", "generate grid")).await
}

pub async fn recalculate_distances(State(state): State<SharedState>) -> Html<String> {
    let result = state.clients.placement.recalculate_distances().await;
    finish(&state, Banner::from_result(result, "Resource distances recalculated.", "recalculate distances")).await
}

pub async fn predict_all(State(state): State<SharedState>) -> Html<String> {
    let result = state.clients.placement.predict_all().await;
    finish(&state, Banner::from_result(result, "Honey production predicted for all locations.", "predict honey production")).await
}

pub async fn load_optimal(State(state): State<SharedState>) -> Html<String> {
    info!("loading optimal locations");
    let result = state.clients.placement.load_optimal().await;
    finish(&state, Banner::from_result(result, "Optimal locations loaded.", "load optimal locations")).await
}

/// A new resource changes distances, so predictions are recomputed after it.
pub async fn add_resource(State(state): State<SharedState>, Form(form): Form<ResourceForm>) -> Html<String> {
    let Some(kind) = ResourceKind::parse(&form.kind) else {
        let banner = Banner { kind: "danger", message: format!("Unknown resource type: {}", form.kind) };
        return render(&state, form.cell, Some(banner)).await;
    };
    let placement = &state.clients.placement;
    let resource = NewResource { lat: form.lat, lng: form.lng, kind };
    let result = async {
        placement.add_resource(&resource).await?;
        placement.recalculate_distances().await?;
        placement.predict_all().await
    }
    .await;

    let banner = Banner::from_result(result, &format!("{} added. Predictions updated.", kind.label()), "add resource");
    refresh_placement(&state).await;
    render(&state, form.cell, Some(banner)).await
}

pub async fn clear_prediction(State(state): State<SharedState>, Path(id): Path<i64>) -> Html<String> {
    let banner = match state.clients.placement.clear_prediction(id).await {
        Ok(()) => {
            let cleared = state.placement.write().await.grid.clear_prediction(id);
            if cleared {
                state.publish(AppEvent::PlacementUpdated { locations: state.placement.read().await.grid.locations().len() });
            }
            Banner { kind: "success", message: format!("Prediction cleared for location {id}.") }
        }
        Err(e) => {
            warn!(id, error = %e, "Failed to clear prediction");
            Banner { kind: "danger", message: format!("Failed to clear prediction: {e}") }
        }
    };
    render(&state, Some(id), Some(banner)).await
}

/// Bulk clear. Without `confirm=yes` this only asks for confirmation.
pub async fn clear_all_predictions(State(state): State<SharedState>, Form(form): Form<ConfirmForm>) -> Html<String> {
    if form.confirm.as_deref() != Some("yes") {
        return confirm_page(&state).await;
    }

    let banner = match state.clients.placement.clear_all_predictions().await {
        Ok(()) => {
            let mut snap = state.placement.write().await;
            snap.grid.clear_predictions();
            let count = snap.grid.locations().len();
            drop(snap);
            state.publish(AppEvent::PlacementUpdated { locations: count });
            Banner { kind: "success", message: "All predictions cleared.".to_string() }
        }
        Err(e) => {
            warn!(error = %e, "Failed to clear all predictions");
            Banner { kind: "danger", message: format!("Failed to clear predictions: {e}") }
        }
    };
    render(&state, None, Some(banner)).await
}

async fn finish(state: &SharedState, banner: Banner) -> Html<String> {
    refresh_placement(state).await;
    render(state, None, Some(banner)).await
}

// ── Rendering ─────────────────────────────────────────────────────────────────

async fn confirm_page(state: &SharedState) -> Html<String> {
    let body = format!(r#"
    <div class="page-header">
        <h1 class="page-title">🗺️ Clear All Predictions</h1>
    </div>
    <div class="card confirm-card">
        <p>This removes the predicted honey production from every candidate location. Continue?</p>
        <form method="POST" action="{BASE}/clear-all" class="confirm-actions">
            <input type="hidden" name="confirm" value="yes">
            <button type="submit" class="btn btn-danger">Yes, clear all</button>
            <a href="{BASE}" class="btn btn-outline">Cancel</a>
        </form>
    </div>"#);
    app_page(state, "Hive Placement", "placement", &body, "", "").await
}

async fn render(state: &SharedState, selected: Option<i64>, banner: Option<Banner>) -> Html<String> {
    let hives = state.clients.monitoring.list_hives().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch hives for placement");
        Vec::new()
    });
    let snap = state.placement.read().await.clone();
    let grid = &snap.grid;

    let banner = banner
        .map(|b| alert_box(b.kind, Some(&b.message)))
        .unwrap_or_default();
    let detail = selected
        .and_then(|id| grid.location(id))
        .map(location_detail)
        .unwrap_or_else(|| r#"<p class="text-muted">Select a cell to see its details.</p>"#.to_string());

    let body = format!(r#"
    <div class="page-header" data-live="placement_updated">
        <div>
            <h1 class="page-title">🗺️ Hive Placement</h1>
            <p class="text-muted">{count} candidate locations · {rows}×{cols} grid · max production {max:.2} kg</p>
        </div>
        <div class="action-bar">
            <form method="POST" action="{BASE}/generate"><button class="btn btn-outline btn-sm">Generate Grid</button></form>
            <form method="POST" action="{BASE}/recalculate"><button class="btn btn-outline btn-sm">Recalculate Distances</button></form>
            <form method="POST" action="{BASE}/predict-all"><button class="btn btn-outline btn-sm">Predict All</button></form>
            <form method="POST" action="{BASE}/load-optimal"><button class="btn btn-primary btn-sm">Load Optimal Locations</button></form>
            <form method="POST" action="{BASE}/clear-all"><button class="btn btn-danger btn-sm">Clear All Predictions</button></form>
        </div>
    </div>
    {banner}

    <div class="placement-layout">
        <div class="card">
            <div class="card-header">Honey Production Grid</div>
            {legend}
            {grid_html}
        </div>
        <div class="card">
            <div class="card-header">Location Details</div>
            {detail}
        </div>
    </div>

    <div class="card">
        <div class="card-header">Existing Hives</div>
        {hives_html}
    </div>

    <div class="card">
        <div class="card-header">Nearby Resources</div>
        {resources_html}
    </div>"#,
        count = grid.locations().len(),
        rows = grid.rows(),
        cols = grid.cols(),
        max = grid.max_honey(),
        legend = legend(),
        grid_html = grid_table(grid, selected),
        hives_html = hives_table(&hives),
        resources_html = resources_table(&snap.resources),
    );

    app_page(state, "Hive Placement", "placement", &body, "", "").await
}

fn legend() -> String {
    format!(r#"
            <div class="grid-legend">
                <span><i style="background:{HIGH_COLOR}"></i> &gt; 70% of max</span>
                <span><i style="background:{MEDIUM_COLOR}"></i> &gt; 40% of max</span>
                <span><i style="background:{LOW_COLOR}"></i> lower</span>
                <span><i class="legend-empty"></i> not predicted</span>
            </div>"#)
}

fn grid_table(grid: &HoneyGrid, selected: Option<i64>) -> String {
    if grid.is_empty() {
        return r#"<p class="text-muted text-center">No candidate locations yet. Generate a grid to get started.</p>"#.to_string();
    }
    let rows: String = grid
        .cells()
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| match cell.location_id {
                    Some(id) => {
                        let class = if Some(id) == selected { "grid-cell selected" } else { "grid-cell" };
                        let title = cell
                            .honey_production
                            .map(|v| format!("{v:.2} kg"))
                            .unwrap_or_else(|| "Not predicted yet".to_string());
                        format!(r#"<td class="{class}" style="background:{color}"><a href="{BASE}?cell={id}" title="{title}"></a></td>"#, color = cell.color)
                    }
                    None => r#"<td class="grid-cell empty"></td>"#.to_string(),
                })
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!(r#"<table class="honey-grid"><tbody>{rows}</tbody></table>"#)
}

fn location_detail(loc: &PotentialLocation) -> String {
    let production = loc
        .honey_production
        .map(|v| format!("{v:.2} kg"))
        .unwrap_or_else(|| "Not predicted yet".to_string());
    let kinds: String = [ResourceKind::Water, ResourceKind::Flowering, ResourceKind::Feeding]
        .iter()
        .map(|k| format!(r#"<option value="{}">{}</option>"#, k.as_str(), k.label()))
        .collect();

    format!(r#"
            <table class="table detail-table">
                <tr><th>Location</th><td>#{id}</td></tr>
                <tr><th>Coordinates</th><td>{lat:.5}, {lng:.5}</td></tr>
                <tr><th>Temperature</th><td>{temp:.1} °C</td></tr>
                <tr><th>Humidity</th><td>{hum:.1} %</td></tr>
                <tr><th>Sunlight Exposure</th><td>{sun:.1}</td></tr>
                <tr><th>Wind Speed</th><td>{wind:.1} m/s</td></tr>
                <tr><th>Distance to Water</th><td>{water:.2} km</td></tr>
                <tr><th>Distance to Flowers</th><td>{flower:.2} km</td></tr>
                <tr><th>Distance to Feeding Station</th><td>{feed:.2} km</td></tr>
                <tr><th>Honey Production</th><td>{production}</td></tr>
            </table>
            <form method="POST" action="{BASE}/{id}/clear" class="inline-form">
                <button type="submit" class="btn btn-outline btn-sm">Clear Prediction</button>
            </form>
            <form method="POST" action="{BASE}/resources" class="inline-form">
                <input type="hidden" name="lat" value="{lat}">
                <input type="hidden" name="lng" value="{lng}">
                <input type="hidden" name="cell" value="{id}">
                <select name="kind" class="form-select">{kinds}</select>
                <button type="submit" class="btn btn-primary btn-sm">Add Resource Here</button>
            </form>"#,
        id = loc.id,
        lat = loc.lat,
        lng = loc.lng,
        temp = loc.temperature,
        hum = loc.humidity,
        sun = loc.sunlight_exposure,
        wind = loc.wind_speed,
        water = loc.dist_to_water_source,
        flower = loc.dist_to_flowering_area,
        feed = loc.dist_to_feeding_station,
    )
}

fn hives_table(hives: &[Hive]) -> String {
    if hives.is_empty() {
        return r#"<p class="text-muted">No hives registered.</p>"#.to_string();
    }
    let rows: String = hives
        .iter()
        .map(|h| format!("<tr><td>{}</td><td>{}</td><td>{:.5}</td><td>{:.5}</td></tr>", h.id, escape(&h.name), h.location_lat, h.location_lng))
        .collect();
    format!(r#"<table class="table"><thead><tr><th>ID</th><th>Name</th><th>Latitude</th><th>Longitude</th></tr></thead><tbody>{rows}</tbody></table>"#)
}

fn resources_table(resources: &[Resource]) -> String {
    if resources.is_empty() {
        return r#"<p class="text-muted">No resources recorded.</p>"#.to_string();
    }
    let rows: String = resources
        .iter()
        .map(|r| format!("<tr><td>{}</td><td>{}</td><td>{:.5}</td><td>{:.5}</td></tr>", r.id, r.kind.label(), r.lat, r.lng))
        .collect();
    format!(r#"<table class="table"><thead><tr><th>ID</th><th>Type</th><th>Latitude</th><th>Longitude</th></tr></thead><tbody>{rows}</tbody></table>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: i64, lat: f64, lng: f64, honey: Option<f64>) -> PotentialLocation {
        PotentialLocation {
            id, lat, lng,
            temperature: 25.0, humidity: 60.0, sunlight_exposure: 7.0, wind_speed: 2.0,
            dist_to_water_source: 0.5, dist_to_flowering_area: 1.0, dist_to_feeding_station: 2.0,
            honey_production: honey,
        }
    }

    #[test]
    fn test_detail_shows_not_predicted() {
        let html = location_detail(&loc(7, 6.9, 79.8, None));
        assert!(html.contains("Not predicted yet"));
        assert!(html.contains("/NewHivePlacement/7/clear"));
    }

    #[test]
    fn test_grid_table_marks_selected_cell() {
        let grid = HoneyGrid::build(vec![loc(1, 7.0, 80.0, Some(10.0)), loc(2, 6.9, 80.1, Some(2.0))]);
        let html = grid_table(&grid, Some(2));
        assert!(html.contains(r#"class="grid-cell selected" style="background:red""#));
        assert!(html.contains(r#"style="background:green""#));
        assert_eq!(html.matches("grid-cell empty").count(), 2);
    }

    #[test]
    fn test_empty_grid_message() {
        assert!(grid_table(&HoneyGrid::default(), None).contains("No candidate locations yet"));
    }
}
