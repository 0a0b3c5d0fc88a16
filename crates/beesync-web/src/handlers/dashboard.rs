//! Dashboard handler: live sensor gauges, weather, charts and the
//! on-demand performance analysis for one hive.

use axum::{
    extract::{Query, State},
    response::Html,
    Form, Json,
};
use beesync_analytics::charts::dashboard_charts;
use beesync_analytics::gauge::sensor_gauges;
use beesync_analytics::performance::{analyze, PerformanceAnalysis};
use beesync_analytics::Gauge;
use beesync_common::entities::{Hive, WeatherReadings};
use beesync_common::{ApiError, BeesyncError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::gate::{Endpoint, GateKey};
use crate::handlers::layout::{alert_box, app_page, escape, fmt_opt, fmt_timestamp, json_for_script};
use crate::poller::refresh_hive;
use crate::state::{AppEvent, AppState, HiveSnapshot, SharedState};

/// Selectable history windows: query key, label, hours.
pub const RANGES: [(&str, &str, u32); 3] = [
    ("24h", "Last 24 Hours", 24),
    ("1w", "Last Week", 168),
    ("1m", "Last Month", 720),
];

/// Hours for a range key. Unknown keys fall back to one day.
pub fn range_hours(range: &str) -> u32 {
    RANGES
        .iter()
        .find(|(key, _, _)| *key == range)
        .map(|(_, _, hours)| *hours)
        .unwrap_or(24)
}

fn range_key(range: Option<&str>) -> &'static str {
    let range = range.unwrap_or_default();
    RANGES
        .iter()
        .find(|(key, _, _)| *key == range)
        .map(|(key, _, _)| *key)
        .unwrap_or("24h")
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub hive_id: Option<i64>,
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    pub hive_id: i64,
    #[serde(default)]
    pub range: Option<String>,
}

enum AnalysisView {
    Idle,
    Running,
    Done(Box<PerformanceAnalysis>),
    Failed(String),
}

// ── Pages ─────────────────────────────────────────────────────────────────────

pub async fn dashboard_page(
    State(state): State<SharedState>,
    Query(q): Query<DashboardQuery>,
) -> Html<String> {
    let hive_id = q.hive_id.unwrap_or(state.config.dashboard.default_hive);
    let range = range_key(q.range.as_deref().or(Some(state.config.dashboard.default_range.as_str())));
    refresh_hive(&state, hive_id, range_hours(range)).await;

    let view = if state.gate.is_in_flight(GateKey::hive(hive_id, Endpoint::Analyze)) {
        AnalysisView::Running
    } else {
        AnalysisView::Idle
    };
    render(&state, hive_id, range, view).await
}

/// Runs one performance prediction for the hive. A second request while the
/// first is in flight is refused instead of issuing another backend call.
pub async fn dashboard_analyze(
    State(state): State<SharedState>,
    Form(form): Form<AnalyzeForm>,
) -> Html<String> {
    let range = range_key(form.range.as_deref());
    let view = match run_analysis(&state, form.hive_id, range_hours(range)).await {
        Ok(analysis) => AnalysisView::Done(Box::new(analysis)),
        Err(BeesyncError::InFlight(_)) => AnalysisView::Running,
        Err(e) => AnalysisView::Failed(analysis_failure(&e)),
    };
    render(&state, form.hive_id, range, view).await
}

// ── JSON API ──────────────────────────────────────────────────────────────────

/// Chart and gauge data for live refresh after a `readings_updated` event.
pub async fn api_dashboard_charts(
    State(state): State<SharedState>,
    Query(q): Query<DashboardQuery>,
) -> Json<Value> {
    let hive_id = q.hive_id.unwrap_or(state.config.dashboard.default_hive);
    let hours = range_hours(range_key(q.range.as_deref()));
    refresh_hive(&state, hive_id, hours).await;
    let snap = state.hive_snapshot(hive_id).await;

    Json(json!({
        "hive_id": hive_id,
        "hours": hours,
        "fetched_at": snap.fetched_at,
        "latest_timestamp": snap.latest.as_ref().map(|r| r.collection_timestamp.clone()),
        "gauges": sensor_gauges(snap.latest.as_ref().map(|r| &r.sensors)),
        "charts": dashboard_charts(snap.history_for(hours), snap.performance_for(hours)),
    }))
}

pub async fn api_dashboard_analyze(
    State(state): State<SharedState>,
    Json(form): Json<AnalyzeForm>,
) -> Result<Json<PerformanceAnalysis>, ApiError> {
    let hours = range_hours(range_key(form.range.as_deref()));
    Ok(Json(run_analysis(&state, form.hive_id, hours).await?))
}

async fn run_analysis(state: &AppState, hive_id: i64, hours: u32) -> beesync_common::Result<PerformanceAnalysis> {
    let Some(ticket) = state.gate.try_begin(GateKey::hive(hive_id, Endpoint::Analyze)) else {
        info!(hive_id, "analysis already running");
        return Err(BeesyncError::InFlight(format!("analysis for hive {hive_id}")));
    };

    let prediction = state.clients.monitoring.predict_performance(hive_id).await;
    ticket.complete();
    let prediction = prediction.map_err(|e| {
        warn!(hive_id, error = %e, "performance prediction failed");
        e
    })?;

    if !state.hive_snapshot(hive_id).await.has_window(hours) {
        refresh_hive(state, hive_id, hours).await;
    }
    let snap = state.hive_snapshot(hive_id).await;
    let analysis = analyze(prediction.as_ref(), snap.latest.as_ref(), snap.history_for(hours));
    state.publish(AppEvent::AnalysisComplete { hive_id, level: analysis.predicted_level });
    Ok(analysis)
}

fn analysis_failure(err: &BeesyncError) -> String {
    let timed_out = match err {
        BeesyncError::Timeout(_) => true,
        BeesyncError::Http(e) => e.is_timeout(),
        _ => false,
    };
    if timed_out {
        "Analysis timed out. The prediction service is taking too long to respond.".to_string()
    } else {
        format!("Analysis failed: {err}")
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

async fn render(state: &SharedState, hive_id: i64, range: &str, analysis: AnalysisView) -> Html<String> {
    let snap = state.hive_snapshot(hive_id).await;
    let hives = state.clients.monitoring.list_hives().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch hives for selector");
        Vec::new()
    });

    let hive_name = hives
        .iter()
        .find(|h| h.id == hive_id)
        .map(|h| escape(&h.name))
        .unwrap_or_else(|| format!("Hive {hive_id}"));
    let updated = snap
        .latest
        .as_ref()
        .map(|r| fmt_timestamp(&r.collection_timestamp))
        .unwrap_or_else(|| "No data yet".to_string());
    let hours = range_hours(range);
    let charts = dashboard_charts(snap.history_for(hours), snap.performance_for(hours));

    let body = format!(r#"
    <div class="page-header" data-live="readings_updated" data-hive-id="{hive_id}" data-range="{range}">
        <div>
            <h1 class="page-title">📊 {hive_name}</h1>
            <p class="text-muted">Last update: <span id="last-update">{updated}</span></p>
        </div>
        <form method="GET" action="/dashboard" class="selector-form">
            {}
            {}
            <noscript><button type="submit" class="btn btn-outline btn-sm">Show</button></noscript>
        </form>
    </div>

    <div class="gauge-grid">{}</div>

    <div class="card">
        <div class="card-header">🌤️ Weather Conditions</div>
        <div class="metric-grid">{}</div>
    </div>

    {}

    <div class="chart-grid">
        <div class="card"><div class="card-header">Internal Temperature</div><canvas id="chart-temperature"></canvas></div>
        <div class="card"><div class="card-header">Internal Humidity</div><canvas id="chart-humidity"></canvas></div>
        <div class="card"><div class="card-header">Hive Weight</div><canvas id="chart-weight"></canvas></div>
        <div class="card"><div class="card-header">Sound Level</div><canvas id="chart-sound"></canvas></div>
        <div class="card chart-wide"><div class="card-header">Performance Level</div><canvas id="chart-performance"></canvas></div>
    </div>
    <script type="application/json" id="dashboard-charts">{}</script>"#,
        hive_selector(&hives, &state.config.dashboard.hive_ids, hive_id),
        range_selector(range),
        gauges_html(&sensor_gauges(snap.latest.as_ref().map(|r| &r.sensors))),
        weather_html(snap.latest.as_ref().map(|r| &r.weather)),
        analysis_html(hive_id, range, &analysis, &snap),
        json_for_script(&charts),
    );

    let head = r#"<script src="https://cdn.jsdelivr.net/npm/chart.js"></script>"#;
    let scripts = r#"<script>
        document.addEventListener('DOMContentLoaded', () => {
            const el = document.getElementById('dashboard-charts');
            if (el) BeeSync.renderDashboardCharts(JSON.parse(el.textContent));
        });
    </script>"#;
    app_page(state, "Dashboard", "dashboard", &body, head, scripts).await
}

fn hive_selector(hives: &[Hive], configured: &[i64], selected: i64) -> String {
    let mut options: Vec<(i64, String)> = hives.iter().map(|h| (h.id, escape(&h.name))).collect();
    for id in configured.iter().chain(std::iter::once(&selected)) {
        if !options.iter().any(|(existing, _)| existing == id) {
            options.push((*id, format!("Hive {id}")));
        }
    }
    let options: String = options
        .iter()
        .map(|(id, name)| {
            let sel = if *id == selected { " selected" } else { "" };
            format!(r#"<option value="{id}"{sel}>{name}</option>"#)
        })
        .collect();
    format!(r#"<select name="hive_id" class="form-select" onchange="this.form.submit()">{options}</select>"#)
}

fn range_selector(selected: &str) -> String {
    let options: String = RANGES
        .iter()
        .map(|(key, label, _)| {
            let sel = if *key == selected { " selected" } else { "" };
            format!(r#"<option value="{key}"{sel}>{label}</option>"#)
        })
        .collect();
    format!(r#"<select name="range" class="form-select" onchange="this.form.submit()">{options}</select>"#)
}

fn gauges_html(gauges: &[Gauge]) -> String {
    gauges
        .iter()
        .enumerate()
        .map(|(i, g)| format!(r#"
        <div class="card gauge-card" data-gauge="{i}">
            <div class="gauge">
                <div class="gauge-arc" style="--gauge-color: {color}; --gauge-pct: {pct:.1};"></div>
                <div class="gauge-needle" style="transform: rotate({rot:.1}deg);"></div>
            </div>
            <div class="gauge-value">{value}</div>
            <div class="gauge-label">{label}</div>
            <div class="gauge-range text-muted">{min}–{max} {unit}</div>
        </div>"#,
            color = g.spec.color,
            pct = g.percentage,
            rot = g.rotation,
            value = g.display(),
            label = g.spec.label,
            min = g.spec.min,
            max = g.spec.max,
            unit = g.spec.unit,
        ))
        .collect()
}

fn weather_html(weather: Option<&WeatherReadings>) -> String {
    let w = weather.cloned().unwrap_or_default();
    [
        ("🌡️", "Temperature", fmt_opt(w.temperature, "°C")),
        ("💧", "Humidity", fmt_opt(w.humidity, "%")),
        ("🌬️", "Wind Speed", fmt_opt(w.wind_speed, " m/s")),
        ("☀️", "Light Intensity", fmt_opt(w.light_intensity, " lux")),
        ("🌧️", "Rainfall", fmt_opt(w.rainfall, " mm")),
    ]
    .iter()
    .map(|(icon, label, value)| format!(r#"
            <div class="metric-card">
                <div class="metric-icon">{icon}</div>
                <div class="metric-value">{value}</div>
                <div class="metric-label">{label}</div>
            </div>"#))
    .collect()
}

fn analysis_html(hive_id: i64, range: &str, view: &AnalysisView, snap: &HiveSnapshot) -> String {
    let running = matches!(view, AnalysisView::Running);
    let (disabled, label) = if running { (" disabled", "Analyzing…") } else { ("", "Analyze Hive Performance") };
    let button = format!(r#"
        <form method="POST" action="/dashboard/analyze" class="analyze-form">
            <input type="hidden" name="hive_id" value="{hive_id}">
            <input type="hidden" name="range" value="{range}">
            <button type="submit" class="btn btn-primary" id="analyze-btn"{disabled}>{label}</button>
        </form>"#);

    let content = match view {
        AnalysisView::Idle => {
            let hint = if snap.latest.is_none() {
                "No sensor data loaded for this hive yet. The analysis will rely on the prediction alone."
            } else {
                "Run the performance model against the latest readings."
            };
            format!(r#"<p class="text-muted">{hint}</p>"#)
        }
        AnalysisView::Running => alert_box("info", Some("Analysis already running for this hive. Results will appear when it finishes.")),
        AnalysisView::Failed(msg) => alert_box("danger", Some(msg)),
        AnalysisView::Done(analysis) => analysis_result_html(analysis),
    };

    format!(r#"
    <div class="card analysis-card">
        <div class="card-header">🧠 Performance Analysis</div>
        {button}
        {content}
    </div>"#)
}

fn analysis_result_html(a: &PerformanceAnalysis) -> String {
    let level = a
        .level
        .map(|l| l.label().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let confidence = a
        .confidence_pct
        .map(|c| format!("{c:.1}%"))
        .unwrap_or_else(|| "N/A".to_string());

    let probabilities: String = a
        .probabilities
        .iter()
        .map(|(name, p)| format!(r#"
            <div class="prob-row">
                <span class="prob-label">Level {}</span>
                <div class="progress-track"><div class="progress-bar" style="width:{p:.1}%"></div></div>
                <span class="prob-value">{p:.1}%</span>
            </div>"#, escape(name)))
        .collect();

    let findings: String = a
        .findings
        .iter()
        .map(|f| format!(r#"
            <li class="finding {}"><strong>{}:</strong> {}</li>"#, f.status.css_class(), f.metric, escape(&f.detail)))
        .collect();

    let recommendations: String = a
        .recommendations
        .iter()
        .map(|r| format!("<li>{}</li>", escape(r)))
        .collect();

    format!(r#"
        <div class="analysis-result">
            <div class="level-badge" style="background: {color};">
                <span class="level-name">{level}</span>
                <span class="level-confidence">Confidence {confidence}</span>
            </div>
            <p><strong>Interpretation:</strong> {interpretation}</p>
            <p><strong>Risk:</strong> {risk}</p>
            <div class="probabilities">{probabilities}</div>
            <h3>Findings</h3>
            <ul class="findings">{findings}</ul>
            <h3>Recommendations</h3>
            <ul class="recommendations">{recommendations}</ul>
        </div>"#,
        color = a.color,
        interpretation = escape(&a.interpretation),
        risk = escape(&a.risk_assessment),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_hours() {
        assert_eq!(range_hours("24h"), 24);
        assert_eq!(range_hours("1w"), 168);
        assert_eq!(range_hours("1m"), 720);
        assert_eq!(range_hours("5y"), 24);
    }

    #[test]
    fn test_range_key_falls_back() {
        assert_eq!(range_key(Some("1w")), "1w");
        assert_eq!(range_key(Some("bogus")), "24h");
        assert_eq!(range_key(None), "24h");
    }

    #[test]
    fn test_hive_selector_includes_configured_ids() {
        let html = hive_selector(&[], &[1, 2], 2);
        assert!(html.contains(r#"<option value="1">Hive 1</option>"#));
        assert!(html.contains(r#"<option value="2" selected>Hive 2</option>"#));
    }

    #[test]
    fn test_running_analysis_disables_button() {
        let html = analysis_html(1, "24h", &AnalysisView::Running, &HiveSnapshot::default());
        assert!(html.contains("disabled"));
        assert!(html.contains("Analyzing…"));
    }
}
