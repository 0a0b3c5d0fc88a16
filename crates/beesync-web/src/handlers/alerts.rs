//! Alerts page: all threat alerts with distribution and trend charts.

use axum::{
    extract::{Query, State},
    response::Html,
};
use beesync_analytics::threats::{distribution, paginate, probability_trend, ALERTS_PER_PAGE};
use beesync_common::entities::NO_THREAT;
use serde::Deserialize;
use serde_json::json;

use crate::handlers::layout::{app_page, json_for_script};
use crate::handlers::threats::alerts_table;
use crate::poller::refresh_alerts;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    pub page: Option<usize>,
}

pub async fn alerts_page(State(state): State<SharedState>, Query(q): Query<AlertsQuery>) -> Html<String> {
    refresh_alerts(&state).await;
    let alerts = state.alerts.read().await.clone();

    let page = paginate(&alerts, q.page.unwrap_or(1), ALERTS_PER_PAGE);
    let threats = alerts.iter().filter(|a| a.threat_type != NO_THREAT).count();
    let latest = alerts
        .first()
        .map(|a| beesync_analytics::threats::display_name(&a.threat_type))
        .unwrap_or_else(|| "—".to_string());

    let prev = if page.has_prev() {
        format!(r#"<a href="/alerts?page={}" class="btn btn-outline btn-sm">← Previous</a>"#, page.current - 1)
    } else {
        r#"<span class="btn btn-outline btn-sm disabled">← Previous</span>"#.to_string()
    };
    let next = if page.has_next() {
        format!(r#"<a href="/alerts?page={}" class="btn btn-outline btn-sm">Next →</a>"#, page.current + 1)
    } else {
        r#"<span class="btn btn-outline btn-sm disabled">Next →</span>"#.to_string()
    };

    let chart_data = json!({
        "distribution": distribution(&alerts),
        "trend": probability_trend(&alerts),
    });

    let body = format!(r#"
    <div class="page-header" data-live="alerts_updated">
        <div>
            <h1 class="page-title">🚨 Threat Alerts</h1>
            <p class="text-muted">Every alert raised by the threat classifier</p>
        </div>
    </div>

    <div class="stats-grid">
        <div class="stat-card"><div class="stat-value">{total}</div><div class="stat-label">Total Alerts</div></div>
        <div class="stat-card"><div class="stat-value">{threats}</div><div class="stat-label">Active Threats</div></div>
        <div class="stat-card"><div class="stat-value">{latest}</div><div class="stat-label">Latest</div></div>
    </div>

    <div class="chart-grid">
        <div class="card"><div class="card-header">Threat Distribution</div><canvas id="chart-distribution"></canvas></div>
        <div class="card"><div class="card-header">Probability Over Time</div><canvas id="chart-trend"></canvas></div>
    </div>

    <div class="card">
        <div class="card-header">Alert History</div>
        {table}
        <div class="pagination">
            {prev}
            <span class="text-muted">Page {current} of {pages}</span>
            {next}
        </div>
    </div>
    <script type="application/json" id="alert-charts">{charts}</script>"#,
        total = alerts.len(),
        table = alerts_table(page.items),
        current = page.current,
        pages = page.total,
        charts = json_for_script(&chart_data),
    );

    let head = r#"<script src="https://cdn.jsdelivr.net/npm/chart.js"></script>"#;
    let scripts = r#"<script>
        document.addEventListener('DOMContentLoaded', () => {
            const el = document.getElementById('alert-charts');
            if (el) BeeSync.renderAlertCharts(JSON.parse(el.textContent));
        });
    </script>"#;
    app_page(&state, "Alerts", "alerts", &body, head, scripts).await
}
