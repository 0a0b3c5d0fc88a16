//! Threat detection: manual prediction form, model info and recent alerts.

use axum::{extract::State, response::Html, Form};
use beesync_analytics::threats::{banner, display_name, threat_icon};
use beesync_common::entities::{ThreatAlert, ThreatPrediction};
use beesync_common::validation::{validate_threat_form, ThreatForm, ValidationErrors};
use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::handlers::layout::{alert_box, app_page, escape, fmt_timestamp};
use crate::poller::refresh_recent_alerts;
use crate::state::{AppEvent, SharedState};

const FIELD_LABELS: [(&str, &str); 6] = [
    ("weather_temp_c", "Weather Temperature (°C)"),
    ("weather_humidity_pct", "Weather Humidity (%)"),
    ("hive_sound_db", "Hive Sound (dB)"),
    ("hive_sound_peak_freq", "Sound Peak Frequency (Hz)"),
    ("vibration_hz", "Vibration (Hz)"),
    ("vibration_var", "Vibration Variance"),
];

pub async fn threat_page(State(state): State<SharedState>) -> Html<String> {
    refresh_recent_alerts(&state).await;
    render(&state, &ThreatForm::default(), &ValidationErrors::default(), None).await
}

pub async fn threat_submit(State(state): State<SharedState>, Form(form): Form<ThreatForm>) -> Html<String> {
    let reading = match validate_threat_form(&form, Utc::now().to_rfc3339()) {
        Ok(reading) => reading,
        Err(errors) => return render(&state, &form, &errors, None).await,
    };

    let error = match state.clients.threat.predict(&reading).await {
        Ok(prediction) => {
            state.publish(AppEvent::ThreatDetected {
                threat_type: prediction.threat_type.clone(),
                probability: prediction.probability,
            });
            *state.last_threat.write().await = Some(prediction);
            refresh_recent_alerts(&state).await;
            None
        }
        Err(e) => {
            warn!(error = %e, "threat prediction failed");
            Some(format!("Failed to get prediction: {e}"))
        }
    };
    render(&state, &form, &ValidationErrors::default(), error.as_deref()).await
}

async fn render(state: &SharedState, form: &ThreatForm, errors: &ValidationErrors, error: Option<&str>) -> Html<String> {
    let model_info = state.clients.threat.model_info().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch threat model info");
        Value::Null
    });
    let prediction = state.last_threat.read().await.clone();
    let recent = state.recent_alerts.read().await.clone();

    let inputs: String = form
        .fields()
        .iter()
        .map(|(name, value)| {
            let label = FIELD_LABELS
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, label)| *label)
                .unwrap_or(*name);
            let msg = errors
                .get(name)
                .map(|e| format!(r#"<span class="field-error">{}</span>"#, escape(e)))
                .unwrap_or_default();
            format!(r#"
            <div class="form-group">
                <label for="{name}">{label}</label>
                <input id="{name}" name="{name}" type="number" step="any" value="{}" required>
                {msg}
            </div>"#, escape(value))
        })
        .collect();

    let body = format!(r#"
    <div class="page-header">
        <div>
            <h1 class="page-title">🛡️ Threat Detection</h1>
            <p class="text-muted">Classify hive conditions from weather, sound and vibration readings</p>
        </div>
    </div>

    <div class="threat-layout">
        <div class="card">
            <div class="card-header">Sensor Readings</div>
            {error}
            <form method="POST" action="/threat-detection" class="threat-form">
                <div class="form-grid">{inputs}</div>
                <button type="submit" class="btn btn-primary">Predict Threat</button>
            </form>
        </div>
        <div class="card">
            <div class="card-header">Prediction</div>
            {prediction}
        </div>
    </div>

    <div class="card">
        <div class="card-header">Model Information</div>
        {model}
    </div>

    <div class="card" data-live="alerts_updated">
        <div class="card-header">Recent Alerts</div>
        {alerts}
    </div>"#,
        error = alert_box("danger", error),
        prediction = prediction.as_ref().map(prediction_html).unwrap_or_else(|| {
            r#"<p class="text-muted">Submit readings to get a prediction.</p>"#.to_string()
        }),
        model = model_info_html(&model_info),
        alerts = alerts_table(&recent),
    );

    app_page(state, "Threat Detection", "threat-detection", &body, "", "").await
}

fn prediction_html(p: &ThreatPrediction) -> String {
    let class = if p.is_threat() { "alert-danger" } else { "alert-success" };
    let recommendation = p
        .recommendation
        .as_deref()
        .map(|r| format!("<p><strong>Recommendation:</strong> {}</p>", escape(r)))
        .unwrap_or_default();
    let actions = p
        .recommendations
        .as_ref()
        .map(|a| {
            let items: String = a.actions.iter().map(|x| format!("<li>{}</li>", escape(x))).collect();
            let notes = a
                .notes
                .as_deref()
                .map(|n| format!(r#"<p class="text-muted">{}</p>"#, escape(n)))
                .unwrap_or_default();
            format!(r#"
            <div class="threat-actions">
                <p><strong>Priority:</strong> <span class="badge">{}</span></p>
                <ul>{items}</ul>
                {notes}
            </div>"#, escape(&a.priority))
        })
        .unwrap_or_default();

    format!(r#"
            <div class="alert {class} threat-banner">{icon} {text}</div>
            <p><strong>Threat:</strong> {name}</p>
            <p><strong>Probability:</strong> {pct:.1}%</p>
            {recommendation}
            {actions}"#,
        icon = threat_icon(&p.threat_type),
        text = escape(&banner(p)),
        name = escape(&display_name(&p.threat_type)),
        pct = p.probability * 100.0,
    )
}

fn model_info_html(info: &Value) -> String {
    let Some(obj) = info.as_object() else {
        return r#"<p class="text-muted">Model information unavailable.</p>"#.to_string();
    };
    let rows: String = obj
        .iter()
        .map(|(key, value)| {
            let shown = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            format!("<tr><th>{}</th><td>{}</td></tr>", escape(&display_name(key)), escape(&shown))
        })
        .collect();
    format!(r#"<table class="table detail-table">{rows}</table>"#)
}

pub(crate) fn alerts_table(alerts: &[ThreatAlert]) -> String {
    if alerts.is_empty() {
        return r#"<p class="text-muted">No alerts recorded.</p>"#.to_string();
    }
    let rows: String = alerts
        .iter()
        .map(|a| format!(r#"
                <tr>
                    <td>{time}</td>
                    <td>{icon} {name}</td>
                    <td>{pct:.1}%</td>
                    <td>{rec}</td>
                </tr>"#,
            time = fmt_timestamp(&a.timestamp),
            icon = threat_icon(&a.threat_type),
            name = escape(&display_name(&a.threat_type)),
            pct = a.probability * 100.0,
            rec = escape(a.recommendation.as_deref().unwrap_or("—")),
        ))
        .collect();
    format!(r#"
        <div class="table-container">
            <table class="table">
                <thead><tr><th>Time</th><th>Threat</th><th>Probability</th><th>Recommendation</th></tr></thead>
                <tbody>{rows}</tbody>
            </table>
        </div>"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beesync_common::entities::ThreatActions;
    use serde_json::json;

    #[test]
    fn test_prediction_html_threat() {
        let p = ThreatPrediction {
            threat_type: "Wax_Moth".into(),
            probability: 0.873,
            recommendation: Some("Inspect frames".into()),
            recommendations: Some(ThreatActions {
                priority: "high".into(),
                actions: vec!["Freeze infested comb".into()],
                notes: None,
            }),
            used_features: Value::Null,
        };
        let html = prediction_html(&p);
        assert!(html.contains("ALERT: Wax_Moth (87.3%)"));
        assert!(html.contains("alert-danger"));
        assert!(html.contains("<li>Freeze infested comb</li>"));
    }

    #[test]
    fn test_model_info_table() {
        let html = model_info_html(&json!({"model_type": "RandomForest", "classes": ["Wax_Moth", "No_Threat"]}));
        assert!(html.contains("<th>model type</th><td>RandomForest</td>"));
        assert!(html.contains("Wax_Moth, No_Threat"));
        assert!(model_info_html(&Value::Null).contains("unavailable"));
    }
}
