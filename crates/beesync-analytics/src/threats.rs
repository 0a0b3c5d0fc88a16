//! Threat alert summaries: distribution, pagination and trend.

use beesync_common::entities::{ThreatAlert, ThreatPrediction, NO_THREAT};
use serde::Serialize;

use crate::charts::time_label;

pub const ALERTS_PER_PAGE: usize = 10;

const SLICE_COLORS: [&str; 4] = ["#0088FE", "#FF8042", "#00C49F", "#FFBB28"];

pub fn threat_icon(threat_type: &str) -> &'static str {
    match threat_type {
        "Wax_Moth"      => "🦋",
        "Predator"      => "🦊",
        "Environmental" => "🌡️",
        NO_THREAT       => "✅",
        _               => "⚠️",
    }
}

/// `Wax_Moth` becomes `Wax Moth`.
pub fn display_name(threat_type: &str) -> String {
    threat_type.replace('_', " ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: usize,
    pub color: &'static str,
}

/// Alert counts per threat type, in first-seen order.
pub fn distribution(alerts: &[ThreatAlert]) -> Vec<PieSlice> {
    let mut slices: Vec<PieSlice> = Vec::new();
    for alert in alerts {
        match slices.iter_mut().find(|s| s.name == alert.threat_type) {
            Some(slice) => slice.value += 1,
            None => {
                let color = SLICE_COLORS[slices.len() % SLICE_COLORS.len()];
                slices.push(PieSlice { name: alert.threat_type.clone(), value: 1, color });
            }
        }
    }
    slices
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based.
    pub current: usize,
    /// At least 1, even with no items.
    pub total: usize,
}

impl<T> Page<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }
}

/// Slice one page out of `items`. Out-of-range pages clamp to the nearest valid one.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total = items.len().div_ceil(per_page).max(1);
    let current = page.clamp(1, total);
    let start = ((current - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    Page { items: &items[start..end], current, total }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub probability: f64,
}

/// Probability per alert, in the order the backend returned them.
pub fn probability_trend(alerts: &[ThreatAlert]) -> Vec<TrendPoint> {
    alerts
        .iter()
        .map(|a| TrendPoint { label: time_label(&a.timestamp), probability: a.probability })
        .collect()
}

/// Banner line for a prediction result.
pub fn banner(prediction: &ThreatPrediction) -> String {
    let pct = prediction.probability * 100.0;
    if prediction.is_threat() {
        format!("ALERT: {} ({:.1}%)", prediction.threat_type, pct)
    } else {
        format!("No Threat (Confidence {:.1}%)", pct)
    }
}
