//! Rule-based analysis shown next to a performance prediction.
//!
//! The model returns a level; these rules explain it from the latest sensor
//! snapshot and the loaded history, and turn each out-of-band metric into a
//! recommendation.

use beesync_common::entities::{PerformanceLevel, PerformancePrediction, SynchronizedReading};
use serde::Serialize;

pub const BROOD_TEMP_MIN: f64 = 32.0;
pub const BROOD_TEMP_MAX: f64 = 36.0;
pub const THERMOREGULATION_DIFF: f64 = 5.0;
pub const HUMIDITY_MIN: f64 = 50.0;
pub const HUMIDITY_MAX: f64 = 70.0;
pub const SOUND_MIN: f64 = 40.0;
pub const SOUND_MAX: f64 = 80.0;
pub const WEIGHT_TREND_KG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Good,
    Warning,
    Concern,
    Unknown,
}

impl FindingStatus {
    pub fn css_class(&self) -> &'static str {
        match self {
            FindingStatus::Good    => "finding-good",
            FindingStatus::Warning => "finding-warning",
            FindingStatus::Concern => "finding-concern",
            FindingStatus::Unknown => "finding-unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub metric: &'static str,
    pub status: FindingStatus,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceAnalysis {
    pub level: Option<PerformanceLevel>,
    pub predicted_level: Option<u8>,
    pub interpretation: String,
    pub risk_assessment: String,
    pub confidence_pct: Option<f64>,
    pub color: &'static str,
    /// `(level, probability %)` sorted by level.
    pub probabilities: Vec<(String, f64)>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

const UNKNOWN_COLOR: &str = "gray";

/// Combine the model output with the rule-based findings.
pub fn analyze(
    prediction: Option<&PerformancePrediction>,
    latest: Option<&SynchronizedReading>,
    history: &[SynchronizedReading],
) -> PerformanceAnalysis {
    let level = prediction.and_then(|p| p.level());
    let findings = vec![
        temperature_finding(latest),
        humidity_finding(latest),
        sound_finding(latest),
        weight_finding(history),
    ];

    let mut recommendations: Vec<String> = findings.iter().filter_map(recommendation_for).collect();
    if matches!(level, Some(PerformanceLevel::Poor | PerformanceLevel::Critical)) {
        recommendations.insert(0, "Schedule a full colony inspection within 48 hours.".to_string());
    }
    if recommendations.is_empty() && level.is_some() {
        recommendations.push("Colony conditions are within normal ranges. Keep the regular inspection schedule.".to_string());
    }

    PerformanceAnalysis {
        level,
        predicted_level: prediction.map(|p| p.predicted_level),
        interpretation: prediction
            .map(|p| p.interpretation.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        risk_assessment: prediction.map(|p| p.risk_assessment.clone()).unwrap_or_default(),
        confidence_pct: prediction.map(|p| p.confidence * 100.0),
        color: level.map(|l| l.color()).unwrap_or(UNKNOWN_COLOR),
        probabilities: prediction
            .map(|p| p.all_probabilities.iter().map(|(k, v)| (k.clone(), v * 100.0)).collect())
            .unwrap_or_default(),
        findings,
        recommendations,
    }
}

fn unknown(metric: &'static str) -> Finding {
    Finding { metric, status: FindingStatus::Unknown, detail: "No reading available".to_string() }
}

fn temperature_finding(latest: Option<&SynchronizedReading>) -> Finding {
    const METRIC: &str = "Temperature";
    let Some(internal) = latest.and_then(|r| r.sensors.temperature) else {
        return unknown(METRIC);
    };
    let external = latest.and_then(|r| r.weather.temperature);

    if !(BROOD_TEMP_MIN..=BROOD_TEMP_MAX).contains(&internal) {
        let side = if internal < BROOD_TEMP_MIN { "below" } else { "above" };
        return Finding {
            metric: METRIC,
            status: FindingStatus::Concern,
            detail: format!(
                "Internal {internal:.1}°C is {side} the {BROOD_TEMP_MIN:.0}-{BROOD_TEMP_MAX:.0}°C brood range"
            ),
        };
    }

    match external {
        Some(ext) if (internal - ext).abs() > THERMOREGULATION_DIFF => Finding {
            metric: METRIC,
            status: FindingStatus::Good,
            detail: format!(
                "Internal {internal:.1}°C vs external {ext:.1}°C shows good thermoregulation"
            ),
        },
        Some(ext) => Finding {
            metric: METRIC,
            status: FindingStatus::Warning,
            detail: format!(
                "Internal {internal:.1}°C tracks external {ext:.1}°C closely; weak thermoregulation"
            ),
        },
        None => Finding {
            metric: METRIC,
            status: FindingStatus::Good,
            detail: format!("Internal {internal:.1}°C is within the brood range"),
        },
    }
}

fn humidity_finding(latest: Option<&SynchronizedReading>) -> Finding {
    const METRIC: &str = "Humidity";
    match latest.and_then(|r| r.sensors.humidity) {
        None => unknown(METRIC),
        Some(h) if (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&h) => Finding {
            metric: METRIC,
            status: FindingStatus::Good,
            detail: format!("{h:.1}% is within {HUMIDITY_MIN:.0}-{HUMIDITY_MAX:.0}%"),
        },
        Some(h) => Finding {
            metric: METRIC,
            status: FindingStatus::Warning,
            detail: format!(
                "{h:.1}% is {} the {HUMIDITY_MIN:.0}-{HUMIDITY_MAX:.0}% band",
                if h < HUMIDITY_MIN { "below" } else { "above" }
            ),
        },
    }
}

fn sound_finding(latest: Option<&SynchronizedReading>) -> Finding {
    const METRIC: &str = "Sound";
    match latest.and_then(|r| r.sensors.sound) {
        None => unknown(METRIC),
        Some(db) if (SOUND_MIN..=SOUND_MAX).contains(&db) => Finding {
            metric: METRIC,
            status: FindingStatus::Good,
            detail: format!("{db:.1} dB is a normal activity level"),
        },
        Some(db) if db > SOUND_MAX => Finding {
            metric: METRIC,
            status: FindingStatus::Concern,
            detail: format!("{db:.1} dB suggests agitation or swarming preparation"),
        },
        Some(db) => Finding {
            metric: METRIC,
            status: FindingStatus::Warning,
            detail: format!("{db:.1} dB indicates low colony activity"),
        },
    }
}

/// Weight change across the loaded history, oldest to newest reading.
pub fn weight_trend(history: &[SynchronizedReading]) -> Option<f64> {
    let mut weighed: Vec<(&SynchronizedReading, f64)> = history
        .iter()
        .filter_map(|r| r.sensors.weight.map(|w| (r, w)))
        .collect();
    if weighed.len() < 2 {
        return None;
    }
    weighed.sort_by_key(|(r, _)| r.collected_at());
    let first = weighed.first()?.1;
    let last = weighed.last()?.1;
    Some(last - first)
}

fn weight_finding(history: &[SynchronizedReading]) -> Finding {
    const METRIC: &str = "Weight";
    match weight_trend(history) {
        None => Finding {
            metric: METRIC,
            status: FindingStatus::Unknown,
            detail: "Not enough weight readings for a trend".to_string(),
        },
        Some(delta) if delta > WEIGHT_TREND_KG => Finding {
            metric: METRIC,
            status: FindingStatus::Good,
            detail: format!("Gained {delta:.2} kg over the selected range"),
        },
        Some(delta) if delta < -WEIGHT_TREND_KG => Finding {
            metric: METRIC,
            status: FindingStatus::Concern,
            detail: format!("Lost {:.2} kg over the selected range", delta.abs()),
        },
        Some(delta) => Finding {
            metric: METRIC,
            status: FindingStatus::Good,
            detail: format!("Stable ({delta:+.2} kg) over the selected range"),
        },
    }
}

fn recommendation_for(finding: &Finding) -> Option<String> {
    let text = match (finding.metric, finding.status) {
        (_, FindingStatus::Good | FindingStatus::Unknown) => return None,
        ("Temperature", FindingStatus::Concern) => {
            "Check hive insulation and ventilation; brood temperature is out of range."
        }
        ("Temperature", _) => "Watch cluster strength; the colony is not holding its own temperature.",
        ("Humidity", _) => "Adjust ventilation to bring humidity back toward 50-70%.",
        ("Sound", FindingStatus::Concern) => "Inspect for swarming signs, queen loss or predators.",
        ("Sound", _) => "Low activity: check the queen and forager numbers.",
        ("Weight", _) => "Weight is dropping: check food stores and consider supplemental feeding.",
        _ => return None,
    };
    Some(text.to_string())
}
