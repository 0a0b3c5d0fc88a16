//! Chart.js line datasets built from historical readings.
//! Field names serialize in camelCase so the JSON can be handed to Chart.js as is.

use beesync_common::entities::{parse_timestamp, PerformanceHistoryEntry, SynchronizedReading};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
    pub border_color: String,
    pub background_color: String,
    pub fill: bool,
    pub tension: f64,
}

impl Dataset {
    fn line(label: &str, color: &str, fill_rgb: (u8, u8, u8), data: Vec<Option<f64>>) -> Self {
        let (r, g, b) = fill_rgb;
        Self {
            label: label.to_string(),
            data,
            border_color: color.to_string(),
            background_color: format!("rgba({r}, {g}, {b}, 0.1)"),
            fill: true,
            tension: 0.4,
        }
    }
}

/// Every chart on the dashboard, sharing one x axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardCharts {
    pub temperature: ChartData,
    pub humidity: ChartData,
    pub weight: ChartData,
    pub sound: ChartData,
    pub performance: ChartData,
}

/// `HH:MM` in UTC, or the raw string when it cannot be parsed.
pub fn time_label(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn sorted_readings(history: &[SynchronizedReading]) -> Vec<&SynchronizedReading> {
    let mut sorted: Vec<&SynchronizedReading> = history.iter().collect();
    sorted.sort_by_key(|r| r.collected_at());
    sorted
}

/// Sensor charts. An empty history gives empty labels and no datasets.
pub fn sensor_charts(history: &[SynchronizedReading]) -> DashboardCharts {
    if history.is_empty() {
        return DashboardCharts::default();
    }

    let sorted = sorted_readings(history);
    let labels: Vec<String> = sorted.iter().map(|r| time_label(&r.collection_timestamp)).collect();
    let series = |f: fn(&SynchronizedReading) -> Option<f64>| -> Vec<Option<f64>> {
        sorted.iter().map(|r| f(r)).collect()
    };

    DashboardCharts {
        temperature: ChartData {
            labels: labels.clone(),
            datasets: vec![
                Dataset::line("Internal Temperature", "#ef4444", (239, 68, 68), series(|r| r.sensors.temperature)),
                Dataset::line("External Temperature", "#3b82f6", (59, 130, 246), series(|r| r.weather.temperature)),
            ],
        },
        humidity: ChartData {
            labels: labels.clone(),
            datasets: vec![
                Dataset::line("Internal Humidity", "#10b981", (16, 185, 129), series(|r| r.sensors.humidity)),
                Dataset::line("External Humidity", "#8b5cf6", (139, 92, 246), series(|r| r.weather.humidity)),
            ],
        },
        weight: ChartData {
            labels: labels.clone(),
            datasets: vec![Dataset::line("Weight (kg)", "#f59e0b", (245, 158, 11), series(|r| r.sensors.weight))],
        },
        sound: ChartData {
            labels,
            datasets: vec![Dataset::line("Sound Level (dB)", "#ec4899", (236, 72, 153), series(|r| r.sensors.sound))],
        },
        performance: ChartData::default(),
    }
}

/// Performance level over time, 1 (Excellent) to 5 (Critical).
pub fn performance_chart(history: &[PerformanceHistoryEntry]) -> ChartData {
    if history.is_empty() {
        return ChartData::default();
    }
    let mut sorted: Vec<&PerformanceHistoryEntry> = history.iter().collect();
    sorted.sort_by_key(|e| parse_timestamp(&e.collection_timestamp));

    ChartData {
        labels: sorted.iter().map(|e| time_label(&e.collection_timestamp)).collect(),
        datasets: vec![Dataset::line(
            "Performance Level",
            "#6366f1",
            (99, 102, 241),
            sorted.iter().map(|e| Some(f64::from(e.prediction.predicted_level))).collect(),
        )],
    }
}

pub fn dashboard_charts(history: &[SynchronizedReading], performance: &[PerformanceHistoryEntry]) -> DashboardCharts {
    DashboardCharts {
        performance: performance_chart(performance),
        ..sensor_charts(history)
    }
}
