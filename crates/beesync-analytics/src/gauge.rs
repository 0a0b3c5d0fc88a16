//! Semicircular gauge geometry for live sensor readings.

use beesync_common::entities::SensorReadings;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeSpec {
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub color: &'static str,
}

pub const TEMPERATURE: GaugeSpec = GaugeSpec { label: "Internal Temperature", unit: "°C", min: 0.0, max: 50.0,  color: "#ef4444" };
pub const HUMIDITY:    GaugeSpec = GaugeSpec { label: "Internal Humidity",    unit: "%",  min: 0.0, max: 100.0, color: "#10b981" };
pub const SOUND:       GaugeSpec = GaugeSpec { label: "Sound Level",          unit: "dB", min: 0.0, max: 120.0, color: "#8b5cf6" };
pub const WEIGHT:      GaugeSpec = GaugeSpec { label: "Hive Weight",          unit: "kg", min: 0.0, max: 100.0, color: "#f59e0b" };

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub spec: GaugeSpec,
    pub value: Option<f64>,
    /// Fill in [0, 100].
    pub percentage: f64,
    /// Needle angle in degrees, -90 (min) to 90 (max).
    pub rotation: f64,
}

impl Gauge {
    pub fn new(spec: GaugeSpec, value: Option<f64>) -> Self {
        let percentage = value.map(|v| percentage(v, spec.min, spec.max)).unwrap_or(0.0);
        Self { spec, value, percentage, rotation: rotation(percentage) }
    }

    /// Display text, e.g. `34.5°C`, or `N/A` with no reading.
    pub fn display(&self) -> String {
        match self.value {
            Some(v) => format!("{:.1}{}", v, self.spec.unit),
            None => "N/A".to_string(),
        }
    }
}

pub fn percentage(value: f64, min: f64, max: f64) -> f64 {
    if max <= min || !value.is_finite() {
        return 0.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

pub fn rotation(percentage: f64) -> f64 {
    percentage / 100.0 * 180.0 - 90.0
}

/// The four dashboard gauges, in display order.
pub fn sensor_gauges(sensors: Option<&SensorReadings>) -> Vec<Gauge> {
    let s = sensors.cloned().unwrap_or_default();
    vec![
        Gauge::new(TEMPERATURE, s.temperature),
        Gauge::new(HUMIDITY, s.humidity),
        Gauge::new(SOUND, s.sound),
        Gauge::new(WEIGHT, s.weight),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_clamps() {
        assert_eq!(percentage(25.0, 0.0, 50.0), 50.0);
        assert_eq!(percentage(-5.0, 0.0, 50.0), 0.0);
        assert_eq!(percentage(80.0, 0.0, 50.0), 100.0);
        assert_eq!(percentage(1.0, 5.0, 5.0), 0.0);
    }

    #[test]
    fn test_rotation_endpoints() {
        assert_eq!(rotation(0.0), -90.0);
        assert_eq!(rotation(50.0), 0.0);
        assert_eq!(rotation(100.0), 90.0);
    }

    #[test]
    fn test_missing_value_rests_at_min() {
        let g = Gauge::new(SOUND, None);
        assert_eq!(g.percentage, 0.0);
        assert_eq!(g.rotation, -90.0);
        assert_eq!(g.display(), "N/A");
    }

    #[test]
    fn test_sensor_gauges_order() {
        let sensors = SensorReadings { temperature: Some(35.0), humidity: Some(60.0), sound: None, weight: Some(42.0) };
        let gauges = sensor_gauges(Some(&sensors));
        let labels: Vec<_> = gauges.iter().map(|g| g.spec.label).collect();
        assert_eq!(labels, vec!["Internal Temperature", "Internal Humidity", "Sound Level", "Hive Weight"]);
        assert_eq!(gauges[0].percentage, 70.0);
        assert_eq!(gauges[0].display(), "35.0°C");
    }
}
