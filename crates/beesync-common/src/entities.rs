//! Entity types mirroring the JSON shapes served by the monitoring and
//! services backends. BeeSync never persists them; it only holds the latest
//! fetched snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// `{success, data}` wrapper used by the synchronized-data and performance
/// endpoints. Performance responses name the payload `prediction` or
/// `history` instead of `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(alias = "prediction", alias = "history")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The payload, only when the backend flagged the call as successful.
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

// ---------------------------------------------------------------------------
// Hive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hive {
    pub id: i64,
    pub name: String,
    pub location_lat: f64,
    pub location_lng: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /api/hives` and `PUT /api/hives/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiveInput {
    pub name: String,
    pub location_lat: f64,
    pub location_lng: f64,
}

// ---------------------------------------------------------------------------
// Synchronized sensor + weather reading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorReadings {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub sound: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherReadings {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub light_intensity: Option<f64>,
    pub rainfall: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynchronizedReading {
    #[serde(default)]
    pub id: Option<i64>,
    pub collection_timestamp: String,
    pub hive_id: i64,
    #[serde(default)]
    pub sensors: SensorReadings,
    #[serde(default)]
    pub weather: WeatherReadings,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl SynchronizedReading {
    pub fn collected_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.collection_timestamp)
    }
}

// ---------------------------------------------------------------------------
// Performance prediction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    Critical,
}

impl PerformanceLevel {
    /// Levels are numbered 1 (best) to 5 (worst) by the predictor.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(PerformanceLevel::Excellent),
            2 => Some(PerformanceLevel::Good),
            3 => Some(PerformanceLevel::Moderate),
            4 => Some(PerformanceLevel::Poor),
            5 => Some(PerformanceLevel::Critical),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good      => "Good",
            PerformanceLevel::Moderate  => "Moderate",
            PerformanceLevel::Poor      => "Poor",
            PerformanceLevel::Critical  => "Critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "#22c55e",
            PerformanceLevel::Good      => "#3b82f6",
            PerformanceLevel::Moderate  => "#facc15",
            PerformanceLevel::Poor      => "#f59e42",
            PerformanceLevel::Critical  => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformancePrediction {
    pub predicted_level: u8,
    #[serde(default)]
    pub interpretation: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub risk_assessment: String,
    #[serde(default)]
    pub all_probabilities: BTreeMap<String, f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PerformancePrediction {
    pub fn level(&self) -> Option<PerformanceLevel> {
        PerformanceLevel::from_level(self.predicted_level)
    }
}

/// One entry of `GET /api/performance/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceHistoryEntry {
    #[serde(flatten)]
    pub prediction: PerformancePrediction,
    pub collection_timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRequest {
    pub hive_id: i64,
}

// ---------------------------------------------------------------------------
// Threats
// ---------------------------------------------------------------------------

pub const NO_THREAT: &str = "No_Threat";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatAlert {
    #[serde(default)]
    pub id: Option<i64>,
    pub threat_type: String,
    pub probability: f64,
    pub timestamp: String,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub used_features: serde_json::Value,
}

impl ThreatAlert {
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Sensor readings posted to `POST /api/threat/predict`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatReading {
    pub weather_temp_c: f64,
    pub weather_humidity_pct: f64,
    pub hive_sound_db: f64,
    pub hive_sound_peak_freq: f64,
    pub vibration_hz: f64,
    pub vibration_var: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatPrediction {
    pub threat_type: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub recommendations: Option<ThreatActions>,
    #[serde(default)]
    pub used_features: serde_json::Value,
}

/// Structured advice attached to a threat prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThreatActions {
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ThreatPrediction {
    pub fn is_threat(&self) -> bool {
        self.threat_type != NO_THREAT
    }
}

// ---------------------------------------------------------------------------
// Hive placement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialLocation {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub sunlight_exposure: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub dist_to_water_source: f64,
    #[serde(default)]
    pub dist_to_flowering_area: f64,
    #[serde(default)]
    pub dist_to_feeding_station: f64,
    #[serde(default)]
    pub honey_production: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Water,
    Flowering,
    Feeding,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Water     => "Water Source",
            ResourceKind::Flowering => "Flowering Area",
            ResourceKind::Feeding   => "Feeding Station",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "water"     => Some(ResourceKind::Water),
            "flowering" => Some(ResourceKind::Flowering),
            "feeding"   => Some(ResourceKind::Feeding),
            _           => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Water     => "water",
            ResourceKind::Flowering => "flowering",
            ResourceKind::Feeding   => "feeding",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewResource {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

// ---------------------------------------------------------------------------
// Notifications (services backend)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub hive_id: i64,
    pub threat_type: String,
    pub message: String,
    pub timestamp: String,
}

impl Notification {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Health identification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeeDetection {
    pub is_bee: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseDetection {
    pub disease: String,
    pub confidence: f64,
    #[serde(default)]
    pub recommendation: String,
}

/// Box coordinates are percentages of the displayed image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthPrediction {
    pub bee_detection: BeeDetection,
    #[serde(default)]
    pub disease_detection: Option<DiseaseDetection>,
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
}

// ---------------------------------------------------------------------------
// Packages + registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Package {
    pub title: &'static str,
    pub price: &'static str,
    pub billing: &'static str,
    pub per_hive: &'static str,
}

pub const PACKAGE_FEATURES: [&str; 5] = [
    "Cloud Dashboard",
    "Seasonal Monitoring",
    "Real-time Alerts",
    "Email/SMS Notifications",
    "Hive Locations",
];

pub const PACKAGES: [Package; 3] = [
    Package { title: "1-3 Hives",  price: "£4.99", billing: "Billed monthly, cancel anytime.", per_hive: "£1.66 per hive" },
    Package { title: "4-6 Hives",  price: "£7.99", billing: "Billed monthly, cancel anytime.", per_hive: "£1.33 per hive" },
    Package { title: "7-10 Hives", price: "£9.99", billing: "Billed monthly, cancel anytime.", per_hive: "£1.00 per hive" },
];

pub fn find_package(title: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| p.title == title)
}

/// Body of `POST /api/hive-register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub display_name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    pub company: String,
    pub country: String,
    pub package_title: String,
    pub package_price: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistrationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse the timestamp formats the backends emit: RFC 3339, naive ISO 8601
/// (Python `isoformat()`), and RFC 2822 (Flask `jsonify` of a datetime).
/// Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp("2025-03-01T10:15:00Z").unwrap();
        let b = parse_timestamp("2025-03-01T10:15:00").unwrap();
        let c = parse_timestamp("Sat, 01 Mar 2025 10:15:00 GMT").unwrap();
        let d = parse_timestamp("2025-03-01T10:15:00.123456").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.timestamp(), d.timestamp());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_envelope_aliases() {
        let env: Envelope<PerformancePrediction> = serde_json::from_str(
            r#"{"success": true, "prediction": {"predicted_level": 2, "interpretation": "Good",
                "confidence": 0.8, "risk_assessment": "Low", "all_probabilities": {"2": 0.8}}}"#,
        ).unwrap();
        let p = env.into_data().unwrap();
        assert_eq!(p.level(), Some(PerformanceLevel::Good));

        let failed: Envelope<Vec<SynchronizedReading>> =
            serde_json::from_str(r#"{"success": false, "data": []}"#).unwrap();
        assert!(failed.into_data().is_none());
    }

    #[test]
    fn test_envelope_without_payload() {
        // PerformancePrediction has no Default impl.
        let env: Envelope<PerformancePrediction> =
            serde_json::from_str(r#"{"success": true, "message": "no data"}"#).unwrap();
        assert_eq!(env.message.as_deref(), Some("no data"));
        assert!(env.into_data().is_none());
    }

    #[test]
    fn test_reading_with_null_sensors() {
        let r: SynchronizedReading = serde_json::from_str(
            r#"{"collection_timestamp": "2025-03-01T10:00:00", "hive_id": 1,
                "sensors": {"temperature": null, "humidity": 55.0, "sound": null, "weight": 40.2},
                "weather": {"temperature": 21.0}}"#,
        ).unwrap();
        assert_eq!(r.sensors.temperature, None);
        assert_eq!(r.sensors.weight, Some(40.2));
        assert_eq!(r.weather.rainfall, None);
    }

    #[test]
    fn test_resource_kind_wire_name() {
        let res = NewResource { lat: 6.9, lng: 79.8, kind: ResourceKind::Flowering };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["type"], "flowering");
    }

    #[test]
    fn test_registration_is_camel_case() {
        let reg = Registration {
            full_name: "Ada".into(), display_name: "ada".into(), phone_number: "1".into(),
            email: "a@b.co".into(), password: "secret".into(), company: String::new(),
            country: "Other".into(), package_title: "1-3 Hives".into(), package_price: "£4.99".into(),
        };
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["fullName"], "Ada");
        assert_eq!(json["packageTitle"], "1-3 Hives");
    }
}
