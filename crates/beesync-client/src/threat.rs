use async_trait::async_trait;
use beesync_common::entities::{ThreatAlert, ThreatPrediction, ThreatReading};
use beesync_common::Result;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::http::BackendClient;
use crate::AlertSource;

/// Threat classifier endpoints on the monitoring backend.
#[derive(Debug, Clone)]
pub struct ThreatClient {
    http: BackendClient,
}

impl ThreatClient {
    pub fn new(http: BackendClient) -> Self {
        Self { http }
    }

    #[instrument(skip(self))]
    pub async fn predict(&self, reading: &ThreatReading) -> Result<ThreatPrediction> {
        let prediction: ThreatPrediction = self
            .http
            .send_json(self.http.post("/api/threat/predict").json(reading), "threat predict")
            .await?;
        info!(
            threat_type = %prediction.threat_type,
            probability = prediction.probability,
            "threat prediction received"
        );
        Ok(prediction)
    }

    /// Most recent alerts first, as ordered by the backend.
    #[instrument(skip(self))]
    pub async fn recent_alerts(&self, limit: Option<usize>) -> Result<Vec<ThreatAlert>> {
        let mut req = self.http.get("/api/threat/alerts");
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        let alerts: Vec<ThreatAlert> = self.http.send_list(req, "threat alerts").await?;
        debug!(count = alerts.len(), "fetched threat alerts");
        Ok(alerts)
    }

    /// Model metadata as an opaque JSON object.
    #[instrument(skip(self))]
    pub async fn model_info(&self) -> Result<Value> {
        self.http
            .send_json(self.http.get("/api/threat/model_info"), "threat model info")
            .await
    }
}

#[async_trait]
impl AlertSource for ThreatClient {
    async fn alerts(&self, limit: Option<usize>) -> Result<Vec<ThreatAlert>> {
        self.recent_alerts(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn client(server: &Server) -> ThreatClient {
        ThreatClient::new(BackendClient::new(&server.url(), Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_alerts_with_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/threat/alerts")
            .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"id": 5, "threat_type": "Wax_Moth", "probability": 0.91,
                     "timestamp": "2025-03-01T10:00:00", "used_features": {"hive_sound_db": 61.0}}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let alerts = client(&server).alerts(Some(10)).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].threat_type, "Wax_Moth");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_posts_reading() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/threat/predict")
            .match_body(Matcher::PartialJson(json!({"hive_sound_db": 72.0, "vibration_var": 0.3})))
            .with_status(200)
            .with_body(json!({"threat_type": "No_Threat", "probability": 0.88}).to_string())
            .create_async()
            .await;

        let reading = ThreatReading {
            weather_temp_c: 24.0,
            weather_humidity_pct: 60.0,
            hive_sound_db: 72.0,
            hive_sound_peak_freq: 250.0,
            vibration_hz: 120.0,
            vibration_var: 0.3,
            timestamp: "2025-03-01T10:00:00Z".into(),
        };
        let prediction = client(&server).predict(&reading).await.unwrap();
        assert!(!prediction.is_threat());
        assert_eq!(prediction.probability, 0.88);
        mock.assert_async().await;
    }
}
