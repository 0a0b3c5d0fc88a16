//! Monitoring backend: hives, synchronized sensor data and performance prediction.

use std::time::Duration;

use async_trait::async_trait;
use beesync_common::entities::{
    Envelope, Hive, HiveInput, PerformanceHistoryEntry, PerformancePrediction, PerformanceRequest,
    SynchronizedReading,
};
use beesync_common::Result;
use tracing::{debug, info, instrument};

use crate::http::BackendClient;
use crate::ReadingSource;

#[derive(Debug, Clone)]
pub struct MonitoringClient {
    http: BackendClient,
    prediction_timeout: Duration,
}

impl MonitoringClient {
    pub fn new(http: BackendClient, prediction_timeout: Duration) -> Self {
        Self { http, prediction_timeout }
    }

    // ── Hives ───────────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn list_hives(&self) -> Result<Vec<Hive>> {
        let hives: Vec<Hive> = self.http.send_list(self.http.get("/api/hives"), "list hives").await?;
        debug!(count = hives.len(), "fetched hives");
        Ok(hives)
    }

    #[instrument(skip(self))]
    pub async fn create_hive(&self, input: &HiveInput) -> Result<()> {
        self.http
            .send_unit(self.http.post("/api/hives").json(input), "create hive")
            .await?;
        info!(name = %input.name, "hive created");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_hive(&self, id: i64, input: &HiveInput) -> Result<()> {
        self.http
            .send_unit(self.http.put(&format!("/api/hives/{id}")).json(input), "update hive")
            .await?;
        info!(id, "hive updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_hive(&self, id: i64) -> Result<()> {
        self.http
            .send_unit(self.http.delete(&format!("/api/hives/{id}")), "delete hive")
            .await?;
        info!(id, "hive deleted");
        Ok(())
    }

    // ── Synchronized data ───────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn latest_reading(&self, hive_id: i64) -> Result<Option<SynchronizedReading>> {
        let req = self
            .http
            .get("/api/synchronized/latest")
            .query(&[("hive_id", hive_id)]);
        let env: Envelope<SynchronizedReading> = self.http.send_json(req, "latest reading").await?;
        Ok(env.into_data())
    }

    #[instrument(skip(self))]
    pub async fn historical_readings(&self, hive_id: i64, hours: u32) -> Result<Vec<SynchronizedReading>> {
        let req = self
            .http
            .get("/api/synchronized/historical")
            .query(&[("hive_id", hive_id.to_string()), ("hours", hours.to_string())]);
        let env: Envelope<Vec<SynchronizedReading>> = self.http.send_json(req, "historical readings").await?;
        let readings = env.into_data().unwrap_or_default();
        debug!(count = readings.len(), "fetched historical readings");
        Ok(readings)
    }

    // ── Performance ─────────────────────────────────────────────────────────

    /// Runs the performance model for one hive. Uses the longer prediction
    /// timeout instead of the client default.
    #[instrument(skip(self))]
    pub async fn predict_performance(&self, hive_id: i64) -> Result<Option<PerformancePrediction>> {
        let req = self
            .http
            .post("/api/performance/predict")
            .timeout(self.prediction_timeout)
            .json(&PerformanceRequest { hive_id });
        let env: Envelope<PerformancePrediction> = self.http.send_json(req, "performance predict").await?;
        Ok(env.into_data())
    }

    #[instrument(skip(self))]
    pub async fn performance_history(&self, hive_id: i64, hours: u32) -> Result<Vec<PerformanceHistoryEntry>> {
        let req = self
            .http
            .get("/api/performance/history")
            .query(&[("hive_id", hive_id.to_string()), ("hours", hours.to_string())]);
        let env: Envelope<Vec<PerformanceHistoryEntry>> = self.http.send_json(req, "performance history").await?;
        Ok(env.into_data().unwrap_or_default())
    }
}

#[async_trait]
impl ReadingSource for MonitoringClient {
    async fn latest(&self, hive_id: i64) -> Result<Option<SynchronizedReading>> {
        self.latest_reading(hive_id).await
    }

    async fn historical(&self, hive_id: i64, hours: u32) -> Result<Vec<SynchronizedReading>> {
        self.historical_readings(hive_id, hours).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn client(server: &Server) -> MonitoringClient {
        let http = BackendClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        MonitoringClient::new(http, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_list_hives() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/hives")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 1, "name": "North", "location_lat": 6.9, "location_lng": 79.8,
                     "created_at": "2025-01-01T00:00:00"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let hives = client(&server).await.list_hives().await.unwrap();
        assert_eq!(hives.len(), 1);
        assert_eq!(hives[0].name, "North");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_uses_put_with_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/hives/7")
            .match_body(Matcher::Json(json!({"name": "East", "location_lat": 1.5, "location_lng": 2.5})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let input = HiveInput { name: "East".into(), location_lat: 1.5, location_lng: 2.5 };
        client(&server).await.update_hive(7, &input).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_historical_sends_hive_and_hours() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/synchronized/historical")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("hive_id".into(), "2".into()),
                Matcher::UrlEncoded("hours".into(), "168".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"success": true, "data": [
                    {"collection_timestamp": "2025-03-01T10:00:00", "hive_id": 2,
                     "sensors": {"temperature": 34.0}, "weather": {}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let readings = client(&server).await.historical(2, 168).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].sensors.temperature, Some(34.0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_latest_unsuccessful_envelope_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/synchronized/latest")
            .match_query(Matcher::UrlEncoded("hive_id".into(), "1".into()))
            .with_status(200)
            .with_body(json!({"success": false, "message": "no data"}).to_string())
            .create_async()
            .await;

        let latest = client(&server).await.latest(1).await.unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_predict_performance_posts_hive_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/performance/predict")
            .match_body(Matcher::Json(json!({"hive_id": 3})))
            .with_status(200)
            .with_body(
                json!({"success": true, "prediction": {
                    "predicted_level": 4, "interpretation": "Poor", "confidence": 0.71,
                    "risk_assessment": "High", "all_probabilities": {"4": 0.71}
                }})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let prediction = client(&server).await.predict_performance(3).await.unwrap().unwrap();
        assert_eq!(prediction.predicted_level, 4);
        assert_eq!(prediction.risk_assessment, "High");
        mock.assert_async().await;
    }
}
