//! Hive placement endpoints: candidate grid, distance recalculation,
//! honey production predictions and nearby resources.

use beesync_common::entities::{NewResource, PotentialLocation, Resource};
use beesync_common::Result;
use tracing::{debug, info, instrument};

use crate::http::BackendClient;

#[derive(Debug, Clone)]
pub struct PlacementClient {
    http: BackendClient,
}

impl PlacementClient {
    pub fn new(http: BackendClient) -> Self {
        Self { http }
    }

    #[instrument(skip(self))]
    pub async fn potential_locations(&self) -> Result<Vec<PotentialLocation>> {
        let locations: Vec<PotentialLocation> = self
            .http
            .send_list(self.http.get("/api/potential-locations"), "potential locations")
            .await?;
        debug!(count = locations.len(), "fetched potential locations");
        Ok(locations)
    }

    #[instrument(skip(self))]
    pub async fn generate_grid(&self) -> Result<()> {
        self.http
            .send_unit(self.http.get("/api/potential-locations/generate-grid"), "generate grid")
            .await?;
        info!("candidate grid generated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn recalculate_distances(&self) -> Result<()> {
        self.http
            .send_unit(
                self.http.get("/api/potential-locations/recalculate-distances"),
                "recalculate distances",
            )
            .await?;
        info!("resource distances recalculated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn predict_all(&self) -> Result<()> {
        self.http
            .send_unit(self.http.get("/api/ml/predict-all"), "predict all")
            .await?;
        info!("honey production predicted for all locations");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_all_predictions(&self) -> Result<()> {
        self.http
            .send_unit(
                self.http.delete("/api/potential-locations/clear-all-predictions"),
                "clear all predictions",
            )
            .await?;
        info!("all predictions cleared");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_prediction(&self, location_id: i64) -> Result<()> {
        self.http
            .send_unit(
                self.http.delete(&format!("/api/potential-locations/{location_id}/honey-production")),
                "clear prediction",
            )
            .await?;
        info!(location_id, "prediction cleared");
        Ok(())
    }

    /// Generate, recalculate, predict. Stops at the first failing step.
    pub async fn load_optimal(&self) -> Result<()> {
        self.generate_grid().await?;
        self.recalculate_distances().await?;
        self.predict_all().await
    }

    #[instrument(skip(self))]
    pub async fn resources(&self) -> Result<Vec<Resource>> {
        self.http.send_list(self.http.get("/api/resources"), "list resources").await
    }

    #[instrument(skip(self))]
    pub async fn add_resource(&self, resource: &NewResource) -> Result<()> {
        self.http
            .send_unit(self.http.post("/api/resources").json(resource), "add resource")
            .await?;
        info!(kind = resource.kind.as_str(), lat = resource.lat, lng = resource.lng, "resource added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beesync_common::entities::ResourceKind;
    use beesync_common::BeesyncError;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client(server: &Server) -> PlacementClient {
        PlacementClient::new(BackendClient::new(&server.url(), Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_load_optimal_runs_steps_in_order() {
        let mut server = Server::new_async().await;
        let generate = server
            .mock("GET", "/api/potential-locations/generate-grid")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let recalc = server
            .mock("GET", "/api/potential-locations/recalculate-distances")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let predict = server
            .mock("GET", "/api/ml/predict-all")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        client(&server).load_optimal().await.unwrap();
        generate.assert_async().await;
        recalc.assert_async().await;
        predict.assert_async().await;
    }

    #[tokio::test]
    async fn test_load_optimal_stops_on_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/potential-locations/generate-grid")
            .with_status(500)
            .create_async()
            .await;
        let predict = server
            .mock("GET", "/api/ml/predict-all")
            .expect(0)
            .create_async()
            .await;

        let err = client(&server).load_optimal().await.unwrap_err();
        assert!(matches!(err, BeesyncError::Status { status: 500, .. }));
        predict.assert_async().await;
    }

    #[tokio::test]
    async fn test_clear_prediction_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/potential-locations/42/honey-production")
            .with_status(200)
            .create_async()
            .await;

        client(&server).clear_prediction(42).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_resource_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/resources")
            .match_body(Matcher::Json(json!({"lat": 6.91, "lng": 79.86, "type": "water"})))
            .with_status(201)
            .create_async()
            .await;

        let resource = NewResource { lat: 6.91, lng: 79.86, kind: ResourceKind::Water };
        client(&server).add_resource(&resource).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_locations_with_null_production() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/potential-locations")
            .with_status(200)
            .with_body(
                json!([
                    {"id": 1, "lat": 6.9, "lng": 79.8, "honey_production": null},
                    {"id": 2, "lat": 6.9, "lng": 79.9, "honey_production": 12.5}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let locations = client(&server).potential_locations().await.unwrap();
        assert_eq!(locations[0].honey_production, None);
        assert_eq!(locations[1].honey_production, Some(12.5));
    }
}
