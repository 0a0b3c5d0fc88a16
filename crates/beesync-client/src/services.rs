//! Services backend: risk notifications and hive registration.

use async_trait::async_trait;
use beesync_common::entities::{Notification, Registration, RegistrationResponse};
use beesync_common::Result;
use tracing::{info, instrument, warn};

use crate::http::BackendClient;
use crate::NotificationSource;

#[derive(Debug, Clone)]
pub struct ServicesClient {
    http: BackendClient,
}

impl ServicesClient {
    pub fn new(http: BackendClient) -> Self {
        Self { http }
    }

    #[instrument(skip(self))]
    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.http
            .send_list(self.http.get("/api/notifications"), "list notifications")
            .await
    }

    #[instrument(skip(self))]
    pub async fn clear_notifications(&self) -> Result<()> {
        self.http
            .send_unit(self.http.post("/api/notifications/clear"), "clear notifications")
            .await?;
        info!("notifications cleared");
        Ok(())
    }

    /// Registration only counts as successful on a 2xx status with
    /// `success: true` in the body. Any other response keeps its message.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<RegistrationResponse> {
        let req = self.http.post("/api/hive-register").json(registration);
        let resp = self.http.send_raw(req, "hive register").await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let mut body: RegistrationResponse = serde_json::from_slice(&bytes).unwrap_or_default();
        if !status.is_success() {
            warn!(%status, "registration rejected");
            body.success = false;
        } else if body.success {
            info!(package = %registration.package_title, "hive registered");
        }
        Ok(body)
    }
}

#[async_trait]
impl NotificationSource for ServicesClient {
    async fn notifications(&self) -> Result<Vec<Notification>> {
        self.list_notifications().await
    }
}
