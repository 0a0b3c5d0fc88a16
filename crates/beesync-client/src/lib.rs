//! beesync-client: HTTP clients for the BeeSync backend services.
//!
//! Two backends are involved:
//!   monitoring (default :5000): hives, synchronized data, performance,
//!                               potential locations, ML jobs, threats, health
//!   services   (default :5001): notifications, registration

pub mod http;
pub mod monitoring;
pub mod placement;
pub mod threat;
pub mod health;
pub mod services;

use async_trait::async_trait;
use beesync_common::entities::{Notification, SynchronizedReading, ThreatAlert};
use beesync_common::Result;
use beesync_config::BackendConfig;

pub use health::HealthClient;
pub use http::BackendClient;
pub use monitoring::MonitoringClient;
pub use placement::PlacementClient;
pub use services::ServicesClient;
pub use threat::ThreatClient;

/// Source of synchronized readings, polled by the dashboard.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn latest(&self, hive_id: i64) -> Result<Option<SynchronizedReading>>;

    async fn historical(&self, hive_id: i64, hours: u32) -> Result<Vec<SynchronizedReading>>;
}

/// Source of threat alerts, polled by the alerts and threat-detection pages.
#[async_trait]
pub trait AlertSource: Send + Sync {
    async fn alerts(&self, limit: Option<usize>) -> Result<Vec<ThreatAlert>>;
}

/// Source of hive risk notifications.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn notifications(&self) -> Result<Vec<Notification>>;
}

/// One client per backend concern, all built from the same config section.
#[derive(Debug, Clone)]
pub struct BackendClients {
    pub monitoring: MonitoringClient,
    pub placement: PlacementClient,
    pub threat: ThreatClient,
    pub health: HealthClient,
    pub services: ServicesClient,
}

impl BackendClients {
    pub fn from_config(cfg: &BackendConfig) -> Result<Self> {
        let monitoring = BackendClient::new(&cfg.monitoring_url, cfg.request_timeout())?;
        let services = BackendClient::new(&cfg.services_url, cfg.request_timeout())?;
        Ok(Self {
            monitoring: MonitoringClient::new(monitoring.clone(), cfg.prediction_timeout()),
            placement: PlacementClient::new(monitoring.clone()),
            threat: ThreatClient::new(monitoring.clone()),
            health: HealthClient::new(monitoring, cfg.prediction_timeout()),
            services: ServicesClient::new(services),
        })
    }
}
