use std::time::Duration;

use beesync_common::entities::HealthPrediction;
use beesync_common::{BeesyncError, Result};
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument};

use crate::http::BackendClient;

/// Image classifier for bee presence and disease.
#[derive(Debug, Clone)]
pub struct HealthClient {
    http: BackendClient,
    timeout: Duration,
}

impl HealthClient {
    pub fn new(http: BackendClient, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Upload one image as multipart field `file`.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn predict(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<HealthPrediction> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let req = self.http.post("/predict").timeout(self.timeout).multipart(form);
        let prediction: HealthPrediction = self.http.send_json(req, "health predict").await?;
        info!(
            is_bee = prediction.bee_detection.is_bee,
            boxes = prediction.bounding_boxes.len(),
            "health prediction received"
        );
        Ok(prediction)
    }
}

/// Message shown on the upload page when a prediction fails.
pub fn failure_message(err: &BeesyncError) -> String {
    match err {
        BeesyncError::Status { status, .. } => format!("Server error: {status}"),
        BeesyncError::Timeout(_) => "The prediction timed out. Please try again.".to_string(),
        other => other.to_string(),
    }
}
