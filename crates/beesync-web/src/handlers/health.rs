//! Health identification: image upload forwarded to the bee/disease classifier.

use axum::{
    extract::{Multipart, State},
    response::Html,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use beesync_analytics::health::{box_style, confidence_pct, disease_color, file_size_mb};
use beesync_client::health::failure_message;
use beesync_common::entities::HealthPrediction;
use beesync_common::validation::validate_image_upload;
use tracing::{info, warn};

use crate::handlers::layout::{alert_box, app_page, escape};
use crate::state::SharedState;

/// The uploaded image as received from the browser.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl Upload {
    fn data_url(&self) -> String {
        let ct = self.content_type.as_deref().unwrap_or("application/octet-stream");
        format!("data:{ct};base64,{}", STANDARD.encode(&self.bytes))
    }
}

pub async fn health_page(State(state): State<SharedState>) -> Html<String> {
    render(&state, None, None, None).await
}

pub async fn health_submit(State(state): State<SharedState>, multipart: Multipart) -> Html<String> {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(msg) => return render(&state, None, None, Some(&msg)).await,
    };

    let max = state.config.upload.max_image_bytes;
    if let Err(errors) = validate_image_upload(upload.content_type.as_deref(), upload.bytes.len(), max) {
        let msg = errors.get("file").unwrap_or("Invalid upload").to_string();
        return render(&state, None, None, Some(&msg)).await;
    }

    info!(file = %upload.file_name, size = upload.bytes.len(), "health image uploaded");
    let content_type = upload.content_type.clone().unwrap_or_default();
    let result = state
        .clients
        .health
        .predict(&upload.file_name, &content_type, upload.bytes.clone())
        .await;

    match result {
        Ok(prediction) => render(&state, Some(&upload), Some(&prediction), None).await,
        Err(e) => {
            warn!(error = %e, "health prediction failed");
            render(&state, Some(&upload), None, Some(&failure_message(&e))).await
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, String> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err("Please select an image first".to_string()),
            Err(e) => {
                warn!(error = %e, "malformed upload");
                return Err(format!("Upload failed: {e}"));
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| format!("Upload failed: {e}"))?;
        return Ok(Upload { file_name, content_type, bytes: bytes.to_vec() });
    }
}

async fn render(
    state: &SharedState,
    upload: Option<&Upload>,
    prediction: Option<&HealthPrediction>,
    error: Option<&str>,
) -> Html<String> {
    let max_mb = state.config.upload.max_image_bytes / (1024 * 1024);

    let preview = upload
        .map(|u| {
            let boxes: String = prediction
                .map(|p| {
                    p.bounding_boxes
                        .iter()
                        .map(|b| format!(
                            r#"<div class="bbox" style="{}"><span class="bbox-label">{}</span></div>"#,
                            box_style(b),
                            escape(&b.label)
                        ))
                        .collect()
                })
                .unwrap_or_default();
            format!(r#"
            <div class="card">
                <div class="card-header">{name} <span class="text-muted">({size})</span></div>
                <div class="preview-container">
                    <img src="{src}" alt="Uploaded image" class="preview-image">
                    {boxes}
                </div>
            </div>"#,
                name = escape(&u.file_name),
                size = file_size_mb(u.bytes.len()),
                src = u.data_url(),
            )
        })
        .unwrap_or_default();

    let results = prediction.map(results_html).unwrap_or_default();

    let body = format!(r#"
    <div class="page-header">
        <div>
            <h1 class="page-title">🔬 Health Identification</h1>
            <p class="text-muted">Upload a photo of your bees to check for disease and parasites</p>
        </div>
    </div>

    <div class="card">
        <div class="card-header">Upload Image</div>
        {error}
        <form method="POST" action="/health-identification" enctype="multipart/form-data" class="upload-form" data-max-bytes="{max_bytes}">
            <input type="file" name="file" accept="image/*" required>
            <p class="text-muted">Images only, up to {max_mb}MB.</p>
            <button type="submit" class="btn btn-primary">Analyze Image</button>
        </form>
    </div>

    <div class="health-layout">
        {preview}
        {results}
    </div>"#,
        error = alert_box("danger", error),
        max_bytes = state.config.upload.max_image_bytes,
    );

    app_page(state, "Health Identification", "health", &body, "", "").await
}

fn results_html(p: &HealthPrediction) -> String {
    let bee = &p.bee_detection;
    let (bee_icon, bee_text) = if bee.is_bee { ("🐝", "Bee detected") } else { ("❌", "No bee detected") };

    let disease = match (&p.disease_detection, bee.is_bee) {
        (Some(d), true) => format!(r#"
            <div class="result-block">
                <h3>Disease Detection</h3>
                <p class="disease-name" style="color: {color};">{name}</p>
                <p>Confidence: {conf}</p>
                <p><strong>Recommendation:</strong> {rec}</p>
            </div>"#,
            color = disease_color(&d.disease),
            name = escape(&d.disease),
            conf = confidence_pct(d.confidence),
            rec = escape(&d.recommendation),
        ),
        (_, false) => r#"<p class="text-muted">Upload a clear photo of bees for disease detection.</p>"#.to_string(),
        (None, true) => r#"<p class="text-muted">No disease result returned.</p>"#.to_string(),
    };

    format!(r#"
            <div class="card">
                <div class="card-header">Results</div>
                <div class="result-block">
                    <h3>Bee Detection</h3>
                    <p>{bee_icon} {bee_text}</p>
                    <p>Confidence: {conf}</p>
                </div>
                {disease}
            </div>"#,
        conf = confidence_pct(bee.confidence),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use beesync_common::entities::{BeeDetection, DiseaseDetection};

    #[test]
    fn test_results_show_disease_in_color() {
        let p = HealthPrediction {
            bee_detection: BeeDetection { is_bee: true, confidence: 0.95 },
            disease_detection: Some(DiseaseDetection {
                disease: "Varroa".into(),
                confidence: 0.5,
                recommendation: "Treat the colony".into(),
            }),
            bounding_boxes: vec![],
        };
        let html = results_html(&p);
        assert!(html.contains("Bee detected"));
        assert!(html.contains("color: #ff9800;"));
        assert!(html.contains("Confidence: 50.0%"));
    }

    #[test]
    fn test_no_bee_skips_disease() {
        let p = HealthPrediction {
            bee_detection: BeeDetection { is_bee: false, confidence: 0.8 },
            disease_detection: None,
            bounding_boxes: vec![],
        };
        let html = results_html(&p);
        assert!(html.contains("No bee detected"));
        assert!(!html.contains("Disease Detection"));
    }

    #[test]
    fn test_data_url() {
        let u = Upload { file_name: "a.png".into(), content_type: Some("image/png".into()), bytes: vec![1, 2, 3] };
        assert_eq!(u.data_url(), "data:image/png;base64,AQID");
    }
}
