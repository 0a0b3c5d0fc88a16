use beesync_common::entities::BoundingBox;

pub fn disease_color(disease: &str) -> &'static str {
    match disease.to_lowercase().as_str() {
        "healthy"  => "#4CAF50",
        "varroa"   => "#ff9800",
        "wax moth" => "#f44336",
        _          => "#9E9E9E",
    }
}

/// Border color for a detection box, matched on keywords in its label.
pub fn box_color(label: &str) -> &'static str {
    if label.contains("Varroa") || label.contains("Mite") {
        "#ff9800"
    } else if label.contains("Healthy") || label.contains("healthy") {
        "#4CAF50"
    } else if label.contains("Wax") || label.contains("Moth") || label.contains("Damage") {
        "#f44336"
    } else {
        "#2196F3"
    }
}

/// Inline CSS placing a box over the preview image. Healthy boxes are drawn round.
pub fn box_style(b: &BoundingBox) -> String {
    let radius = if b.label.contains("Healthy") { "50%" } else { "0" };
    format!(
        "left: {}%; top: {}%; width: {}%; height: {}%; border: 3px solid {}; border-radius: {};",
        b.x,
        b.y,
        b.width,
        b.height,
        box_color(&b.label),
        radius
    )
}

pub fn confidence_pct(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// `2.35 MB` style size shown next to the selected file.
pub fn file_size_mb(bytes: usize) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
