//! Axum router: maps all URL paths to handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{
    alerts::alerts_page,
    dashboard::{api_dashboard_analyze, api_dashboard_charts, dashboard_analyze, dashboard_page},
    health::{health_page, health_submit},
    hives::{hive_create, hive_delete, hive_edit, hive_update, hives_page},
    landing::{about, contact_page, contact_submit, home},
    layout::not_found,
    notifications::{notification_dismiss, notifications_clear, notifications_page},
    placement::{
        add_resource, clear_all_predictions, clear_prediction, generate_grid, load_optimal,
        placement_page, predict_all, recalculate_distances,
    },
    register::{packages_page, register_page, register_submit},
    threats::{threat_page, threat_submit},
    ui::{toggle_overlay, toggle_sidebar},
};
use crate::sse::sse_handler;
use crate::state::SharedState;

/// Build and return the full Axum router.
pub fn build_router(state: SharedState) -> Router {
    // Oversized images must reach the handler to get a readable message.
    let upload_limit = state.config.upload.max_image_bytes.saturating_mul(2);
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        // Public pages
        .route("/",              get(home))
        .route("/about",         get(about))
        .route("/contact",       get(contact_page).post(contact_submit))
        .route("/packages",      get(packages_page))
        .route("/register-hive", get(register_page).post(register_submit))

        // App pages
        .route("/hive-management",             get(hives_page).post(hive_create))
        .route("/hive-management/{id}",        post(hive_update))
        .route("/hive-management/{id}/edit",   get(hive_edit))
        .route("/hive-management/{id}/delete", post(hive_delete))
        .route("/dashboard",         get(dashboard_page))
        .route("/dashboard/analyze", post(dashboard_analyze))
        .route("/NewHivePlacement",  get(placement_page))
        .route("/placement",         get(placement_page)) // alias
        .route("/NewHivePlacement/generate",     post(generate_grid))
        .route("/NewHivePlacement/recalculate",  post(recalculate_distances))
        .route("/NewHivePlacement/predict-all",  post(predict_all))
        .route("/NewHivePlacement/load-optimal", post(load_optimal))
        .route("/NewHivePlacement/resources",    post(add_resource))
        .route("/NewHivePlacement/clear-all",    post(clear_all_predictions))
        .route("/NewHivePlacement/{id}/clear",   post(clear_prediction))
        .route("/threat-detection",  get(threat_page).post(threat_submit))
        .route("/alerts",            get(alerts_page))
        .route(
            "/health-identification",
            get(health_page)
                .post(health_submit)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/notifications",              get(notifications_page))
        .route("/notifications/clear",        post(notifications_clear))
        .route("/notifications/{id}/dismiss", post(notification_dismiss))

        // Layout state
        .route("/ui/sidebar/toggle",  post(toggle_sidebar))
        .route("/ui/sidebar/overlay", post(toggle_overlay))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // API endpoints
        .route("/api/dashboard/charts",  get(api_dashboard_charts))
        .route("/api/dashboard/analyze", post(api_dashboard_analyze))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
