//! Sidebar layout toggles. State lives in `AppState::ui` for the process only.

use axum::{
    extract::State,
    http::{header::REFERER, HeaderMap, Uri},
    response::Redirect,
};

use crate::state::SharedState;

pub async fn toggle_sidebar(State(state): State<SharedState>, headers: HeaderMap) -> Redirect {
    {
        let mut ui = state.ui.write().await;
        ui.sidebar_collapsed = !ui.sidebar_collapsed;
    }
    Redirect::to(&back_path(&headers))
}

pub async fn toggle_overlay(State(state): State<SharedState>, headers: HeaderMap) -> Redirect {
    {
        let mut ui = state.ui.write().await;
        ui.overlay_open = !ui.overlay_open;
    }
    Redirect::to(&back_path(&headers))
}

/// Path and query of the `Referer`, so a redirect never leaves the site.
fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_string()))
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| "/dashboard".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_back_path_strips_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("http://localhost:3000/alerts?page=2"));
        assert_eq!(back_path(&headers), "/alerts?page=2");
    }

    #[test]
    fn test_back_path_defaults_to_dashboard() {
        assert_eq!(back_path(&HeaderMap::new()), "/dashboard");
    }
}
