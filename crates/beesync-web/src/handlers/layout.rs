//! Page shell shared by every route: sidebar, top navbar and document frame.

use axum::{extract::State, http::{StatusCode, Uri}, response::Html};

use crate::state::{SharedState, UiState};

/// Navigation HTML template shared across all app pages
pub const NAV_HTML: &str = include_str!("../../templates/nav.html");

/// Sidebar markup with the layout state and active link applied.
pub fn nav_html(ui: UiState, active: &str) -> String {
    let sidebar_class = if ui.sidebar_collapsed { "collapsed" } else { "" };
    let overlay_class = if ui.overlay_open { "open" } else { "" };
    let marker = format!(r#"class="nav-item" data-nav="{active}""#);
    NAV_HTML
        .replace("__SIDEBAR_CLASS__", sidebar_class)
        .replace("__OVERLAY_CLASS__", overlay_class)
        .replace(&marker, &format!(r#"class="nav-item active" data-nav="{active}" aria-current="page""#))
}

/// One app page. `head` goes inside `<head>`, `scripts` after the body.
pub fn page(title: &str, nav: &str, body: &str, head: &str, scripts: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} — BeeSync</title>
    <link rel="stylesheet" href="/static/css/main.css?v=1.0.0">
    {head}
</head>
<body>
<div class="app-container">
{nav}
<main class="main-content">
{body}
</main>
</div>
<script src="/static/js/main.js"></script>
{scripts}
</body>
</html>"#)
}

/// Renders an app page with the current sidebar state.
pub async fn app_page(state: &SharedState, title: &str, active: &str, body: &str, head: &str, scripts: &str) -> Html<String> {
    let ui = *state.ui.read().await;
    Html(page(title, &nav_html(ui, active), body, head, scripts))
}

/// Public pages: landing navbar, no sidebar.
pub fn landing_page(title: &str, active: &str, body: &str) -> Html<String> {
    let link = |href: &str, label: &str, key: &str| {
        let class = if key == active { "nav-link active" } else { "nav-link" };
        format!(r#"<a href="{href}" class="{class}">{label}</a>"#)
    };
    Html(format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} — BeeSync</title>
    <link rel="stylesheet" href="/static/css/main.css?v=1.0.0">
</head>
<body class="landing">
<header class="landing-navbar">
    <a href="/" class="brand"><span class="brand-icon">🐝</span><span class="brand-text">BeeSync</span></a>
    <nav>{}{}{}{}</nav>
    <a href="/dashboard" class="btn btn-primary dashboard-btn">Dashboard</a>
</header>
<main class="landing-content">
{body}
</main>
<footer class="landing-footer">
    <p>© BeeSync. Smart hive monitoring for modern beekeepers.</p>
</footer>
</body>
</html>"#,
        link("/", "Home", "home"),
        link("/about", "About", "about"),
        link("/packages", "Pricing", "packages"),
        link("/contact", "Contact", "contact"),
    ))
}

/// Error banner, or nothing.
pub fn alert_box(kind: &str, message: Option<&str>) -> String {
    match message {
        Some(msg) => format!(r#"<div class="alert alert-{kind}">{}</div>"#, escape(msg)),
        None => String::new(),
    }
}

/// Minimal HTML escaping for backend-provided text.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `Option<f64>` with one decimal and a unit, or `N/A`.
pub fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    value.map(|v| format!("{v:.1}{unit}")).unwrap_or_else(|| "N/A".to_string())
}

/// Local-looking date/time for a backend timestamp; the raw text if unparseable.
pub fn fmt_timestamp(raw: &str) -> String {
    beesync_common::entities::parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| escape(raw))
}

/// JSON embedded in a `<script type="application/json">` block.
pub fn json_for_script<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

pub async fn not_found(State(state): State<SharedState>, uri: Uri) -> (StatusCode, Html<String>) {
    let body = format!(r#"
    <div class="empty-state">
        <div class="empty-icon">🐝</div>
        <h1>404 — Page not found</h1>
        <p class="text-muted">Nothing lives at <code>{}</code>.</p>
        <a href="/dashboard" class="btn btn-primary">Back to Dashboard</a>
    </div>"#, escape(uri.path()));
    (StatusCode::NOT_FOUND, app_page(&state, "Not Found", "", &body, "", "").await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_marks_active_and_collapsed() {
        let ui = UiState { sidebar_collapsed: true, overlay_open: false };
        let html = nav_html(ui, "alerts");
        assert!(html.contains(r#"class="sidebar collapsed""#));
        assert!(html.contains(r#"class="nav-item active" data-nav="alerts""#));
        assert!(!html.contains(r#"class="nav-item active" data-nav="dashboard""#));
        assert!(!html.contains("__SIDEBAR_CLASS__"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"Hive" & co</b>"#), "&lt;b&gt;&quot;Hive&quot; &amp; co&lt;/b&gt;");
    }

    #[test]
    fn test_json_for_script_breaks_closing_tags() {
        let json = json_for_script(&vec!["</script>"]);
        assert_eq!(json, r#"["<\/script>"]"#);
    }

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(21.04), "°C"), "21.0°C");
        assert_eq!(fmt_opt(None, "%"), "N/A");
    }
}
