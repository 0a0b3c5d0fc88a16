//! Hive risk notifications from the services backend.
//!
//! Dismissing only hides a notification for this server process; clearing
//! goes to the backend.

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
};
use beesync_analytics::notifications::{threat_style, visible};
use beesync_analytics::threats::display_name;
use beesync_common::entities::Notification;
use tracing::{info, warn};

use crate::handlers::layout::{alert_box, app_page, escape, fmt_timestamp};
use crate::poller::refresh_notifications;
use crate::state::{AppEvent, SharedState};

pub async fn notifications_page(State(state): State<SharedState>) -> Html<String> {
    refresh_notifications(&state).await;
    render(&state, None).await
}

pub async fn notification_dismiss(State(state): State<SharedState>, Path(id): Path<i64>) -> Redirect {
    state.dismissed.write().await.insert(id);
    info!(id, "notification dismissed");
    Redirect::to("/notifications")
}

pub async fn notifications_clear(State(state): State<SharedState>) -> Html<String> {
    match state.clients.services.clear_notifications().await {
        Ok(()) => {
            state.notifications.write().await.clear();
            state.dismissed.write().await.clear();
            state.publish(AppEvent::NotificationsUpdated { count: 0 });
            render(&state, None).await
        }
        Err(e) => {
            warn!(error = %e, "Failed to clear notifications");
            render(&state, Some("Failed to clear notifications.")).await
        }
    }
}

async fn render(state: &SharedState, error: Option<&str>) -> Html<String> {
    let list = state.notifications.read().await.clone();
    let dismissed = state.dismissed.read().await.clone();
    let shown = visible(&list, &dismissed);

    let items = if shown.is_empty() {
        r#"
        <div class="empty-state">
            <div class="empty-icon">🔕</div>
            <p class="text-muted">No notifications. Your hives are quiet.</p>
        </div>"#.to_string()
    } else {
        shown.iter().map(|n| notification_card(n)).collect()
    };

    let body = format!(r#"
    <div class="page-header" data-live="notifications_updated">
        <div>
            <h1 class="page-title">🔔 Notifications</h1>
            <p class="text-muted">{count} active</p>
        </div>
        <form method="POST" action="/notifications/clear" onsubmit="return confirm('Clear all notifications?');">
            <button type="submit" class="btn btn-outline">Clear All</button>
        </form>
    </div>
    {error}
    <div class="notification-list">{items}</div>"#,
        count = shown.len(),
        error = alert_box("danger", error),
    );

    app_page(state, "Notifications", "notifications", &body, "", "").await
}

fn notification_card(n: &Notification) -> String {
    let style = threat_style(&n.threat_type);
    let urgent = if style.urgent { r#"<span class="badge badge-danger">Urgent</span>"# } else { "" };
    format!(r#"
        <div class="notification-card" style="border-left: 4px solid {color};">
            <div class="notification-icon">{icon}</div>
            <div class="notification-body">
                <div class="notification-title">
                    <strong style="color: {color};">{threat}</strong> · Hive {hive} {urgent}
                </div>
                <p>{message}</p>
                <span class="text-muted">{time}</span>
            </div>
            <form method="POST" action="/notifications/{id}/dismiss">
                <button type="submit" class="btn btn-outline btn-sm" title="Dismiss">✕</button>
            </form>
        </div>"#,
        color = style.color,
        icon = style.icon,
        threat = escape(&display_name(&n.threat_type)),
        hive = n.hive_id,
        message = escape(&n.message),
        time = fmt_timestamp(&n.timestamp),
        id = n.id,
    )
}
