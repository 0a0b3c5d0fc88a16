//! Presentation rules for hive risk notifications.

use std::collections::HashSet;

use beesync_common::entities::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatStyle {
    pub color: &'static str,
    pub icon: &'static str,
    pub urgent: bool,
}

pub fn threat_style(threat_type: &str) -> ThreatStyle {
    match threat_type.to_lowercase().as_str() {
        "wax_moth" => ThreatStyle { color: "#FF9800", icon: "⚠️", urgent: false },
        "hornets"  => ThreatStyle { color: "#F44336", icon: "⛔", urgent: true },
        "mammals"  => ThreatStyle { color: "#2196F3", icon: "🔔", urgent: true },
        _          => ThreatStyle { color: "#9E9E9E", icon: "🔔", urgent: false },
    }
}

/// Newest first. Unparseable timestamps sort last.
pub fn sort_newest_first(list: &mut [Notification]) {
    list.sort_by(|a, b| b.issued_at().cmp(&a.issued_at()));
}

/// Drop notifications the user dismissed in this session.
pub fn visible<'a>(list: &'a [Notification], dismissed: &HashSet<i64>) -> Vec<&'a Notification> {
    list.iter().filter(|n| !dismissed.contains(&n.id)).collect()
}
