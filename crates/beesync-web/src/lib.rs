//! beesync-web: web front end for BeeSync hive monitoring.
//! Serves server-rendered pages for:
//!   - Hive management and the live sensor dashboard
//!   - Hive placement grid over candidate locations
//!   - Threat detection, alert history and notifications
//!   - Image-based health identification
//!   - Landing, packages, registration and contact

pub mod router;
pub mod handlers;
pub mod state;
pub mod sse;
pub mod poller;
pub mod gate;
