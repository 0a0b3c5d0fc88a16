//! beesync-analytics: Pure view-model computations for the BeeSync dashboard.
//! Nothing here performs I/O; every function takes fetched snapshots and
//! returns plain data the web layer renders.

pub mod gauge;
pub mod charts;
pub mod grid;
pub mod performance;
pub mod threats;
pub mod health;
pub mod notifications;

pub use charts::{ChartData, Dataset};
pub use gauge::{Gauge, GaugeSpec};
pub use grid::HoneyGrid;
pub use performance::PerformanceAnalysis;
