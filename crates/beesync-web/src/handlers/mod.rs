//! HTTP handlers for all web routes.

pub mod layout;
pub mod landing;
pub mod hives;
pub mod dashboard;
pub mod placement;
pub mod threats;
pub mod alerts;
pub mod health;
pub mod notifications;
pub mod register;
pub mod ui;
