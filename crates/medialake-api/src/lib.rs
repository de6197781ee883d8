//! HTTP surface of the media lake
//!
//! Axum handlers over the service layer, plus application wiring: state,
//! error-to-response conversion, telemetry, and startup.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
