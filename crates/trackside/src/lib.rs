//! trackside - HTTP API for camera-based exercise assessment.
//!
//! A thin web layer over [`kinetics`]: frames arrive as base64 data URLs,
//! an optional remote detector turns them into landmarks, and per-session
//! rep counters and form detectors live in [`sessions`].

pub mod demo;
pub mod error;
pub mod feedback;
pub mod frame;
pub mod pose;
pub mod scorecard;
pub mod sessions;
pub mod telemetry;
pub mod web;

pub use error::ApiError;
pub use web::{app, router, AppState};
