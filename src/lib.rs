//! Equipment Ops - hourly operational-compliance metrics for restaurant
//! equipment telemetry.
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod jobs;
pub mod load;
pub mod pipeline;
pub mod routes;
pub mod sources;
