//! Scoring and hierarchical aggregation for CTAM+ hospital cybersecurity
//! self-assessments.

pub mod config;
pub mod error;
pub mod scoring;
pub mod snapshot;
pub mod telemetry;
