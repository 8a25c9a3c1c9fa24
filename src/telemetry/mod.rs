//! Telemetry simulation for a six-legged robot.
//!
//! ## Module Organization
//!
//! - `joints`: Fixed joint table and the per-segment angle rule
//! - `simulator`: Voltage/current state, random jumps and smoothing
//! - `types`: Request and snapshot wire types

pub mod joints;
pub mod simulator;
pub mod types;

pub use simulator::TelemetrySimulator;
pub use types::{Command, Request};
