//! Stabilizer core: orientation estimation and pan/tilt correction
//!
//! Fuses a two-axis accelerometer with a three-axis gyroscope via a
//! complementary filter, transforms the resulting orientation into the
//! pan/tilt that keeps a fixed world-frame target centered, and drives the
//! whole pipeline from a single-threaded, non-blocking control loop.
//!
//! Data flow: transport bytes -> [`imu_wire`] decoder ->
//! [`fusion::OrientationEstimator`] -> [`rotation::Rotator`] ->
//! actuator command, with ring-buffered diagnostics observing every stage.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fusion;
pub mod rotation;
pub mod runner;

pub use config::{FusionConfig, LoopConfig};
pub use diagnostics::{DiagnosticsSnapshot, FreqStats, LatencyStats, RingBuffer};
pub use error::ConfigError;
pub use fusion::OrientationEstimator;
pub use rotation::{PanTilt, Rotator};
pub use runner::{ByteSource, ControlLoop, DiagnosticsSink, PanTiltActuator, Tick};
