//! Hardware adapters and operator-facing pieces for the stabilizer
//!
//! Binds the serial transport, the Axis VAPIX pan/tilt camera and the
//! terminal diagnostics display to the trait seams the control loop
//! expects. The binaries live under `src/bin/`.

pub mod camera;
pub mod console;
pub mod serial;
pub mod setup;

pub use camera::{AxisCamera, CameraError};
pub use console::ConsoleRenderer;
pub use serial::{list_ports, SerialSource};
