//! Typed sensor readings decoded from the wire protocol

/// A two-axis accelerometer sample.
///
/// Raw values are in sensor counts; calibration into g happens downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccReading {
    /// Time since the previous accelerometer sample, in seconds
    pub dt: f64,
    /// Raw x-axis reading, sensor counts
    pub ax_raw: f64,
    /// Raw y-axis reading, sensor counts
    pub ay_raw: f64,
}

/// A three-axis gyroscope sample.
///
/// Raw values are in sensor counts; calibration, mounting-sign correction
/// and scaling to angular rate happen downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyroReading {
    /// Time since the previous gyroscope sample, in seconds
    pub dt: f64,
    /// Raw x-axis reading, sensor counts
    pub gx_raw: f64,
    /// Raw y-axis reading, sensor counts
    pub gy_raw: f64,
    /// Raw z-axis reading, sensor counts
    pub gz_raw: f64,
}
