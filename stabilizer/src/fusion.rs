//! Complementary-filter orientation estimation
//!
//! The gyroscope is integrated for the short-term estimate; the
//! accelerometer-derived tilt is blended in through a very low cutoff to
//! bleed off long-term drift. Roll and pitch are defined relative to the
//! current yaw heading, so each gyro update first rotates the existing
//! roll/pitch pair by the yaw increment before integrating.

use nalgebra::{Vector2, Vector3};

use imu_wire::{AccReading, GyroReading, Record};

use crate::config::FusionConfig;
use crate::diagnostics::{FreqStats, RingBuffer};

/// Smoothing factor of a discretized first-order RC low-pass filter.
///
/// Per-sample weight of an exponential moving average with cutoff
/// `cutoff_hz` at sample interval `dt`.
pub fn lp_smoothing_factor(cutoff_hz: f64, dt: f64) -> f64 {
    1.0 / (1.0 + 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz * dt))
}

/// Running 3-axis orientation estimate fed by decoded sensor records.
///
/// State is mutated only by [`process`](Self::process). Yaw accumulates
/// without wraparound; only the accelerometer-corrected roll/pitch are
/// drift-free.
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    config: FusionConfig,
    /// Low-pass filtered accelerometer state, each component in [-1, 1] g
    filtered_acc: Vector2<f64>,
    /// Orientation estimate (roll, pitch, yaw), radians
    angles: Vector3<f64>,
    acc_freq: RingBuffer<f64>,
    gyro_freq: RingBuffer<f64>,
}

impl OrientationEstimator {
    /// Create an estimator with frequency windows of `buffer_len` samples.
    pub fn new(config: FusionConfig, buffer_len: usize) -> Self {
        Self {
            config,
            filtered_acc: Vector2::zeros(),
            angles: Vector3::zeros(),
            acc_freq: RingBuffer::new(buffer_len, 0.0),
            gyro_freq: RingBuffer::new(buffer_len, 0.0),
        }
    }

    /// Fold one decoded record into the estimate.
    ///
    /// Warnings never mutate state; the caller records them. Records with a
    /// non-positive delta time are dropped rather than poisoning the state
    /// with infinities.
    pub fn process(&mut self, record: &Record) {
        match record {
            Record::Acc(reading) if reading.dt > 0.0 => self.process_acc(reading),
            Record::Gyro(reading) if reading.dt > 0.0 => self.process_gyro(reading),
            Record::Acc(_) | Record::Gyro(_) => {
                log::debug!("dropping record with non-positive dt");
            }
            Record::Warning(_) => {}
        }
    }

    fn process_acc(&mut self, reading: &AccReading) {
        let c = &self.config;
        let dt = reading.dt;
        self.acc_freq.push(1.0 / dt);

        let sf_lp = lp_smoothing_factor(c.acc_cutoff_hz, dt);

        // Normalize to g and clamp, then low-pass, independently per axis
        let raw = [reading.ax_raw, reading.ay_raw];
        for i in 0..2 {
            let norm = ((raw[i] - c.acc_cal[i]) / c.acc_g[i]).clamp(-1.0, 1.0);
            self.filtered_acc[i] = sf_lp * norm + (1.0 - sf_lp) * self.filtered_acc[i];
        }

        // Per-axis tilt, assuming total sensed acceleration is exactly 1 g
        let mut tilt = [0.0; 2];
        for i in 0..2 {
            let other = self.filtered_acc[1 - i];
            let denom = (1.0 - other * other).sqrt().max(1.0);
            tilt[i] = (self.filtered_acc[i] / denom).asin();
        }

        // Roll comes from the y-axis tilt, pitch from the negated x-axis
        // tilt; the accelerometer carries no yaw information.
        let acc_fusion_angle = Vector3::new(tilt[1], -tilt[0], self.angles[2]);

        // Slow correction term of the complementary filter
        let sf_f = lp_smoothing_factor(c.fusion_cutoff_hz, dt);
        self.angles = acc_fusion_angle * sf_f + self.angles * (1.0 - sf_f);
    }

    fn process_gyro(&mut self, reading: &GyroReading) {
        let c = &self.config;
        let dt = reading.dt;
        self.gyro_freq.push(1.0 / dt);

        let raw = [reading.gx_raw, reading.gy_raw, reading.gz_raw];
        let delta = Vector3::from_fn(|i, _| {
            let calibrated = (raw[i] - c.gyro_cal[i]) * c.gyro_signs[i];
            (calibrated * c.gyro_to_dps).to_radians() * dt
        });

        // Roll/pitch are defined relative to the yaw heading, which is
        // itself changing: rotate the pre-integration pair by the yaw
        // increment first. The ordering is significant.
        let (sin_dz, cos_dz) = delta[2].sin_cos();
        let old = self.angles;
        self.angles[0] = old[0] * cos_dz - old[1] * sin_dz;
        self.angles[1] = old[0] * sin_dz + old[1] * cos_dz;

        self.angles += delta;
    }

    /// Current orientation estimate (roll, pitch, yaw), radians.
    pub fn angles(&self) -> Vector3<f64> {
        self.angles
    }

    /// Current orientation estimate in degrees, for display.
    pub fn angles_deg(&self) -> [f64; 3] {
        [
            self.angles[0].to_degrees(),
            self.angles[1].to_degrees(),
            self.angles[2].to_degrees(),
        ]
    }

    /// Low-pass filtered accelerometer state, in g.
    pub fn filtered_acc(&self) -> Vector2<f64> {
        self.filtered_acc
    }

    /// Accelerometer sample-rate window.
    pub fn acc_freq(&self) -> FreqStats {
        self.acc_freq.freq_stats()
    }

    /// Gyroscope sample-rate window.
    pub fn gyro_freq(&self) -> FreqStats {
        self.gyro_freq.freq_stats()
    }
}
