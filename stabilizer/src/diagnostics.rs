//! Diagnostic ring buffers and the per-tick snapshot
//!
//! Every stage of the pipeline records into a fixed-capacity, newest-first
//! sample window; the control loop condenses them into a
//! [`DiagnosticsSnapshot`] for the renderer once per output tick.

use serde::Serialize;

use crate::rotation::PanTilt;

/// Fixed-capacity sample window, index 0 = most recent.
///
/// Always reports exactly `capacity` elements; the oldest is silently
/// overwritten on push. Pushes and indexed reads are O(1).
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Create a buffer of `capacity` slots, all holding `fill`.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, fill: T) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            slots: vec![fill; capacity],
            head: 0,
        }
    }

    /// Insert at index 0, discarding the oldest element.
    pub fn push(&mut self, value: T) {
        let capacity = self.slots.len();
        self.head = (self.head + capacity - 1) % capacity;
        self.slots[self.head] = value;
    }

    /// Element `index` positions back from the most recent.
    pub fn get(&self, index: usize) -> &T {
        &self.slots[(self.head + index) % self.slots.len()]
    }

    /// The most recently pushed element.
    pub fn latest(&self) -> &T {
        self.get(0)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.slots.len()).map(move |i| self.get(i))
    }
}

impl RingBuffer<f64> {
    pub fn average(&self) -> f64 {
        self.slots.iter().sum::<f64>() / self.slots.len() as f64
    }

    pub fn minimum(&self) -> f64 {
        self.slots.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn maximum(&self) -> f64 {
        self.slots.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Current / average / minimum view, used for frequency windows.
    pub fn freq_stats(&self) -> FreqStats {
        FreqStats {
            current: *self.latest(),
            average: self.average(),
            minimum: self.minimum(),
        }
    }

    /// Average / maximum view, used for stage latency windows.
    pub fn latency_stats(&self) -> LatencyStats {
        LatencyStats {
            average: self.average(),
            maximum: self.maximum(),
        }
    }
}

/// Sample-frequency statistics over a ring window, Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FreqStats {
    pub current: f64,
    pub average: f64,
    pub minimum: f64,
}

/// Stage-latency statistics over a ring window, seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    pub average: f64,
    pub maximum: f64,
}

/// Everything the diagnostics renderer gets, once per output tick.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSnapshot {
    /// Instantaneous accelerometer sample rate window
    pub acc_freq: FreqStats,
    /// Instantaneous gyroscope sample rate window
    pub gyro_freq: FreqStats,
    /// Configured output rate, Hz
    pub output_freq_target: f64,
    /// Achieved output rate window
    pub output_freq: FreqStats,
    /// Decode + fuse stage latency
    pub fuse_latency: LatencyStats,
    /// Rotation transform latency
    pub rotate_latency: LatencyStats,
    /// Whole output stage latency
    pub output_latency: LatencyStats,
    /// Most recent error or warning text; `None` means all is well
    pub status: Option<String>,
    /// Configured target direction, degrees
    pub target: PanTilt,
    /// Pan/tilt command issued this tick, degrees
    pub pan_tilt: PanTilt,
    /// Current orientation estimate (roll, pitch, yaw), degrees
    pub angles_deg: [f64; 3],
}
