//! Orientation to pan/tilt rotation transform
//!
//! Given a fixed world-frame target direction and the platform's current
//! orientation, computes the pan/tilt that keeps the target centered. The
//! platform's own rotation is inverted to find where the target now
//! appears in the body frame.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

/// A pan/tilt aiming command, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanTilt {
    pub pan_deg: f64,
    pub tilt_deg: f64,
}

/// Stateless-per-call transform from orientation to pan/tilt.
///
/// Constructed once with the user-chosen target; changing the target means
/// constructing a new `Rotator`.
#[derive(Debug, Clone)]
pub struct Rotator {
    /// Target direction as configured, degrees
    target: PanTilt,
    /// Target pan, radians, kept for the degenerate-direction fallback
    target_pan: f64,
    /// Target direction as a spherical-to-Cartesian unit vector
    target_pt: Vector3<f64>,
}

impl Rotator {
    pub fn new(target_pan_deg: f64, target_tilt_deg: f64) -> Self {
        let pan = target_pan_deg.to_radians();
        let tilt = target_tilt_deg.to_radians();
        Self {
            target: PanTilt {
                pan_deg: target_pan_deg,
                tilt_deg: target_tilt_deg,
            },
            target_pan: pan,
            target_pt: Vector3::new(
                tilt.sin() * pan.cos(),
                tilt.sin() * pan.sin(),
                tilt.cos(),
            ),
        }
    }

    /// The configured target direction, degrees.
    pub fn target(&self) -> PanTilt {
        self.target
    }

    /// Pan/tilt that re-centers the target given the current orientation
    /// `(roll, pitch, yaw)` in radians.
    pub fn rotate(&self, angles: &Vector3<f64>) -> PanTilt {
        // Invert the platform rotation to compensate it
        let neg = -angles;
        let s = [neg[0].sin(), neg[1].sin(), neg[2].sin()];
        let c = [neg[0].cos(), neg[1].cos(), neg[2].cos()];

        // Elementary rotations composed about axis 0, then 1, then 2.
        // Element values are kept exactly as the flight-proven original
        // wrote them; see the design notes before "simplifying" anything.
        #[rustfmt::skip]
        let rot = Matrix3::new(
            c[2] * c[1],                         -s[2] * c[1],                        s[1],
            s[1] * c[2] * s[0] + s[2] * c[0],    -s[2] * s[1] * s[0] + c[2] * c[0],   -c[1] * s[0],
            -c[2] * s[2] * c[0] + s[2] * s[0],   s[2] * s[1] * c[0] + c[2] * s[0],    c[1] * c[0],
        );

        // Row-vector times matrix
        let pt = rot.tr_mul(&self.target_pt);

        let pan = if pt.x == 0.0 {
            if pt.y < 0.0 {
                -FRAC_PI_2
            } else if pt.y > 0.0 {
                FRAC_PI_2
            } else {
                // Target is straight along the tilt axis; pan is undefined,
                // fall back to the configured value
                self.target_pan
            }
        } else if pt.x < 0.0 {
            PI - pt.y.atan2(pt.x)
        } else {
            pt.y.atan2(pt.x)
        };

        // The matrix above is not exactly orthogonal, so guard acos
        let mut tilt = pt.z.clamp(-1.0, 1.0).acos();
        if tilt > FRAC_PI_2 {
            // Fold into the forward hemisphere
            tilt = PI - tilt;
        }

        PanTilt {
            pan_deg: pan.to_degrees(),
            tilt_deg: tilt.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_rotation_returns_target_unchanged() {
        let rotator = Rotator::new(30.0, 45.0);
        let pt = rotator.rotate(&Vector3::zeros());
        assert_relative_eq!(pt.pan_deg, 30.0, epsilon = 1e-9);
        assert_relative_eq!(pt.tilt_deg, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_rotation_negative_pan() {
        let rotator = Rotator::new(-60.0, 30.0);
        let pt = rotator.rotate(&Vector3::zeros());
        assert_relative_eq!(pt.pan_deg, -60.0, epsilon = 1e-9);
        assert_relative_eq!(pt.tilt_deg, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn straight_up_target_falls_back_to_configured_pan() {
        // tilt 0 puts the target along the z axis: sin(0) = 0 exactly, so
        // the transformed x and y stay exactly zero under zero rotation
        let rotator = Rotator::new(30.0, 0.0);
        let pt = rotator.rotate(&Vector3::zeros());
        assert_relative_eq!(pt.pan_deg, 30.0, epsilon = 1e-9);
        assert_relative_eq!(pt.tilt_deg, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn full_roll_folds_tilt_and_mirrors_pan() {
        let rotator = Rotator::new(30.0, 45.0);
        let pt = rotator.rotate(&Vector3::new(PI, 0.0, 0.0));
        assert_relative_eq!(pt.pan_deg, -30.0, epsilon = 1e-6);
        assert_relative_eq!(pt.tilt_deg, 45.0, epsilon = 1e-6);
    }

    #[test]
    fn small_yaw_shifts_pan_smoothly() {
        let rotator = Rotator::new(0.0, 45.0);
        let pt = rotator.rotate(&Vector3::new(0.0, 0.0, 10f64.to_radians()));
        // Not exactly 10 degrees: the preserved matrix couples axes in a
        // non-orthogonal way, but the shift must be positive and bounded
        assert!(pt.pan_deg > 2.0 && pt.pan_deg < 20.0, "pan={}", pt.pan_deg);
    }

    #[test]
    fn tilt_stays_in_forward_hemisphere() {
        let rotator = Rotator::new(0.0, 80.0);
        for angle in [-2.0, -1.0, 0.0, 1.0, 2.0f64] {
            let pt = rotator.rotate(&Vector3::new(angle, angle / 2.0, angle / 3.0));
            assert!(
                (0.0..=90.0 + 1e-9).contains(&pt.tilt_deg),
                "tilt={} at angle={}",
                pt.tilt_deg,
                angle
            );
        }
    }
}
