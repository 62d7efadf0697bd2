use std::f64::consts::PI;

use nalgebra::{Isometry3, Translation3, UnitQuaternion};

use super::description::Pose;

pub(super) fn pose_to_isometry(pose: &Pose) -> Isometry3<f64> {
    let [x, y, z] = pose.xyz;
    let [roll, pitch, yaw] = pose.rpy;
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

// wrap an angle into [-pi, pi], leaving values already inside untouched
pub(super) fn normalize_angle(angle: f64) -> f64 {
    if (-PI..=PI).contains(&angle) {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    wrapped.clamp(-PI, PI)
}

// 0 when the range allows it, otherwise the middle of the range
pub(super) fn default_value(low: f64, high: f64) -> f64 {
    if low <= 0.0 && high >= 0.0 {
        0.0
    } else {
        (low + high) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::*;

    #[test]
    fn pose_to_isometry_test() {
        let pose = Pose::from_xyz_rpy([1.0, 2.0, 3.0], [0.0, 0.0, PI / 2.0]);
        let iso = pose_to_isometry(&pose);
        assert_relative_eq!(iso.translation.vector, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(
            iso.rotation * Vector3::x(),
            Vector3::y(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn normalize_angle_test() {
        assert_eq!(normalize_angle(0.5), 0.5);
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), -PI);
        assert_relative_eq!(normalize_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-5.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        let once = normalize_angle(7.3);
        assert_eq!(normalize_angle(once), once);
    }

    #[test]
    fn default_value_test() {
        assert_eq!(default_value(-1.0, 1.0), 0.0);
        assert_eq!(default_value(0.0, 2.0), 0.0);
        assert_relative_eq!(default_value(0.2, 0.6), 0.4, epsilon = 1e-12);
        assert_eq!(default_value(-3.0, -1.0), -2.0);
    }
}
