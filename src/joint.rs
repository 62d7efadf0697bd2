use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::{Isometry3, Quaternion, Translation3, Unit, UnitQuaternion, Vector3};
use thiserror::Error;

use super::config::{ModelOptions, RootJointType};
use super::description::{JointDescription, Limits};
use super::error::ModelError;
use super::link::LinkId;

/// Stable handle of a joint inside its model. Joints are numbered in
/// state-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(pub(crate) usize);

impl JointId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Joint type names accepted in a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    Fixed,
    Revolute,
    Continuous,
    Prismatic,
    Planar,
    Floating,
}

impl JointType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Planar => "planar",
            Self::Floating => "floating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown joint type '{0}'")]
pub struct ParseJointTypeError(pub String);

impl FromStr for JointType {
    type Err = ParseJointTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "revolute" => Ok(Self::Revolute),
            "continuous" => Ok(Self::Continuous),
            "prismatic" => Ok(Self::Prismatic),
            "planar" => Ok(Self::Planar),
            "floating" => Ok(Self::Floating),
            _ => Err(ParseJointTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of joint variants and their transform algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    Fixed,
    /// Rotation by `theta` about `axis`. A continuous joint wraps instead of clamping.
    Revolute {
        axis: Unit<Vector3<f64>>,
        continuous: bool,
    },
    /// Translation by `d` along `axis`.
    Prismatic { axis: Unit<Vector3<f64>> },
    /// (x, y, theta): translation in the XY plane, then rotation about Z.
    Planar,
    /// (x, y, z, qx, qy, qz, qw): translation, then the orientation. The
    /// quaternion is normalized before use; all zeros means no rotation.
    Floating,
}

impl JointKind {
    pub fn used_params(&self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Revolute { .. } | Self::Prismatic { .. } => 1,
            Self::Planar => 3,
            Self::Floating => 7,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Revolute { continuous: true, .. })
    }

    pub fn joint_type(&self) -> JointType {
        match self {
            Self::Fixed => JointType::Fixed,
            Self::Revolute { continuous: true, .. } => JointType::Continuous,
            Self::Revolute { .. } => JointType::Revolute,
            Self::Prismatic { .. } => JointType::Prismatic,
            Self::Planar => JointType::Planar,
            Self::Floating => JointType::Floating,
        }
    }

    /// Local transform for this joint's parameter slice.
    ///
    /// # Panics
    ///
    /// Panics if `params.len() != self.used_params()`.
    pub fn transform(&self, params: &[f64]) -> Isometry3<f64> {
        assert_eq!(
            params.len(),
            self.used_params(),
            "joint parameter slice has the wrong length"
        );
        match self {
            Self::Fixed => Isometry3::identity(),
            Self::Revolute { axis, .. } => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, params[0]),
            ),
            Self::Prismatic { axis } => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * params[0]),
                UnitQuaternion::identity(),
            ),
            Self::Planar => Isometry3::from_parts(
                Translation3::new(params[0], params[1], 0.0),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), params[2]),
            ),
            Self::Floating => {
                let q = Quaternion::new(params[6], params[3], params[4], params[5]);
                // the all-zero default orientation stands for "no rotation"
                let rotation = if q.norm_squared() == 0.0 {
                    UnitQuaternion::identity()
                } else {
                    UnitQuaternion::from_quaternion(q)
                };
                Isometry3::from_parts(
                    Translation3::new(params[0], params[1], params[2]),
                    rotation,
                )
            }
        }
    }

    /// Approximate inverse of [`JointKind::transform`], used to seed a state
    /// from an observed pose. Components the joint cannot express are dropped.
    pub fn params_from_transform(&self, transform: &Isometry3<f64>) -> Vec<f64> {
        let t = &transform.translation.vector;
        match self {
            Self::Fixed => Vec::new(),
            Self::Revolute { axis, .. } => {
                vec![transform.rotation.scaled_axis().dot(&axis.into_inner())]
            }
            Self::Prismatic { axis } => vec![t.dot(&axis.into_inner())],
            Self::Planar => vec![t.x, t.y, transform.rotation.euler_angles().2],
            Self::Floating => {
                let q = transform.rotation.quaternion();
                vec![t.x, t.y, t.z, q.i, q.j, q.k, q.w]
            }
        }
    }

    // parameters of this joint that wrap around instead of being clamped
    pub(crate) fn wraps(&self) -> bool {
        self.is_continuous()
    }
}

/// A joint of the model. Parent and child links are handles into the same model.
#[derive(Debug, Clone)]
pub struct Joint {
    pub(crate) name: String,
    pub(crate) kind: JointKind,
    // None for the root joint connecting to the world
    pub(crate) parent_link: Option<LinkId>,
    pub(crate) child_link: LinkId,
    pub(crate) state_index: usize,

    // cached by the last forward kinematics pass
    pub(crate) local_transform: Isometry3<f64>,
}

impl Joint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    pub fn used_params(&self) -> usize {
        self.kind.used_params()
    }

    pub fn state_index(&self) -> usize {
        self.state_index
    }

    pub fn state_range(&self) -> std::ops::Range<usize> {
        self.state_index..self.state_index + self.used_params()
    }

    pub fn parent_link(&self) -> Option<LinkId> {
        self.parent_link
    }

    pub fn child_link(&self) -> LinkId {
        self.child_link
    }

    pub fn local_transform(&self) -> &Isometry3<f64> {
        &self.local_transform
    }

    pub fn params_from_transform(&self, transform: &Isometry3<f64>) -> Vec<f64> {
        self.kind.params_from_transform(transform)
    }

    pub(crate) fn update_local_transform(&mut self, params: &[f64]) {
        self.local_transform = self.kind.transform(params);
    }
}

fn check_limits(
    joint: &str,
    limits: &[Limits],
    expected: usize,
) -> Result<Vec<(f64, f64)>, ModelError> {
    if limits.len() != expected {
        return Err(ModelError::MissingLimits {
            joint: joint.to_string(),
            expected,
            got: limits.len(),
        });
    }
    limits
        .iter()
        .map(|l| {
            if l.lower.is_finite() && l.upper.is_finite() && l.lower <= l.upper {
                Ok((l.lower, l.upper))
            } else {
                Err(ModelError::InvalidLimits {
                    joint: joint.to_string(),
                    lower: l.lower,
                    upper: l.upper,
                })
            }
        })
        .collect()
}

fn unit_axis(joint: &str, axis: [f64; 3]) -> Result<Unit<Vector3<f64>>, ModelError> {
    Unit::try_new(Vector3::from(axis), 1e-12)
        .ok_or_else(|| ModelError::InvalidAxis(joint.to_string()))
}

// bounds of planar/floating translations, falling back to a symmetric extent
fn translation_bounds(
    joint: &str,
    limits: &[Limits],
    count: usize,
    extent: f64,
) -> Result<Vec<(f64, f64)>, ModelError> {
    if limits.is_empty() {
        Ok(vec![(-extent, extent); count])
    } else {
        check_limits(joint, limits, count)
    }
}

/// Resolve a described joint into its variant and per-parameter `(min, max)` bounds.
pub(crate) fn construct_joint(
    desc: &JointDescription,
    options: &ModelOptions,
) -> Result<(JointKind, Vec<(f64, f64)>), ModelError> {
    let joint_type: JointType = desc.joint_type.parse().map_err(|_| ModelError::UnknownJointType {
        joint: desc.name.clone(),
        kind: desc.joint_type.clone(),
    })?;
    let name = desc.name.as_str();

    match joint_type {
        JointType::Fixed => Ok((JointKind::Fixed, Vec::new())),
        JointType::Revolute => Ok((
            JointKind::Revolute {
                axis: unit_axis(name, desc.axis)?,
                continuous: false,
            },
            check_limits(name, &desc.limits, 1)?,
        )),
        JointType::Continuous => Ok((
            JointKind::Revolute {
                axis: unit_axis(name, desc.axis)?,
                continuous: true,
            },
            vec![(-PI, PI)],
        )),
        JointType::Prismatic => Ok((
            JointKind::Prismatic {
                axis: unit_axis(name, desc.axis)?,
            },
            check_limits(name, &desc.limits, 1)?,
        )),
        JointType::Planar => {
            if desc.axis != [0.0, 0.0, 1.0] {
                tracing::warn!(
                    joint = name,
                    "planar joints always move in the XY plane; axis ignored"
                );
            }
            let bounds = if desc.limits.is_empty() {
                vec![
                    (-options.planar_extent, options.planar_extent),
                    (-options.planar_extent, options.planar_extent),
                    (-PI, PI),
                ]
            } else {
                check_limits(name, &desc.limits, 3)?
            };
            Ok((JointKind::Planar, bounds))
        }
        JointType::Floating => {
            let mut bounds = translation_bounds(name, &desc.limits, 3, options.floating_extent)?;
            bounds.extend([(-1.0, 1.0); 4]);
            Ok((JointKind::Floating, bounds))
        }
    }
}

/// The synthesized joint connecting the root link to the world.
pub(crate) fn construct_root_joint(options: &ModelOptions) -> (JointKind, Vec<(f64, f64)>) {
    match options.root_joint {
        RootJointType::Fixed => (JointKind::Fixed, Vec::new()),
        RootJointType::Planar => {
            let e = options.planar_extent;
            (JointKind::Planar, vec![(-e, e), (-e, e), (-PI, PI)])
        }
        RootJointType::Floating => {
            let e = options.floating_extent;
            let mut bounds = vec![(-e, e); 3];
            bounds.extend([(-1.0, 1.0); 4]);
            (JointKind::Floating, bounds)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    fn z_axis() -> Unit<Vector3<f64>> {
        Vector3::z_axis()
    }

    #[test]
    fn used_params_per_variant() {
        assert_eq!(JointKind::Fixed.used_params(), 0);
        let revolute = JointKind::Revolute { axis: z_axis(), continuous: false };
        assert_eq!(revolute.used_params(), 1);
        assert_eq!(JointKind::Prismatic { axis: z_axis() }.used_params(), 1);
        assert_eq!(JointKind::Planar.used_params(), 3);
        assert_eq!(JointKind::Floating.used_params(), 7);
    }

    #[test]
    fn fixed_is_identity() {
        assert_eq!(JointKind::Fixed.transform(&[]), Isometry3::identity());
    }

    #[test]
    fn revolute_rotates_about_axis() {
        let joint = JointKind::Revolute { axis: z_axis(), continuous: false };
        let t = joint.transform(&[FRAC_PI_2]);
        assert_relative_eq!(t.translation.vector, Vector3::zeros());
        assert_relative_eq!(t.rotation * Vector3::x(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn prismatic_translates_along_axis() {
        let joint = JointKind::Prismatic { axis: z_axis() };
        let t = joint.transform(&[0.5]);
        assert_relative_eq!(t.translation.vector, Vector3::new(0.0, 0.0, 0.5));
        assert_eq!(t.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn planar_translates_then_rotates() {
        let t = JointKind::Planar.transform(&[1.0, 2.0, FRAC_PI_2]);
        assert_relative_eq!(t.translation.vector, Vector3::new(1.0, 2.0, 0.0));
        // a point one unit along local x ends up one unit along world y from the origin
        let p = t * nalgebra::Point3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(p.coords, Vector3::new(1.0, 3.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn floating_with_identity_orientation_is_pure_translation() {
        let t = JointKind::Floating.transform(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t, Isometry3::translation(1.0, 2.0, 3.0));
    }

    #[test]
    fn floating_zero_orientation_maps_to_identity_rotation() {
        let t = JointKind::Floating.transform(&[0.0; 7]);
        assert_eq!(t, Isometry3::identity());
    }

    #[test]
    fn floating_orientation_is_normalized() {
        // twice the unit quaternion of a quarter turn about z
        let half = FRAC_PI_2 / 2.0;
        let params = [0.0, 0.0, 0.0, 0.0, 0.0, 2.0 * half.sin(), 2.0 * half.cos()];
        let t = JointKind::Floating.transform(&params);
        assert_relative_eq!(t.rotation.quaternion().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.rotation * Vector3::x(), Vector3::y(), epsilon = 1e-12);

        // arbitrary components still give a rigid motion
        let t = JointKind::Floating.transform(&[0.0, 0.0, 0.0, 0.3, -0.9, 0.4, 0.1]);
        assert_relative_eq!((t.rotation * Vector3::x()).norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    #[should_panic]
    fn wrong_slice_length_panics() {
        JointKind::Planar.transform(&[1.0]);
    }

    #[test]
    fn params_from_transform_inverts_transform() {
        let revolute = JointKind::Revolute { axis: z_axis(), continuous: false };
        let back = revolute.params_from_transform(&revolute.transform(&[0.7]));
        assert_relative_eq!(back[0], 0.7, epsilon = 1e-12);

        let prismatic = JointKind::Prismatic { axis: Vector3::y_axis() };
        let back = prismatic.params_from_transform(&prismatic.transform(&[-0.25]));
        assert_relative_eq!(back[0], -0.25, epsilon = 1e-12);

        let planar = JointKind::Planar.transform(&[0.3, -0.4, 1.2]);
        let back = JointKind::Planar.params_from_transform(&planar);
        for (got, want) in back.iter().zip([0.3, -0.4, 1.2]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }

        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let pose = Isometry3::from_parts(Translation3::new(1.0, 2.0, 3.0), q);
        let params = JointKind::Floating.params_from_transform(&pose);
        assert_eq!(params.len(), 7);
        let round = JointKind::Floating.transform(&params);
        assert_relative_eq!(round, pose, epsilon = 1e-12);
    }

    #[test]
    fn described_planar_bounds() {
        let options = ModelOptions::default();

        let desc = JointDescription::planar("slide", "a", "b");
        let (kind, bounds) = construct_joint(&desc, &options).unwrap();
        assert_eq!(kind, JointKind::Planar);
        assert_eq!(bounds, vec![(-10.0, 10.0), (-10.0, 10.0), (-PI, PI)]);

        let desc = JointDescription::planar("slide", "a", "b").with_limits(vec![
            Limits::new(-1.0, 1.0),
            Limits::new(0.0, 2.0),
            Limits::symmetric(0.5),
        ]);
        let (_, bounds) = construct_joint(&desc, &options).unwrap();
        assert_eq!(bounds, vec![(-1.0, 1.0), (0.0, 2.0), (-0.5, 0.5)]);

        let desc = JointDescription::planar("slide", "a", "b")
            .with_limits(vec![Limits::new(-1.0, 1.0); 2]);
        assert!(matches!(
            construct_joint(&desc, &options),
            Err(ModelError::MissingLimits { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn described_floating_bounds() {
        let options = ModelOptions {
            floating_extent: 4.0,
            ..ModelOptions::default()
        };

        let desc = JointDescription::floating("free", "a", "b");
        let (kind, bounds) = construct_joint(&desc, &options).unwrap();
        assert_eq!(kind, JointKind::Floating);
        assert_eq!(&bounds[..3], &[(-4.0, 4.0); 3]);
        assert_eq!(&bounds[3..], &[(-1.0, 1.0); 4]);

        let desc = JointDescription::floating("free", "a", "b").with_limits(vec![
            Limits::new(-1.0, 1.0),
            Limits::new(-2.0, 2.0),
            Limits::new(0.0, 3.0),
        ]);
        let (_, bounds) = construct_joint(&desc, &options).unwrap();
        assert_eq!(&bounds[..3], &[(-1.0, 1.0), (-2.0, 2.0), (0.0, 3.0)]);
        assert_eq!(&bounds[3..], &[(-1.0, 1.0); 4]);
    }

    #[test]
    fn parse_joint_type() {
        assert_eq!("revolute".parse::<JointType>(), Ok(JointType::Revolute));
        assert_eq!("Continuous".parse::<JointType>(), Ok(JointType::Continuous));
        assert!("spherical".parse::<JointType>().is_err());
    }

    #[test]
    fn construct_joint_bounds() {
        let options = ModelOptions::default();

        let desc = JointDescription::continuous("spin", "a", "b", [0.0, 0.0, 1.0]);
        let (kind, bounds) = construct_joint(&desc, &options).unwrap();
        assert!(kind.is_continuous());
        assert_eq!(bounds, vec![(-PI, PI)]);

        let desc = JointDescription::floating("free", "a", "b");
        let (_, bounds) = construct_joint(&desc, &options).unwrap();
        assert_eq!(bounds.len(), 7);
        assert_eq!(bounds[0], (-10.0, 10.0));
        assert_eq!(bounds[6], (-1.0, 1.0));

        let desc = JointDescription::new("elbow", "revolute", "a", "b");
        assert!(matches!(
            construct_joint(&desc, &options),
            Err(ModelError::MissingLimits { expected: 1, got: 0, .. })
        ));

        let desc = JointDescription::revolute("elbow", "a", "b", [0.0; 3], -1.0, 1.0);
        assert_eq!(
            construct_joint(&desc, &options),
            Err(ModelError::InvalidAxis("elbow".into()))
        );

        let desc = JointDescription::prismatic("lift", "a", "b", [0.0, 0.0, 1.0], 1.0, -1.0);
        assert!(matches!(
            construct_joint(&desc, &options),
            Err(ModelError::InvalidLimits { .. })
        ));

        let desc = JointDescription::floating("free", "a", "b")
            .with_limits(vec![Limits::new(-1.0, 1.0)]);
        assert!(matches!(
            construct_joint(&desc, &options),
            Err(ModelError::MissingLimits { expected: 3, got: 1, .. })
        ));

        let desc = JointDescription::new("ball", "spherical", "a", "b");
        assert_eq!(
            construct_joint(&desc, &options),
            Err(ModelError::UnknownJointType {
                joint: "ball".into(),
                kind: "spherical".into()
            })
        );
    }
}
