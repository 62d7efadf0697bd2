//! Structural description a [`KinematicModel`](crate::KinematicModel) is built from.
//!
//! This is the hand-off point for whatever reads mechanism files: it only
//! carries names, joint types, offsets, axes and limits. Joint types are kept
//! as strings here and resolved during the build, so an unsupported type is
//! reported as a construction error rather than a deserialization error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::joint::JointType;

/// Group name -> member joint names, in the order they appear in the group state.
pub type GroupSpecs = BTreeMap<String, Vec<String>>;

/// Position + roll-pitch-yaw, in meters and radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub xyz: [f64; 3],
    #[serde(default)]
    pub rpy: [f64; 3],
}

impl Pose {
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            xyz: [x, y, z],
            rpy: [0.0; 3],
        }
    }

    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self { xyz, rpy }
    }
}

/// Opaque collision geometry. Stored and handed back, never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Sphere { radius: f64 },
    Box { size: [f64; 3] },
    Cylinder { radius: f64, length: f64 },
    Mesh { filename: String, scale: [f64; 3] },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub lower: f64,
    pub upper: f64,
}

impl Limits {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn symmetric(extent: f64) -> Self {
        Self::new(-extent, extent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescription {
    pub name: String,
    // collision geometry offset, relative to the link frame
    #[serde(default)]
    pub collision_origin: Pose,
    #[serde(default)]
    pub shape: Option<Shape>,
}

impl LinkDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collision_origin: Pose::default(),
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape, collision_origin: Pose) -> Self {
        self.shape = Some(shape);
        self.collision_origin = collision_origin;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub joint_type: String,
    pub parent: String,
    pub child: String,
    /// Constant offset of the child link, applied after the joint motion.
    #[serde(default)]
    pub origin: Pose,
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    /// One pair per bounded parameter: revolute/prismatic need one, planar
    /// takes (x, y, yaw), floating takes the translation (x, y, z).
    #[serde(default)]
    pub limits: Vec<Limits>,
}

fn default_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

impl JointDescription {
    pub fn new(
        name: impl Into<String>,
        joint_type: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type: joint_type.into(),
            parent: parent.into(),
            child: child.into(),
            origin: Pose::default(),
            axis: default_axis(),
            limits: Vec::new(),
        }
    }

    pub fn fixed(name: &str, parent: &str, child: &str) -> Self {
        Self::new(name, JointType::Fixed.as_str(), parent, child)
    }

    pub fn revolute(
        name: &str,
        parent: &str,
        child: &str,
        axis: [f64; 3],
        lower: f64,
        upper: f64,
    ) -> Self {
        Self::new(name, JointType::Revolute.as_str(), parent, child)
            .with_axis(axis)
            .with_limits(vec![Limits::new(lower, upper)])
    }

    pub fn continuous(name: &str, parent: &str, child: &str, axis: [f64; 3]) -> Self {
        Self::new(name, JointType::Continuous.as_str(), parent, child).with_axis(axis)
    }

    pub fn prismatic(
        name: &str,
        parent: &str,
        child: &str,
        axis: [f64; 3],
        lower: f64,
        upper: f64,
    ) -> Self {
        Self::new(name, JointType::Prismatic.as_str(), parent, child)
            .with_axis(axis)
            .with_limits(vec![Limits::new(lower, upper)])
    }

    pub fn planar(name: &str, parent: &str, child: &str) -> Self {
        Self::new(name, JointType::Planar.as_str(), parent, child).with_axis([0.0, 0.0, 1.0])
    }

    pub fn floating(name: &str, parent: &str, child: &str) -> Self {
        Self::new(name, JointType::Floating.as_str(), parent, child)
    }

    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_axis(mut self, axis: [f64; 3]) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_limits(mut self, limits: Vec<Limits>) -> Self {
        self.limits = limits;
        self
    }
}

/// A rooted tree of links connected by joints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    pub links: Vec<LinkDescription>,
    #[serde(default)]
    pub joints: Vec<JointDescription>,
}

impl ModelDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn link(mut self, link: LinkDescription) -> Self {
        self.links.push(link);
        self
    }

    pub fn joint(mut self, joint: JointDescription) -> Self {
        self.joints.push(joint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_from_json() {
        let json = r#"{
            "name": "pan_tilt",
            "links": [
                { "name": "base" },
                { "name": "head", "shape": { "type": "sphere", "radius": 0.1 } }
            ],
            "joints": [
                {
                    "name": "pan",
                    "type": "continuous",
                    "parent": "base",
                    "child": "head",
                    "origin": { "xyz": [0.0, 0.0, 0.3] },
                    "axis": [0.0, 0.0, 1.0]
                }
            ]
        }"#;
        let description: ModelDescription = serde_json::from_str(json).unwrap();
        assert_eq!(description.links.len(), 2);
        assert_eq!(description.links[1].shape, Some(Shape::Sphere { radius: 0.1 }));
        let pan = &description.joints[0];
        assert_eq!(pan.joint_type, "continuous");
        assert_eq!(pan.origin.xyz, [0.0, 0.0, 0.3]);
        assert_eq!(pan.origin.rpy, [0.0; 3]);
        assert!(pan.limits.is_empty());
    }

    #[test]
    fn builders_fill_type_and_limits() {
        let joint = JointDescription::prismatic("lift", "base", "mast", [0.0, 0.0, 1.0], 0.0, 0.8);
        assert_eq!(joint.joint_type, "prismatic");
        assert_eq!(joint.limits, vec![Limits::new(0.0, 0.8)]);
        assert_eq!(joint.axis, [0.0, 0.0, 1.0]);
    }
}
