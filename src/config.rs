use serde::{Deserialize, Serialize};

/// How the root link connects to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootJointType {
    /// No motion (0 parameters).
    #[default]
    Fixed,
    /// x, y, yaw (3 parameters).
    Planar,
    /// x, y, z and a quaternion qx, qy, qz, qw (7 parameters).
    Floating,
}

/// Build-time options for a [`KinematicModel`](crate::KinematicModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub root_joint: RootJointType,
    pub root_joint_name: String,
    // translation bounds for planar joints declared without limits
    pub planar_extent: f64,
    // translation bounds for floating joints declared without limits
    pub floating_extent: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            root_joint: RootJointType::Fixed,
            root_joint_name: "world".to_string(),
            planar_extent: 10.0,
            floating_extent: 10.0,
        }
    }
}

impl ModelOptions {
    pub fn with_root_joint(mut self, root_joint: RootJointType) -> Self {
        self.root_joint = root_joint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_options_fall_back_to_defaults() {
        let options: ModelOptions =
            serde_json::from_str(r#"{ "root_joint": "floating" }"#).unwrap();
        assert_eq!(options.root_joint, RootJointType::Floating);
        assert_eq!(options.root_joint_name, "world");
        assert_eq!(options.floating_extent, 10.0);
    }
}
