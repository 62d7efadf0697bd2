// models shared by the unit tests

use std::f64::consts::FRAC_PI_2;

use crate::config::{ModelOptions, RootJointType};
use crate::description::{
    GroupSpecs, JointDescription, LinkDescription, ModelDescription, Pose, Shape,
};
use crate::model::KinematicModel;

pub(crate) fn groups(specs: &[(&str, &[&str])]) -> GroupSpecs {
    specs
        .iter()
        .map(|(name, joints)| (name.to_string(), joints.iter().map(|j| j.to_string()).collect()))
        .collect()
}

// base --shoulder (revolute z)--> upper_arm, offset (1, 0, 0)
pub(crate) fn single_revolute() -> KinematicModel {
    let description = ModelDescription::new("pendulum")
        .link(LinkDescription::new("base"))
        .link(LinkDescription::new("upper_arm"))
        .joint(
            JointDescription::revolute(
                "shoulder",
                "base",
                "upper_arm",
                [0.0, 0.0, 1.0],
                -1.5708,
                1.5708,
            )
            .with_origin(Pose::from_xyz(1.0, 0.0, 0.0)),
        );
    KinematicModel::build(&description, &GroupSpecs::new()).unwrap()
}

// base --lift (prismatic z)--> carriage, offset (1, 0, 0)
pub(crate) fn single_prismatic() -> KinematicModel {
    let description = ModelDescription::new("lift")
        .link(LinkDescription::new("base"))
        .link(LinkDescription::new("carriage"))
        .joint(
            JointDescription::prismatic("lift", "base", "carriage", [0.0, 0.0, 1.0], 0.0, 1.0)
                .with_origin(Pose::from_xyz(1.0, 0.0, 0.0)),
        );
    KinematicModel::build(&description, &GroupSpecs::new()).unwrap()
}

// a mobile base carrying a single link
pub(crate) fn floating_block() -> KinematicModel {
    let description = ModelDescription::new("block").link(LinkDescription::new("block"));
    let options = ModelOptions::default().with_root_joint(RootJointType::Floating);
    KinematicModel::build_with_options(&description, &GroupSpecs::new(), &options).unwrap()
}

fn arm(description: ModelDescription, side: &str, y: f64) -> ModelDescription {
    let link = |name: &str| format!("{side}_{name}");
    let (upper_arm, forearm, hand) = (link("upper_arm"), link("forearm"), link("hand"));
    let pitch = [0.0, 1.0, 0.0];
    let hand_box = Shape::Box { size: [0.1, 0.1, 0.05] };
    let hand_collision = Pose::from_xyz(0.05, 0.0, 0.0);

    let shoulder = link("shoulder");
    let (low, high) = (-FRAC_PI_2, FRAC_PI_2);
    let shoulder = JointDescription::revolute(&shoulder, "torso", &upper_arm, pitch, low, high)
        .with_origin(Pose::from_xyz(0.0, y, 0.5));
    let elbow = JointDescription::revolute(&link("elbow"), &upper_arm, &forearm, pitch, 0.0, 2.5)
        .with_origin(Pose::from_xyz(0.3, 0.0, 0.0));
    let wrist = JointDescription::continuous(&link("wrist"), &forearm, &hand, [1.0, 0.0, 0.0])
        .with_origin(Pose::from_xyz(0.25, 0.0, 0.0));

    description
        .link(LinkDescription::new(upper_arm.as_str()))
        .link(LinkDescription::new(forearm.as_str()))
        .link(LinkDescription::new(hand.as_str()).with_shape(hand_box, hand_collision))
        .joint(shoulder)
        .joint(elbow)
        .joint(wrist)
}

//            base
//              | torso_lift (prismatic z)
//            torso
//         /         \
//  left_upper_arm  right_upper_arm    shoulders: revolute y
//        |               |
//   left_forearm    right_forearm     elbows: revolute y, limits [0, 2.5]
//        |               |
//    left_hand       right_hand       wrists: continuous x
pub(crate) fn two_arm_description() -> ModelDescription {
    let description = ModelDescription::new("two_arm")
        .link(LinkDescription::new("base"))
        .link(LinkDescription::new("torso"))
        .joint(
            JointDescription::prismatic("torso_lift", "base", "torso", [0.0, 0.0, 1.0], 0.0, 0.4)
                .with_origin(Pose::from_xyz(0.0, 0.0, 0.3)),
        );
    let description = arm(description, "left", 0.2);
    arm(description, "right", -0.2)
}

pub(crate) fn two_arm_groups() -> GroupSpecs {
    groups(&[
        ("left_arm", &["left_shoulder", "left_elbow"]),
        ("right_arm", &["right_shoulder", "right_elbow"]),
        ("arms", &["left_shoulder", "left_elbow", "right_shoulder", "right_elbow"]),
        (
            "everything_but_base",
            &[
                "torso_lift",
                "left_shoulder",
                "left_elbow",
                "left_wrist",
                "right_shoulder",
                "right_elbow",
                "right_wrist",
            ],
        ),
    ])
}

pub(crate) fn two_arm_model() -> KinematicModel {
    KinematicModel::build(&two_arm_description(), &two_arm_groups()).unwrap()
}
