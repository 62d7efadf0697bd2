//! Kinematic trees: links connected by joints, driven by one flat parameter
//! vector.
//!
//! A [`KinematicModel`] is built once from a [`ModelDescription`] and a set of
//! named joint groups. Any number of [`KinematicState`]s hold parameter values
//! for it; feeding one to [`KinematicModel::compute_state_transforms`] places
//! every link and attached body in the world.
//!
//! ```
//! use kinematic_tree::{
//!     GroupSpecs, JointDescription, KinematicModel, KinematicState, LinkDescription,
//!     ModelDescription, Pose,
//! };
//!
//! let description = ModelDescription::new("pendulum")
//!     .link(LinkDescription::new("base"))
//!     .link(LinkDescription::new("bob"))
//!     .joint(
//!         JointDescription::revolute("swing", "base", "bob", [0.0, 0.0, 1.0], -1.0, 1.0)
//!             .with_origin(Pose::from_xyz(1.0, 0.0, 0.0)),
//!     );
//! let mut model = KinematicModel::build(&description, &GroupSpecs::new()).unwrap();
//!
//! let mut state = KinematicState::new(&model, 0);
//! state.set_params(&[0.0]);
//! model.compute_state_transforms(&state);
//! let bob = model.link("bob").unwrap().global_transform();
//! assert!((bob.translation.vector.x - 1.0).abs() < 1e-12);
//! ```

mod bfs;
mod config;
mod description;
mod error;
mod group;
mod joint;
mod layout;
mod link;
mod model;
mod shared;
mod state;
mod utils;

#[cfg(test)]
mod fixtures;

pub use config::{ModelOptions, RootJointType};
pub use description::{
    GroupSpecs, JointDescription, Limits, LinkDescription, ModelDescription, Pose, Shape,
};
pub use error::{LookupError, ModelError};
pub use group::JointGroup;
pub use joint::{Joint, JointId, JointKind, JointType, ParseJointTypeError};
pub use layout::{JointSlot, StateLayout};
pub use link::{AttachedBody, Link, LinkId};
pub use model::KinematicModel;
pub use shared::SharedModel;
pub use state::{GroupName, JointName, JointNames, KinematicState, Selection};
