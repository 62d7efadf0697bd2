use thiserror::Error;

/// A name that does not resolve against the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("joint '{0}' not found")]
    Joint(String),

    #[error("link '{0}' not found")]
    Link(String),

    #[error("joint group '{0}' not found")]
    Group(String),
}

/// Failures while building a [`KinematicModel`](crate::KinematicModel) or
/// editing its attached bodies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("unknown joint type '{kind}' for joint '{joint}'")]
    UnknownJointType { joint: String, kind: String },

    #[error("duplicate joint name '{0}'")]
    DuplicateJoint(String),

    #[error("duplicate link name '{0}'")]
    DuplicateLink(String),

    #[error("joint '{joint}' references missing parent link '{link}'")]
    MissingParentLink { joint: String, link: String },

    #[error("joint '{joint}' references missing child link '{link}'")]
    MissingChildLink { joint: String, link: String },

    #[error("link '{0}' is the child of more than one joint")]
    MultipleParents(String),

    #[error("description has no root link")]
    NoRootLink,

    #[error("description has more than one root link: {0:?}")]
    MultipleRootLinks(Vec<String>),

    #[error("joints form a cycle")]
    Cycle,

    #[error("joint '{joint}' expects {expected} limit pair(s), got {got}")]
    MissingLimits {
        joint: String,
        expected: usize,
        got: usize,
    },

    #[error("joint '{joint}' has invalid limits [{lower}, {upper}]")]
    InvalidLimits {
        joint: String,
        lower: f64,
        upper: f64,
    },

    #[error("joint '{0}' has a zero-length axis")]
    InvalidAxis(String),

    #[error("group '{group}' references unknown joint '{joint}'")]
    UnknownGroupJoint { group: String, joint: String },

    #[error("link '{link}' already carries an attached body '{id}'")]
    DuplicateAttachedBody { link: String, id: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
