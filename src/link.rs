use nalgebra::Isometry3;

use super::description::Shape;
use super::joint::JointId;

/// Stable handle of a link inside its model. Links are numbered so that a
/// parent always comes before its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Geometry rigidly fixed to a link, e.g. a grasped object.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedBody {
    id: String,
    shapes: Vec<Shape>,
    // offsets of each shape relative to the owning link
    fixed_transforms: Vec<Isometry3<f64>>,
    // links this body may touch; consumed by collision checking
    touch_links: Vec<String>,
    global_transforms: Vec<Isometry3<f64>>,
}

impl AttachedBody {
    pub fn new(
        id: impl Into<String>,
        shapes: impl IntoIterator<Item = (Shape, Isometry3<f64>)>,
        touch_links: Vec<String>,
    ) -> Self {
        let (shapes, fixed_transforms): (Vec<_>, Vec<_>) = shapes.into_iter().unzip();
        let global_transforms = vec![Isometry3::identity(); shapes.len()];
        Self {
            id: id.into(),
            shapes,
            fixed_transforms,
            touch_links,
            global_transforms,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn fixed_transforms(&self) -> &[Isometry3<f64>] {
        &self.fixed_transforms
    }

    pub fn touch_links(&self) -> &[String] {
        &self.touch_links
    }

    pub fn global_transforms(&self) -> &[Isometry3<f64>] {
        &self.global_transforms
    }

    pub(crate) fn compute_transforms(&mut self, link_transform: &Isometry3<f64>) {
        for (global, fixed) in self.global_transforms.iter_mut().zip(&self.fixed_transforms) {
            *global = link_transform * fixed;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) name: String,
    pub(crate) parent_joint: JointId,
    pub(crate) child_joints: Vec<JointId>,

    // constant offset applied after the parent joint's motion
    pub(crate) local_offset: Isometry3<f64>,
    pub(crate) collision_offset: Isometry3<f64>,
    pub(crate) shape: Option<Shape>,
    pub(crate) attached_bodies: Vec<AttachedBody>,

    // computed by forward kinematics
    pub(crate) global_transform: Isometry3<f64>,
    pub(crate) global_collision_transform: Isometry3<f64>,
}

impl Link {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_joint(&self) -> JointId {
        self.parent_joint
    }

    pub fn child_joints(&self) -> &[JointId] {
        &self.child_joints
    }

    pub fn local_offset(&self) -> &Isometry3<f64> {
        &self.local_offset
    }

    pub fn collision_offset(&self) -> &Isometry3<f64> {
        &self.collision_offset
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    pub fn attached_bodies(&self) -> &[AttachedBody] {
        &self.attached_bodies
    }

    pub fn attached_body(&self, id: &str) -> Option<&AttachedBody> {
        self.attached_bodies.iter().find(|b| b.id == id)
    }

    /// Pose of the link frame, as of the last forward kinematics pass.
    pub fn global_transform(&self) -> &Isometry3<f64> {
        &self.global_transform
    }

    pub fn global_collision_transform(&self) -> &Isometry3<f64> {
        &self.global_collision_transform
    }

    // place the link and carry its collision geometry and attached bodies along
    pub(crate) fn set_global_transform(&mut self, transform: Isometry3<f64>) {
        self.global_transform = transform;
        self.global_collision_transform = transform * self.collision_offset;
        for body in &mut self.attached_bodies {
            body.compute_transforms(&self.global_transform);
        }
    }
}
