use hashbrown::{HashMap, HashSet};

use super::bfs::bfs;
use super::joint::JointId;
use super::link::LinkId;
use super::model::KinematicModel;
use super::utils::default_value;

/// A named, ordered subset of a model's joints with its own compact
/// parameter space.
///
/// Everything derived from the member list (sub-indices, roots, the links to
/// revisit) is computed in [`JointGroup::new`] and never patched afterwards.
/// Groups are only meaningful together with the model they were built from.
#[derive(Debug, Clone)]
pub struct JointGroup {
    name: String,
    // member joints, in group-state order
    joints: Vec<JointId>,
    joint_names: Vec<String>,
    // where each member starts within the group state
    joint_index: Vec<usize>,
    dimension: usize,
    // global state index of each group component
    state_index: Vec<usize>,
    // (min, max) of group component i at (2i, 2i + 1)
    state_bounds: Vec<f64>,
    // members with no member ancestor
    roots: Vec<JointId>,
    // links revisited by a group-scoped pass, parents first
    updated_links: Vec<LinkId>,
    joint_map: HashMap<String, usize>,
}

impl JointGroup {
    pub(crate) fn new(model: &KinematicModel, name: String, joints: Vec<JointId>) -> Self {
        let mut joint_names = Vec::with_capacity(joints.len());
        let mut joint_index = Vec::with_capacity(joints.len());
        let mut joint_map = HashMap::with_capacity(joints.len());
        let mut state_index = Vec::new();
        let mut dimension = 0;

        for (position, &id) in joints.iter().enumerate() {
            let joint = model.joint_by_id(id);
            joint_names.push(joint.name().to_string());
            joint_index.push(dimension);
            joint_map.insert(joint.name().to_string(), position);
            dimension += joint.used_params();
            state_index.extend(joint.state_range());
        }

        let state_bounds = state_index
            .iter()
            .flat_map(|&i| {
                let (low, high) = model.layout().bound(i);
                [low, high]
            })
            .collect();

        let members: HashSet<JointId> = joints.iter().copied().collect();
        let roots: Vec<JointId> = joints
            .iter()
            .copied()
            .filter(|&id| !has_member_ancestor(model, id, &members))
            .collect();

        // subtrees below distinct roots never overlap
        let updated_links = roots
            .iter()
            .flat_map(|&root| {
                bfs(&model.link_graph, model.joint_by_id(root).child_link().index())
            })
            .map(LinkId)
            .collect();

        tracing::debug!(
            group = %name,
            dimension,
            roots = roots.len(),
            "built joint group"
        );

        Self {
            name,
            joints,
            joint_names,
            joint_index,
            dimension,
            state_index,
            state_bounds,
            roots,
            updated_links,
            joint_map,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn joint_index(&self) -> &[usize] {
        &self.joint_index
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn state_index(&self) -> &[usize] {
        &self.state_index
    }

    /// `(min, max)` of group component `i` at `[2i]` and `[2i + 1]`.
    pub fn state_bounds(&self) -> &[f64] {
        &self.state_bounds
    }

    /// Default value of every group component, in the group's own layout.
    pub fn default_params(&self) -> Vec<f64> {
        self.state_bounds
            .chunks_exact(2)
            .map(|bound| default_value(bound[0], bound[1]))
            .collect()
    }

    pub fn roots(&self) -> &[JointId] {
        &self.roots
    }

    pub fn updated_links(&self) -> &[LinkId] {
        &self.updated_links
    }

    pub fn has_joint(&self, joint: &str) -> bool {
        self.joint_map.contains_key(joint)
    }

    /// Position of a joint in the group's member list.
    pub fn joint_position(&self, joint: &str) -> Option<usize> {
        self.joint_map.get(joint).copied()
    }

    pub fn single_dof_joints(&self, model: &KinematicModel) -> Vec<JointId> {
        self.joints
            .iter()
            .copied()
            .filter(|&id| model.joint_by_id(id).used_params() == 1)
            .collect()
    }

    pub fn multi_dof_joints(&self, model: &KinematicModel) -> Vec<JointId> {
        self.joints
            .iter()
            .copied()
            .filter(|&id| model.joint_by_id(id).used_params() > 1)
            .collect()
    }

    /// Whether every joint of `other` is also in this group.
    pub fn contains_group(&self, other: &JointGroup) -> bool {
        other.joint_names.iter().all(|name| self.has_joint(name))
    }

    /// Union of both groups' joints, ordered as in the global state vector.
    pub fn add_group(&self, other: &JointGroup, model: &KinematicModel) -> JointGroup {
        let mut joints: Vec<JointId> = self.joints.clone();
        joints.extend(other.joints.iter().copied().filter(|&id| !self.contains(id)));
        joints.sort_unstable();
        JointGroup::new(model, format!("{}+{}", self.name, other.name), joints)
    }

    /// This group's joints minus `other`'s, ordered as in the global state vector.
    pub fn remove_group(&self, other: &JointGroup, model: &KinematicModel) -> JointGroup {
        let mut joints: Vec<JointId> = self
            .joints
            .iter()
            .copied()
            .filter(|&id| !other.contains(id))
            .collect();
        joints.sort_unstable();
        JointGroup::new(model, format!("{}-{}", self.name, other.name), joints)
    }

    fn contains(&self, id: JointId) -> bool {
        self.joints.contains(&id)
    }
}

fn has_member_ancestor(model: &KinematicModel, id: JointId, members: &HashSet<JointId>) -> bool {
    let mut joint = model.joint_by_id(id);
    while let Some(parent_link) = joint.parent_link() {
        let parent_joint = model.link_by_id(parent_link).parent_joint();
        if members.contains(&parent_joint) {
            return true;
        }
        joint = model.joint_by_id(parent_joint);
    }
    false
}
