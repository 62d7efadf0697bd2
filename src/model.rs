use std::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use nalgebra::Isometry3;
use petgraph::algo::is_cyclic_directed;

use super::bfs::{bfs, dfs_preorder, LinkGraph};
use super::config::ModelOptions;
use super::description::{GroupSpecs, ModelDescription};
use super::error::{LookupError, ModelError};
use super::group::JointGroup;
use super::joint::{construct_joint, construct_root_joint, Joint, JointId};
use super::layout::{JointSlot, StateLayout};
use super::link::{AttachedBody, Link, LinkId};
use super::state::KinematicState;
use super::utils::pose_to_isometry;

/// A rooted tree of links and joints, plus the layout of the flat parameter
/// vector that drives it.
///
/// Joints are stored in depth-first order from the root, which is also the
/// order of their parameters in the state vector. Link `i` is always the child
/// of joint `i`; joint 0 is the synthesized root joint and link 0 the root link.
///
/// Topology never changes after [`KinematicModel::build`]. The pose caches on
/// joints, links and attached bodies are rewritten by every forward kinematics
/// pass, which is why those passes need `&mut self`.
#[derive(Debug, Clone)]
pub struct KinematicModel {
    name: String,
    joints: Vec<Joint>,
    links: Vec<Link>,
    joint_map: HashMap<String, JointId>,
    link_map: HashMap<String, LinkId>,
    groups: HashMap<String, JointGroup>,
    // parent link -> child link, weighted by the joint in between
    pub(crate) link_graph: LinkGraph,
    // every link, parents first
    updated_links: Vec<LinkId>,
    root_transform: Isometry3<f64>,
    layout: Arc<StateLayout>,
}

impl KinematicModel {
    pub fn build(description: &ModelDescription, groups: &GroupSpecs) -> Result<Self, ModelError> {
        Self::build_with_options(description, groups, &ModelOptions::default())
    }

    pub fn build_with_options(
        description: &ModelDescription,
        groups: &GroupSpecs,
        options: &ModelOptions,
    ) -> Result<Self, ModelError> {
        let mut link_index: HashMap<&str, usize> =
            HashMap::with_capacity(description.links.len());
        for (i, link) in description.links.iter().enumerate() {
            if link_index.insert(link.name.as_str(), i).is_some() {
                return Err(ModelError::DuplicateLink(link.name.clone()));
            }
        }

        // resolve every described joint before looking at the topology
        let mut joint_names: HashSet<&str> =
            HashSet::with_capacity(description.joints.len() + 1);
        joint_names.insert(options.root_joint_name.as_str());
        let mut resolved = Vec::with_capacity(description.joints.len());
        // description link -> description joint it hangs from
        let mut parent_of: HashMap<usize, usize> =
            HashMap::with_capacity(description.joints.len());
        let mut description_graph = LinkGraph::new();
        for i in 0..description.links.len() {
            description_graph.add_node(i);
        }

        for (j, joint) in description.joints.iter().enumerate() {
            if !joint_names.insert(joint.name.as_str()) {
                return Err(ModelError::DuplicateJoint(joint.name.clone()));
            }
            let parent = *link_index
                .get(joint.parent.as_str())
                .ok_or_else(|| ModelError::MissingParentLink {
                    joint: joint.name.clone(),
                    link: joint.parent.clone(),
                })?;
            let child = *link_index
                .get(joint.child.as_str())
                .ok_or_else(|| ModelError::MissingChildLink {
                    joint: joint.name.clone(),
                    link: joint.child.clone(),
                })?;
            if parent_of.insert(child, j).is_some() {
                return Err(ModelError::MultipleParents(joint.child.clone()));
            }
            description_graph.add_edge(parent, child, j);
            resolved.push(construct_joint(joint, options)?);
        }

        let roots: Vec<usize> = (0..description.links.len())
            .filter(|i| !parent_of.contains_key(i))
            .collect();
        let root = match roots.as_slice() {
            [root] => *root,
            [] if is_cyclic_directed(&description_graph) => return Err(ModelError::Cycle),
            [] => return Err(ModelError::NoRootLink),
            _ => {
                return Err(ModelError::MultipleRootLinks(
                    roots.iter().map(|&i| description.links[i].name.clone()).collect(),
                ))
            }
        };

        // with one parent per link and a single parentless link, anything the
        // root does not reach hangs off a cycle
        let order = dfs_preorder(&description_graph, root);
        if order.len() < description.links.len() {
            return Err(ModelError::Cycle);
        }

        // lay out joints and links in traversal order
        let mut joints = Vec::with_capacity(order.len());
        let mut links: Vec<Link> = Vec::with_capacity(order.len());
        let mut slots = Vec::with_capacity(order.len());
        let mut bounds = Vec::new();
        let mut wraps = Vec::new();
        let mut new_index: HashMap<usize, usize> = HashMap::with_capacity(order.len());
        let mut link_graph = LinkGraph::new();
        let mut dimension = 0;

        for (i, &described_link) in order.iter().enumerate() {
            new_index.insert(described_link, i);
            let link_description = &description.links[described_link];

            let parent_joint = parent_of.get(&described_link);
            let (name, kind, joint_bounds, parent_link, local_offset) = match parent_joint {
                None => {
                    let (kind, joint_bounds) = construct_root_joint(options);
                    (
                        options.root_joint_name.clone(),
                        kind,
                        joint_bounds,
                        None,
                        Isometry3::identity(),
                    )
                }
                Some(&j) => {
                    let joint_description = &description.joints[j];
                    let (kind, joint_bounds) = resolved[j].clone();
                    // parents are always visited first
                    let parent = new_index[&link_index[joint_description.parent.as_str()]];
                    (
                        joint_description.name.clone(),
                        kind,
                        joint_bounds,
                        Some(LinkId(parent)),
                        pose_to_isometry(&joint_description.origin),
                    )
                }
            };

            let used_params = kind.used_params();
            slots.push(JointSlot {
                name: name.clone(),
                state_index: dimension,
                used_params,
            });
            for (low, high) in &joint_bounds {
                bounds.push(*low);
                bounds.push(*high);
            }
            wraps.extend(std::iter::repeat(kind.wraps()).take(used_params));

            link_graph.add_node(i);
            if let Some(parent) = parent_link {
                link_graph.add_edge(parent.index(), i, i);
                links[parent.index()].child_joints.push(JointId(i));
            }

            joints.push(Joint {
                name,
                local_transform: kind.transform(&[0.0; 7][..used_params]),
                kind,
                parent_link,
                child_link: LinkId(i),
                state_index: dimension,
            });
            links.push(Link {
                name: link_description.name.clone(),
                parent_joint: JointId(i),
                child_joints: Vec::new(),
                local_offset,
                collision_offset: pose_to_isometry(&link_description.collision_origin),
                shape: link_description.shape.clone(),
                attached_bodies: Vec::new(),
                global_transform: Isometry3::identity(),
                global_collision_transform: Isometry3::identity(),
            });
            dimension += used_params;
        }

        let joint_map = joints
            .iter()
            .enumerate()
            .map(|(i, j)| (j.name.clone(), JointId(i)))
            .collect();
        let link_map = links
            .iter()
            .enumerate()
            .map(|(i, l)| (l.name.clone(), LinkId(i)))
            .collect();
        let updated_links = (0..links.len()).map(LinkId).collect();

        let mut model = Self {
            name: description.name.clone(),
            joints,
            links,
            joint_map,
            link_map,
            groups: HashMap::new(),
            link_graph,
            updated_links,
            root_transform: Isometry3::identity(),
            layout: Arc::new(StateLayout::new(slots, bounds, wraps)),
        };

        model.groups = model.build_groups(groups)?;
        let group_indices = model
            .groups
            .iter()
            .map(|(name, group)| (name.clone(), group.state_index().to_vec()))
            .collect();
        Arc::make_mut(&mut model.layout).set_groups(group_indices);

        model.compute_default_transforms();

        tracing::debug!(
            model = %model.name,
            dimension,
            links = model.links.len(),
            groups = model.groups.len(),
            "built kinematic model"
        );
        Ok(model)
    }

    fn build_groups(&self, specs: &GroupSpecs) -> Result<HashMap<String, JointGroup>, ModelError> {
        let mut groups = HashMap::with_capacity(specs.len());
        for (name, members) in specs {
            let mut joints = Vec::with_capacity(members.len());
            for member in members {
                let id = self.joint_id(member).ok_or_else(|| ModelError::UnknownGroupJoint {
                    group: name.clone(),
                    joint: member.clone(),
                })?;
                if joints.contains(&id) {
                    tracing::warn!(
                        group = %name,
                        joint = %member,
                        "joint listed twice in group; keeping the first"
                    );
                    continue;
                }
                joints.push(id);
            }
            groups.insert(name.clone(), JointGroup::new(self, name.clone(), joints));
        }
        Ok(groups)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of scalar parameters in the state vector.
    pub fn dimension(&self) -> usize {
        self.layout.dimension()
    }

    /// `(min, max)` of parameter `i` at `[2i]` and `[2i + 1]`.
    pub fn state_bounds(&self) -> &[f64] {
        self.layout.bounds()
    }

    pub fn layout(&self) -> &Arc<StateLayout> {
        &self.layout
    }

    pub fn root(&self) -> &Joint {
        &self.joints[0]
    }

    pub fn root_link(&self) -> &Link {
        &self.links[0]
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_map.get(name).map(|&id| &self.joints[id.0])
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.link_map.get(name).map(|&id| &self.links[id.0])
    }

    pub fn group(&self, name: &str) -> Option<&JointGroup> {
        self.groups.get(name)
    }

    pub fn joint_id(&self, name: &str) -> Option<JointId> {
        self.joint_map.get(name).copied()
    }

    pub fn link_id(&self, name: &str) -> Option<LinkId> {
        self.link_map.get(name).copied()
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    pub fn joint_by_id(&self, id: JointId) -> &Joint {
        &self.joints[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    pub fn link_by_id(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn has_joint(&self, name: &str) -> bool {
        self.joint_map.contains_key(name)
    }

    pub fn has_link(&self, name: &str) -> bool {
        self.link_map.contains_key(name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Joint names in state-vector order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name()).collect()
    }

    /// Link names, parents before children.
    pub fn link_names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name()).collect()
    }

    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Groups sorted by name.
    pub fn groups(&self) -> Vec<&JointGroup> {
        let mut groups: Vec<&JointGroup> = self.groups.values().collect();
        groups.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        groups
    }

    pub fn single_dof_joints(&self) -> Vec<&Joint> {
        self.joints.iter().filter(|j| j.used_params() == 1).collect()
    }

    pub fn multi_dof_joints(&self) -> Vec<&Joint> {
        self.joints.iter().filter(|j| j.used_params() > 1).collect()
    }

    pub fn child_links(&self, link: LinkId) -> Vec<LinkId> {
        self.link_graph.neighbors(link.0).map(LinkId).collect()
    }

    pub fn child_joints(&self, joint: JointId) -> &[JointId] {
        self.links[self.joints[joint.0].child_link.0].child_joints()
    }

    /// Every attached body in the model, with the link carrying it.
    pub fn attached_bodies(&self) -> Vec<(&Link, &AttachedBody)> {
        self.links
            .iter()
            .flat_map(|link| link.attached_bodies().iter().map(move |body| (link, body)))
            .collect()
    }

    pub fn root_transform(&self) -> &Isometry3<f64> {
        &self.root_transform
    }

    /// Pose of the whole model in the world. Takes effect on the next
    /// forward kinematics pass.
    pub fn set_root_transform(&mut self, transform: Isometry3<f64>) {
        self.root_transform = transform;
    }

    /// Default value of every parameter: 0 when within bounds, otherwise the
    /// middle of the bounds.
    pub fn default_params(&self) -> Vec<f64> {
        (0..self.dimension()).map(|i| self.layout.default_value(i)).collect()
    }

    /// Run forward kinematics over the whole tree.
    ///
    /// # Panics
    ///
    /// Panics if `params.len() != self.dimension()`.
    pub fn compute_transforms(&mut self, params: &[f64]) {
        assert_eq!(
            params.len(),
            self.dimension(),
            "parameter vector does not match the model dimension"
        );
        for joint in &mut self.joints {
            let range = joint.state_range();
            joint.update_local_transform(&params[range]);
        }
        propagate(&self.joints, &mut self.links, &self.root_transform, &self.updated_links);
    }

    /// Run forward kinematics for the members of `group` only.
    ///
    /// `params` is in the group's own layout. Joints outside the group keep
    /// their cached local transform; every link below a member joint is
    /// still moved.
    ///
    /// # Panics
    ///
    /// Panics if `params.len() != group.dimension()`.
    pub fn compute_transforms_group(&mut self, params: &[f64], group: &JointGroup) {
        compute_group(&mut self.joints, &mut self.links, &self.root_transform, params, group);
    }

    pub fn compute_transforms_group_named(
        &mut self,
        params: &[f64],
        group: &str,
    ) -> Result<(), LookupError> {
        let group = self
            .groups
            .get(group)
            .ok_or_else(|| LookupError::Group(group.to_string()))?;
        compute_group(&mut self.joints, &mut self.links, &self.root_transform, params, group);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `state` was created for a model of another dimension.
    pub fn compute_state_transforms(&mut self, state: &KinematicState) {
        self.compute_transforms(state.params());
    }

    pub fn compute_default_transforms(&mut self) {
        let params = self.default_params();
        self.compute_transforms(&params);
    }

    /// Move the members of `group` to their default values.
    pub fn compute_default_transforms_group(&mut self, group: &JointGroup) {
        let params = group.default_params();
        self.compute_transforms_group(&params, group);
    }

    pub fn compute_default_transforms_group_named(
        &mut self,
        group: &str,
    ) -> Result<(), LookupError> {
        let group = self
            .groups
            .get(group)
            .ok_or_else(|| LookupError::Group(group.to_string()))?;
        let params = group.default_params();
        compute_group(&mut self.joints, &mut self.links, &self.root_transform, &params, group);
        Ok(())
    }

    /// Pin `link` at `transform` and carry every link below it along, using
    /// the cached joint transforms.
    pub fn update_transforms_with_link_at(
        &mut self,
        link: &str,
        transform: Isometry3<f64>,
    ) -> Result<(), LookupError> {
        let id = self.link_id(link).ok_or_else(|| LookupError::Link(link.to_string()))?;
        self.links[id.0].set_global_transform(transform);
        let descendants: Vec<LinkId> = bfs(&self.link_graph, id.0)
            .into_iter()
            .skip(1)
            .map(LinkId)
            .collect();
        propagate(&self.joints, &mut self.links, &self.root_transform, &descendants);
        Ok(())
    }

    /// Attach `body` to `link`, placing it from the link's cached pose.
    pub fn attach_body(&mut self, link: &str, mut body: AttachedBody) -> Result<(), ModelError> {
        let id = self.link_id(link).ok_or_else(|| LookupError::Link(link.to_string()))?;
        let link = &mut self.links[id.0];
        if link.attached_body(body.id()).is_some() {
            return Err(ModelError::DuplicateAttachedBody {
                link: link.name.clone(),
                id: body.id().to_string(),
            });
        }
        body.compute_transforms(&link.global_transform);
        tracing::debug!(link = %link.name, body = body.id(), "attached body");
        link.attached_bodies.push(body);
        Ok(())
    }

    /// Swap the bodies carried by `link`, returning the previous ones.
    pub fn replace_attached_bodies(
        &mut self,
        link: &str,
        mut bodies: Vec<AttachedBody>,
    ) -> Result<Vec<AttachedBody>, ModelError> {
        let id = self.link_id(link).ok_or_else(|| LookupError::Link(link.to_string()))?;
        {
            let mut ids = HashSet::with_capacity(bodies.len());
            for body in &bodies {
                if !ids.insert(body.id()) {
                    return Err(ModelError::DuplicateAttachedBody {
                        link: link.to_string(),
                        id: body.id().to_string(),
                    });
                }
            }
        }
        let link = &mut self.links[id.0];
        for body in &mut bodies {
            body.compute_transforms(&link.global_transform);
        }
        tracing::debug!(link = %link.name, count = bodies.len(), "replaced attached bodies");
        Ok(std::mem::replace(&mut link.attached_bodies, bodies))
    }

    pub fn clear_attached_bodies(
        &mut self,
        link: &str,
    ) -> Result<Vec<AttachedBody>, LookupError> {
        let id = self.link_id(link).ok_or_else(|| LookupError::Link(link.to_string()))?;
        Ok(std::mem::take(&mut self.links[id.0].attached_bodies))
    }
}

// recompute global poses of `order`, whose parents must already be up to date
fn propagate(
    joints: &[Joint],
    links: &mut [Link],
    root_transform: &Isometry3<f64>,
    order: &[LinkId],
) {
    for &id in order {
        let joint = &joints[links[id.0].parent_joint.0];
        let parent = match joint.parent_link {
            Some(parent) => links[parent.0].global_transform,
            None => *root_transform,
        };
        let global = parent * joint.local_transform * links[id.0].local_offset;
        links[id.0].set_global_transform(global);
    }
}

fn compute_group(
    joints: &mut [Joint],
    links: &mut [Link],
    root_transform: &Isometry3<f64>,
    params: &[f64],
    group: &JointGroup,
) {
    assert_eq!(
        params.len(),
        group.dimension(),
        "parameter vector does not match the group dimension"
    );
    for (&id, &start) in group.joints().iter().zip(group.joint_index()) {
        let joint = &mut joints[id.0];
        let end = start + joint.used_params();
        joint.update_local_transform(&params[start..end]);
    }
    propagate(joints, links, root_transform, group.updated_links());
}

// rounding noise would otherwise print as -0.000
fn tidy(value: f64) -> f64 {
    if value.abs() < 5e-4 {
        0.0
    } else {
        value
    }
}

impl fmt::Display for KinematicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Model '{}' rooted at '{}', dimension {}",
            self.name,
            self.root_link().name(),
            self.dimension()
        )?;
        writeln!(f, "Joints:")?;
        for joint in &self.joints {
            let range = joint.state_range();
            write!(f, "  {} ({})", joint.name(), joint.kind().joint_type())?;
            if range.is_empty() {
                writeln!(f)?;
            } else {
                let bounds: Vec<String> = range
                    .map(|i| {
                        let (low, high) = self.layout.bound(i);
                        format!("[{low}, {high}]")
                    })
                    .collect();
                writeln!(f, " at {}: {}", joint.state_index(), bounds.join(" "))?;
            }
        }
        writeln!(f, "Links:")?;
        for link in &self.links {
            let pose = link.global_transform();
            let t = &pose.translation.vector;
            let (roll, pitch, yaw) = pose.rotation.euler_angles();
            write!(
                f,
                "  {} at [{:.3}, {:.3}, {:.3}] rpy [{:.3}, {:.3}, {:.3}]",
                link.name(),
                tidy(t.x),
                tidy(t.y),
                tidy(t.z),
                tidy(roll),
                tidy(pitch),
                tidy(yaw)
            )?;
            if link.attached_bodies().is_empty() {
                writeln!(f)?;
            } else {
                let ids: Vec<&str> = link.attached_bodies().iter().map(|b| b.id()).collect();
                writeln!(f, ", carrying {:?}", ids)?;
            }
        }
        writeln!(f, "Groups:")?;
        for group in self.groups() {
            let roots: Vec<&str> = group
                .roots()
                .iter()
                .map(|&r| self.joint_by_id(r).name())
                .collect();
            writeln!(
                f,
                "  {}: roots {:?}, state components {:?}",
                group.name(),
                roots,
                group.state_index()
            )?;
        }
        Ok(())
    }
}
