//! The global state-vector layout of a model.
//!
//! A [`StateLayout`] is fixed once the model is built and is shared through an
//! `Arc` by the model and every [`KinematicState`](crate::KinematicState)
//! bound to it, so states never need to touch the model itself.

use std::ops::Range;

use hashbrown::HashMap;

use super::error::LookupError;
use super::utils::{default_value, normalize_angle};

#[derive(Debug, Clone, PartialEq)]
pub struct JointSlot {
    pub name: String,
    pub state_index: usize,
    pub used_params: usize,
}

impl JointSlot {
    pub fn range(&self) -> Range<usize> {
        self.state_index..self.state_index + self.used_params
    }
}

#[derive(Debug, Clone)]
pub struct StateLayout {
    dimension: usize,
    // (min, max) of component i at (2i, 2i + 1)
    bounds: Vec<f64>,
    // components that wrap around instead of being clamped
    wraps: Vec<bool>,
    joints: Vec<JointSlot>,
    joint_map: HashMap<String, usize>,
    // group name -> global index of each group component
    groups: HashMap<String, Vec<usize>>,
}

impl StateLayout {
    pub(crate) fn new(joints: Vec<JointSlot>, bounds: Vec<f64>, wraps: Vec<bool>) -> Self {
        let dimension = joints.iter().map(|j| j.used_params).sum();
        debug_assert_eq!(bounds.len(), 2 * dimension);
        debug_assert_eq!(wraps.len(), dimension);
        let joint_map = joints
            .iter()
            .enumerate()
            .map(|(i, j)| (j.name.clone(), i))
            .collect();
        Self {
            dimension,
            bounds,
            wraps,
            joints,
            joint_map,
            groups: HashMap::new(),
        }
    }

    pub(crate) fn set_groups(&mut self, groups: HashMap<String, Vec<usize>>) {
        self.groups = groups;
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn bound(&self, index: usize) -> (f64, f64) {
        (self.bounds[2 * index], self.bounds[2 * index + 1])
    }

    pub fn wraps(&self, index: usize) -> bool {
        self.wraps[index]
    }

    /// Joints in state-vector order.
    pub fn joints(&self) -> &[JointSlot] {
        &self.joints
    }

    pub fn joint(&self, name: &str) -> Result<&JointSlot, LookupError> {
        self.joint_map
            .get(name)
            .map(|&i| &self.joints[i])
            .ok_or_else(|| LookupError::Joint(name.to_string()))
    }

    pub fn group(&self, name: &str) -> Result<&[usize], LookupError> {
        self.groups
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::Group(name.to_string()))
    }

    /// Global indices of the named joints' parameters, concatenated in order.
    pub fn joints_indices(&self, names: &[&str]) -> Result<Vec<usize>, LookupError> {
        let mut indices = Vec::new();
        for name in names {
            indices.extend(self.joint(name)?.range());
        }
        Ok(indices)
    }

    pub(crate) fn default_value(&self, index: usize) -> f64 {
        let (low, high) = self.bound(index);
        default_value(low, high)
    }

    pub(crate) fn enforce(&self, index: usize, value: f64) -> f64 {
        let (low, high) = self.bound(index);
        if self.wraps[index] {
            normalize_angle(value)
        } else if value > high {
            high
        } else if value < low {
            low
        } else {
            value
        }
    }

    pub(crate) fn within(&self, index: usize, value: f64) -> bool {
        let (low, high) = self.bound(index);
        value >= low && value <= high
    }
}
