//! Per-context parameter buffers.
//!
//! A [`KinematicState`] owns one value and one "seen" flag per state
//! component, plus its own seeded generator. It only holds the model's
//! [`StateLayout`], so it can be filled, randomized and checked on any thread
//! without touching the model.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::error::LookupError;
use super::group::JointGroup;
use super::layout::StateLayout;
use super::model::KinematicModel;

/// A subset of state components: a group, a named group, one joint or a
/// list of joints.
pub trait Selection {
    /// Global indices of the selected components, in selection order.
    fn indices<'a>(&'a self, layout: &'a StateLayout) -> Result<Cow<'a, [usize]>, LookupError>;
}

impl Selection for JointGroup {
    fn indices<'a>(&'a self, _layout: &'a StateLayout) -> Result<Cow<'a, [usize]>, LookupError> {
        Ok(Cow::Borrowed(self.state_index()))
    }
}

/// A group of the model, by name.
#[derive(Debug, Clone, Copy)]
pub struct GroupName<'n>(pub &'n str);

impl Selection for GroupName<'_> {
    fn indices<'a>(&'a self, layout: &'a StateLayout) -> Result<Cow<'a, [usize]>, LookupError> {
        layout.group(self.0).map(Cow::Borrowed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JointName<'n>(pub &'n str);

impl Selection for JointName<'_> {
    fn indices<'a>(&'a self, layout: &'a StateLayout) -> Result<Cow<'a, [usize]>, LookupError> {
        Ok(Cow::Owned(layout.joint(self.0)?.range().collect()))
    }
}

/// Several joints; their parameters are concatenated in list order.
#[derive(Debug, Clone, Copy)]
pub struct JointNames<'n>(pub &'n [&'n str]);

impl Selection for JointNames<'_> {
    fn indices<'a>(&'a self, layout: &'a StateLayout) -> Result<Cow<'a, [usize]>, LookupError> {
        layout.joints_indices(self.0).map(Cow::Owned)
    }
}

/// Parameter values for one model, owned by a single computation context.
///
/// Cloning copies the values, the seen flags and the generator state; the
/// layout is shared.
#[derive(Debug, Clone)]
pub struct KinematicState {
    layout: Arc<StateLayout>,
    params: Vec<f64>,
    // set since the last reset
    seen: Vec<bool>,
    rng: ChaCha8Rng,
}

impl KinematicState {
    /// A state holding the model's default values, with nothing marked seen.
    pub fn new(model: &KinematicModel, seed: u64) -> Self {
        Self::with_layout(Arc::clone(model.layout()), seed)
    }

    pub fn with_layout(layout: Arc<StateLayout>, seed: u64) -> Self {
        let dimension = layout.dimension();
        let mut state = Self {
            layout,
            params: vec![0.0; dimension],
            seen: vec![false; dimension],
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        state.default_params();
        state.reset();
        state
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn layout(&self) -> &Arc<StateLayout> {
        &self.layout
    }

    pub fn dimension(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn params_joint(&self, joint: &str) -> Result<&[f64], LookupError> {
        let range = self.layout.joint(joint)?.range();
        Ok(&self.params[range])
    }

    /// Values of the selected components, in selection order.
    pub fn params_for(&self, selection: &impl Selection) -> Result<Vec<f64>, LookupError> {
        let indices = selection.indices(&self.layout)?;
        Ok(indices.iter().map(|&i| self.params[i]).collect())
    }

    fn default_at(&mut self, i: usize) {
        self.params[i] = self.layout.default_value(i);
        self.seen[i] = true;
    }

    fn random_at(&mut self, i: usize) {
        let (low, high) = self.layout.bound(i);
        self.params[i] = low + (high - low) * self.rng.gen::<f64>();
        self.seen[i] = true;
    }

    fn perturb_at(&mut self, i: usize, factor: f64) {
        let (low, high) = self.layout.bound(i);
        let offset = factor * (high - low) * (2.0 * self.rng.gen::<f64>() - 1.0);
        self.params[i] = self.layout.enforce(i, self.params[i] + offset);
    }

    fn enforce_at(&mut self, i: usize) {
        self.params[i] = self.layout.enforce(i, self.params[i]);
    }

    fn set_at(&mut self, i: usize, value: f64) -> bool {
        if self.params[i] != value || !self.seen[i] {
            self.params[i] = value;
            self.seen[i] = true;
            true
        } else {
            false
        }
    }

    // run `op` on every selected component
    fn apply(
        &mut self,
        selection: &impl Selection,
        mut op: impl FnMut(&mut Self, usize),
    ) -> Result<(), LookupError> {
        let layout = Arc::clone(&self.layout);
        let indices = selection.indices(&layout)?;
        for &i in indices.iter() {
            op(self, i);
        }
        Ok(())
    }

    /// 0 where the bounds allow it, the middle of the bounds elsewhere.
    pub fn default_params(&mut self) {
        for i in 0..self.dimension() {
            self.default_at(i);
        }
    }

    pub fn default_params_for(&mut self, selection: &impl Selection) -> Result<(), LookupError> {
        self.apply(selection, Self::default_at)
    }

    /// Uniform sample within the bounds of every component.
    pub fn random_params(&mut self) {
        for i in 0..self.dimension() {
            self.random_at(i);
        }
    }

    pub fn random_params_for(&mut self, selection: &impl Selection) -> Result<(), LookupError> {
        self.apply(selection, Self::random_at)
    }

    /// Move every component by up to `factor` times its range, then bring it
    /// back within bounds.
    pub fn perturb_params(&mut self, factor: f64) {
        for i in 0..self.dimension() {
            self.perturb_at(i, factor);
        }
    }

    pub fn perturb_params_for(
        &mut self,
        factor: f64,
        selection: &impl Selection,
    ) -> Result<(), LookupError> {
        self.apply(selection, |state, i| state.perturb_at(i, factor))
    }

    /// Clamp every component into its bounds; continuous joints wrap into
    /// `[-pi, pi]` instead.
    pub fn enforce_bounds(&mut self) {
        for i in 0..self.dimension() {
            self.enforce_at(i);
        }
    }

    pub fn enforce_bounds_for(&mut self, selection: &impl Selection) -> Result<(), LookupError> {
        self.apply(selection, Self::enforce_at)
    }

    pub fn check_bounds(&self) -> bool {
        self.params
            .iter()
            .enumerate()
            .all(|(i, &value)| self.layout.within(i, value))
    }

    pub fn check_bounds_for(&self, selection: &impl Selection) -> Result<bool, LookupError> {
        let indices = selection.indices(&self.layout)?;
        Ok(indices.iter().all(|&i| self.layout.within(i, self.params[i])))
    }

    /// Overwrite the whole state. Returns whether any component changed or
    /// was previously unseen.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != self.dimension()`.
    pub fn set_params(&mut self, values: &[f64]) -> bool {
        assert_eq!(
            values.len(),
            self.dimension(),
            "parameter vector does not match the state dimension"
        );
        let mut changed = false;
        for (i, &value) in values.iter().enumerate() {
            changed |= self.set_at(i, value);
        }
        changed
    }

    /// Overwrite the selected components, `values` being in selection order.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per selected component.
    pub fn set_params_for(
        &mut self,
        selection: &impl Selection,
        values: &[f64],
    ) -> Result<bool, LookupError> {
        let layout = Arc::clone(&self.layout);
        let indices = selection.indices(&layout)?;
        assert_eq!(
            values.len(),
            indices.len(),
            "parameter vector does not match the selection"
        );
        let mut changed = false;
        for (&i, &value) in indices.iter().zip(values) {
            changed |= self.set_at(i, value);
        }
        Ok(changed)
    }

    pub fn set_all(&mut self, value: f64) {
        self.params.fill(value);
        self.seen.fill(true);
    }

    pub fn set_all_for(
        &mut self,
        selection: &impl Selection,
        value: f64,
    ) -> Result<(), LookupError> {
        self.apply(selection, |state, i| {
            state.params[i] = value;
            state.seen[i] = true;
        })
    }

    /// # Panics
    ///
    /// Panics if `out.len() != self.dimension()`.
    pub fn copy_params(&self, out: &mut [f64]) {
        assert_eq!(
            out.len(),
            self.dimension(),
            "output buffer does not match the state dimension"
        );
        out.copy_from_slice(&self.params);
    }

    /// # Panics
    ///
    /// Panics if `out` does not have one entry per selected component.
    pub fn copy_params_for(
        &self,
        selection: &impl Selection,
        out: &mut [f64],
    ) -> Result<(), LookupError> {
        let indices = selection.indices(&self.layout)?;
        assert_eq!(out.len(), indices.len(), "output buffer does not match the selection");
        for (slot, &i) in out.iter_mut().zip(indices.iter()) {
            *slot = self.params[i];
        }
        Ok(())
    }

    /// Mark every component unseen. Values are kept.
    pub fn reset(&mut self) {
        self.seen.fill(false);
    }

    pub fn reset_for(&mut self, selection: &impl Selection) -> Result<(), LookupError> {
        self.apply(selection, |state, i| state.seen[i] = false)
    }

    pub fn seen_all(&self) -> bool {
        self.seen.iter().all(|&seen| seen)
    }

    pub fn seen_all_for(&self, selection: &impl Selection) -> Result<bool, LookupError> {
        let indices = selection.indices(&self.layout)?;
        Ok(indices.iter().all(|&i| self.seen[i]))
    }

    /// Indices of the components not set since the last reset.
    pub fn missing(&self) -> Vec<usize> {
        self.seen
            .iter()
            .enumerate()
            .filter(|&(_, &seen)| !seen)
            .map(|(i, _)| i)
            .collect()
    }

    /// Component-wise comparison with an explicit tolerance. States of
    /// different dimension are never equal.
    pub fn approx_eq(&self, other: &KinematicState, tolerance: f64) -> bool {
        self.dimension() == other.dimension()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Exact comparison of the values; seen flags and generators are ignored.
impl PartialEq for KinematicState {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

impl fmt::Display for KinematicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for joint in self.layout.joints() {
            let range = joint.range();
            write!(f, "{}", joint.name)?;
            if !self.seen[range.clone()].iter().all(|&seen| seen) {
                write!(f, " [UNSEEN]")?;
            }
            let values: Vec<String> = self.params[range].iter().map(f64::to_string).collect();
            writeln!(f, ": {}", values.join(" "))?;
        }
        Ok(())
    }
}
