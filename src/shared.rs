use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::model::KinematicModel;
use super::state::KinematicState;

/// A model shared between threads behind a reader/writer lock.
///
/// Nothing is locked implicitly: callers take [`SharedModel::read`] or
/// [`SharedModel::write`] around every sequence of calls that must see one
/// consistent model. Forward kinematics rewrites the pose caches and so needs
/// the write guard; workers that only need poses for their own state can
/// clone the model under a read guard and run on the copy.
///
/// Holding a read guard while asking for the write guard on the same thread
/// deadlocks, as does taking the write guard twice.
#[derive(Debug, Clone)]
pub struct SharedModel {
    inner: Arc<RwLock<KinematicModel>>,
}

impl SharedModel {
    pub fn new(model: KinematicModel) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, KinematicModel> {
        // a panic in another holder leaves the model structurally intact
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, KinematicModel> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A fresh state for this model. The lock is only held while the layout
    /// is fetched.
    pub fn new_state(&self, seed: u64) -> KinematicState {
        KinematicState::new(&self.read(), seed)
    }
}

impl From<KinematicModel> for SharedModel {
    fn from(model: KinematicModel) -> Self {
        Self::new(model)
    }
}
