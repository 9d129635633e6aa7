use crate::animation::transitions::{RunningHandle, TransitionDriver, TransitionOutcome};
use crate::animation::tweening::TransitionRequest;
use crate::Result;
use fxhash::FxHashMap;
use std::fmt;
use std::hash::Hash;

/// Identifies one animatable property of one control
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub object: u64,
    pub property: String,
}

impl PropertyKey {
    pub fn new(object: u64, property: impl Into<String>) -> Self {
        Self {
            object,
            property: property.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.object, self.property)
    }
}

/// At most one live transition per key.
///
/// Starting a transition for a key that is still animating cancels the
/// previous one and waits for its task to stop before the new one starts,
/// so two transitions never write to the same sink out of order.
pub struct TransitionRegistry<K = PropertyKey> {
    driver: TransitionDriver,
    active: FxHashMap<K, RunningHandle>,
}

impl<K> TransitionRegistry<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new(driver: TransitionDriver) -> Self {
        Self {
            driver,
            active: FxHashMap::default(),
        }
    }

    /// Supersede whatever is running for `key` with `request`.
    ///
    /// The request is validated first; a rejected request leaves the current
    /// transition untouched.
    pub async fn replace(&mut self, key: K, request: TransitionRequest) -> Result<()> {
        TransitionDriver::validate(&request)?;

        if let Some(previous) = self.active.remove(&key) {
            if !previous.is_finished() {
                let outcome = previous.cancel_and_wait().await;
                log::debug!("replaced transition for {:?} ({:?})", key, outcome);
            }
        }

        let handle = self.driver.start(request)?;
        self.active.insert(key, handle);
        Ok(())
    }

    /// Cancel the transition for `key` without waiting. Returns whether one was live.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.active.remove(key) {
            Some(handle) => {
                let live = !handle.is_finished();
                handle.cancel();
                live
            }
            None => false,
        }
    }

    /// Cancel the transition for `key` and wait until it stops delivering
    pub async fn cancel_and_wait(&mut self, key: &K) -> Option<TransitionOutcome> {
        let handle = self.active.remove(key)?;
        Some(handle.cancel_and_wait().await)
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.active.drain() {
            handle.cancel();
        }
    }

    pub fn handle(&self, key: &K) -> Option<&RunningHandle> {
        self.active.get(key)
    }

    pub fn is_animating(&self, key: &K) -> bool {
        self.active.get(key).is_some_and(|handle| !handle.is_finished())
    }

    /// Number of transitions still delivering values
    pub fn active_count(&self) -> usize {
        self.active.values().filter(|h| !h.is_finished()).count()
    }

    /// Drop handles of finished transitions; returns how many were removed
    pub fn prune_finished(&mut self) -> usize {
        let before = self.active.len();
        self.active.retain(|_, handle| !handle.is_finished());
        before - self.active.len()
    }
}

impl<K> Default for TransitionRegistry<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new(TransitionDriver::new())
    }
}

impl<K> Drop for TransitionRegistry<K> {
    fn drop(&mut self) {
        for handle in self.active.values() {
            handle.cancel();
        }
    }
}
