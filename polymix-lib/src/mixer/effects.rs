//! Ordered effect chains attached to a channel or to the post-mix stage.

use std::fmt;
use std::sync::Arc;

use crate::error::{MixerError, Result};

/// Where an effect runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectScope {
    Channel(usize),
    PostMix,
}

/// Effect callback; receives the scope it runs in and the bytes to process.
///
/// Identity is the `Arc` allocation: unregistering needs a clone of the same
/// `Arc` that was registered. Any state the effect needs is captured by the
/// closure.
pub type EffectFn = Arc<dyn Fn(EffectScope, &mut [u8]) + Send + Sync>;

/// Runs exactly once when its effect is removed from a chain.
pub type EffectDoneFn = Box<dyn FnOnce(EffectScope) + Send>;

struct EffectEntry {
    effect: EffectFn,
    done: Option<EffectDoneFn>,
}

/// Insertion-ordered list of effects owned by a single scope.
#[derive(Default)]
pub struct EffectChain {
    entries: Vec<EffectEntry>,
}

impl fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectChain")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an effect to the end of the chain.
    pub fn push(&mut self, effect: EffectFn, done: Option<EffectDoneFn>) -> Result<()> {
        self.entries
            .try_reserve(1)
            .map_err(|_| MixerError::AllocationFailed("effect node"))?;
        self.entries.push(EffectEntry { effect, done });
        Ok(())
    }

    /// Remove the first entry registered with `effect`, running its done
    /// callback.
    pub fn remove(&mut self, scope: EffectScope, effect: &EffectFn) -> Result<()> {
        let index = self
            .entries
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.effect, effect))
            .ok_or(MixerError::NoSuchEffect)?;
        let entry = self.entries.remove(index);
        if let Some(done) = entry.done {
            done(scope);
        }
        Ok(())
    }

    /// Remove every entry in order, running each done callback once.
    pub fn clear(&mut self, scope: EffectScope) {
        for entry in self.entries.drain(..) {
            if let Some(done) = entry.done {
                done(scope);
            }
        }
    }

    /// Run every effect in registration order over `buf`.
    pub fn apply(&self, scope: EffectScope, buf: &mut [u8]) {
        for entry in &self.entries {
            (entry.effect)(scope, buf);
        }
    }
}
