//! C6: the pool registry, a process-wide table of live pools.
//!
//! Modeled as an explicit, independently-constructible object (see the
//! design notes on avoiding ambient global state) rather than a `static`.
//! An embedder who wants one process-wide registry constructs it once, e.g.
//! behind a `once_cell::sync::Lazy<Mutex<Registry>>`, and passes it to
//! callers; this crate does not hide that choice behind the public API.

use crate::config::{PoolOptions, RegistryOptions};
use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::pool::{Pool, PoolId};

enum Slot {
    Vacant,
    Open(Pool),
}

/// Process-wide table of live pools.
///
/// `Registry::init` is the constructor; there is no separate global to
/// double-initialize. The "already initialized" condition from the source
/// is instead surfaced by [`Registry::open`] once [`Registry::shutdown`] has
/// retired the registry: using a shut-down registry is the Rust-side
/// equivalent of calling `mem_init` a second time after `mem_free`.
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Slot>,
    vacant: Vec<usize>,
    open_count: usize,
    options: RegistryOptions,
    closed: bool,
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Vacant => write!(f, "Vacant"),
            Slot::Open(p) => write!(f, "Open({:?})", p.id()),
        }
    }
}

impl Registry {
    /// Initialize a new registry with the default capacity (20 slots).
    pub fn init() -> Result<Self> {
        Self::init_with_options(RegistryOptions::default())
    }

    /// As [`Registry::init`], with explicit capacity overrides.
    pub fn init_with_options(options: RegistryOptions) -> Result<Self> {
        options.validate();
        let capacity = options.initial_capacity;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|e| Error::Fail(format!("failed to allocate registry: {e}")))?;
        slots.resize_with(capacity, || Slot::Vacant);
        Ok(Self {
            slots,
            vacant: (0..capacity).rev().collect(),
            open_count: 0,
            options,
            closed: false,
        })
    }

    fn grow_if_needed(&mut self) -> Result<()> {
        let capacity = self.slots.len().max(1);
        if (self.open_count + 1) as f64 / capacity as f64 > self.options.load_factor {
            let new_capacity = capacity * self.options.growth_factor;
            trace!(
                "Growing pool registry from {} to {} slots",
                capacity,
                new_capacity
            );
            let additional = new_capacity.saturating_sub(self.slots.len());
            self.slots
                .try_reserve_exact(additional)
                .map_err(|e| Error::Fail(format!("failed to grow registry: {e}")))?;
            let before = self.slots.len();
            self.slots.resize_with(new_capacity, || Slot::Vacant);
            self.vacant.extend((before..new_capacity).rev());
        }
        Ok(())
    }

    /// Open a new pool of `size` bytes under `policy` with default [`PoolOptions`].
    ///
    /// Returns `None` on failure (construction-failure path mirrors the
    /// source's "failed open returns a null handle"), except for the
    /// already-shutdown case, which returns `Err(Error::AlreadyInitialized)`
    /// since that failure is a caller programming error worth distinguishing
    /// from ordinary allocation exhaustion.
    pub fn open(&mut self, size: u64, policy: Policy) -> Result<Option<PoolId>> {
        self.open_with_options(size, policy, PoolOptions::default())
    }

    /// As [`Registry::open`], with explicit per-pool capacity overrides.
    pub fn open_with_options(
        &mut self,
        size: u64,
        policy: Policy,
        pool_options: PoolOptions,
    ) -> Result<Option<PoolId>> {
        if self.closed {
            return Err(Error::AlreadyInitialized);
        }
        self.grow_if_needed()?;
        let Some(slot) = self.vacant.pop() else {
            return Ok(None);
        };
        let id = PoolId(slot);
        match Pool::open_with_options(id, size, policy, pool_options) {
            Ok(pool) => {
                self.slots[slot] = Slot::Open(pool);
                self.open_count += 1;
                Ok(Some(id))
            }
            Err(_) => {
                self.vacant.push(slot);
                Ok(None)
            }
        }
    }

    /// Borrow the pool for `id`, if it is currently open.
    pub fn get(&self, id: PoolId) -> Option<&Pool> {
        match self.slots.get(id.0)? {
            Slot::Open(pool) => Some(pool),
            Slot::Vacant => None,
        }
    }

    /// Mutably borrow the pool for `id`, if it is currently open.
    pub fn get_mut(&mut self, id: PoolId) -> Option<&mut Pool> {
        match self.slots.get_mut(id.0)? {
            Slot::Open(pool) => Some(pool),
            Slot::Vacant => None,
        }
    }

    /// Close the pool for `id`. Fails with `NotFreed` if it still has live
    /// allocations, or `Fail` if `id` does not refer to an open pool.
    pub fn close(&mut self, id: PoolId) -> Result<()> {
        let slot = self
            .slots
            .get(id.0)
            .ok_or_else(|| Error::Fail("pool id out of range".into()))?;
        match slot {
            Slot::Vacant => Err(Error::Fail("pool is not open".into())),
            Slot::Open(pool) if !pool.is_empty() => {
                warn!("Close of pool {:?} rejected: live allocations remain", id);
                let _ = pool;
                Err(Error::NotFreed)
            }
            Slot::Open(_) => {
                self.slots[id.0] = Slot::Vacant;
                self.vacant.push(id.0);
                self.open_count -= 1;
                debug!("Closed pool {:?}", id);
                Ok(())
            }
        }
    }

    /// Close every open pool (regardless of live allocations) and retire the
    /// registry. After `shutdown`, further calls to `open` fail with
    /// `AlreadyInitialized`.
    pub fn shutdown(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Vacant;
        }
        self.vacant.clear();
        self.open_count = 0;
        self.closed = true;
        debug!("Registry shut down");
    }

    /// Number of currently-open pools.
    pub fn open_count(&self) -> usize {
        self.open_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_roundtrip() {
        let mut registry = Registry::init().unwrap();
        let id = registry.open(1000, Policy::BestFit).unwrap().unwrap();
        assert_eq!(registry.open_count(), 1);
        registry.close(id).unwrap();
        assert_eq!(registry.open_count(), 0);
    }

    #[test]
    fn close_with_live_alloc_is_not_freed() {
        let mut registry = Registry::init().unwrap();
        let id = registry.open(100, Policy::BestFit).unwrap().unwrap();
        let alloc = registry.get_mut(id).unwrap().allocate(50).unwrap();
        assert_eq!(registry.close(id), Err(Error::NotFreed));
        registry.get_mut(id).unwrap().free(alloc).unwrap();
        assert_eq!(registry.close(id), Ok(()));
    }

    #[test]
    fn shutdown_then_open_is_already_initialized() {
        let mut registry = Registry::init().unwrap();
        let id = registry.open(100, Policy::BestFit).unwrap().unwrap();
        registry.close(id).unwrap();
        registry.shutdown();
        assert_eq!(
            registry.open(100, Policy::BestFit),
            Err(Error::AlreadyInitialized)
        );
    }

    #[test]
    fn grows_past_load_factor() {
        let mut registry =
            Registry::init_with_options(RegistryOptions { initial_capacity: 2, ..Default::default() })
                .unwrap();
        let _a = registry.open(10, Policy::BestFit).unwrap().unwrap();
        let _b = registry.open(10, Policy::BestFit).unwrap().unwrap();
        assert!(registry.slots.len() > 2);
    }

    #[test]
    fn slot_reused_after_close() {
        let mut registry = Registry::init().unwrap();
        let a = registry.open(10, Policy::BestFit).unwrap().unwrap();
        registry.close(a).unwrap();
        let b = registry.open(10, Policy::BestFit).unwrap().unwrap();
        assert_eq!(a, b);
    }
}
