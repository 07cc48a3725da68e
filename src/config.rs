//! Configuration constants and per-pool/per-registry overrides.
//!
//! The five constants below are the ones named in the design as "not
//! runtime-tunable... implementations may expose": callers can override the
//! three initial capacities through [`PoolOptions`] / [`RegistryOptions`],
//! but the load factor and growth factor stay structural knobs that exist
//! mainly so the growth condition isn't a magic number scattered across the
//! codebase.

/// Initial capacity of a newly-created [`Registry`](crate::registry::Registry), in pool slots.
pub const INITIAL_REGISTRY_CAPACITY: usize = 20;
/// Initial capacity of a pool's node arena, in descriptor slots.
pub const INITIAL_ARENA_CAPACITY: usize = 40;
/// Initial capacity of a pool's gap index, in entries.
pub const INITIAL_GAP_CAPACITY: usize = 40;
/// Load factor past which a structure doubles its capacity before the next insertion.
pub const LOAD_FACTOR: f64 = 0.75;
/// Factor by which a structure's capacity grows once the load factor is exceeded.
pub const GROWTH_FACTOR: usize = 2;

static_assertions::const_assert!(LOAD_FACTOR > 0.0 && LOAD_FACTOR <= 1.0);
static_assertions::const_assert!(GROWTH_FACTOR >= 2);
static_assertions::const_assert!(INITIAL_REGISTRY_CAPACITY >= 1);
static_assertions::const_assert!(INITIAL_ARENA_CAPACITY >= 1);
static_assertions::const_assert!(INITIAL_GAP_CAPACITY >= 1);

/// Per-pool overrides for the node arena and gap index starting capacities.
///
/// Defaults match the spec's constants; only the initial capacities are
/// meant to be tuned per caller; `load_factor` and `growth_factor` are
/// included for completeness but are sanity-checked with `debug_assert!`
/// rather than validated at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolOptions {
    /// Initial capacity of the node arena.
    pub initial_arena_capacity: usize,
    /// Initial capacity of the gap index.
    pub initial_gap_capacity: usize,
    /// Load factor that triggers doubling. Must be in `(0.0, 1.0]`.
    pub load_factor: f64,
    /// Growth multiplier applied on doubling. Must be `>= 2`.
    pub growth_factor: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            initial_arena_capacity: INITIAL_ARENA_CAPACITY,
            initial_gap_capacity: INITIAL_GAP_CAPACITY,
            load_factor: LOAD_FACTOR,
            growth_factor: GROWTH_FACTOR,
        }
    }
}

impl PoolOptions {
    pub(crate) fn validate(&self) {
        debug_assert!(self.load_factor > 0.0 && self.load_factor <= 1.0);
        debug_assert!(self.growth_factor >= 2);
        debug_assert!(self.initial_arena_capacity >= 1);
        debug_assert!(self.initial_gap_capacity >= 1);
    }
}

/// Overrides for the process-wide pool registry's starting capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryOptions {
    /// Initial capacity of the registry, in pool slots.
    pub initial_capacity: usize,
    /// Load factor that triggers doubling. Must be in `(0.0, 1.0]`.
    pub load_factor: f64,
    /// Growth multiplier applied on doubling. Must be `>= 2`.
    pub growth_factor: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            initial_capacity: INITIAL_REGISTRY_CAPACITY,
            load_factor: LOAD_FACTOR,
            growth_factor: GROWTH_FACTOR,
        }
    }
}

impl RegistryOptions {
    pub(crate) fn validate(&self) {
        debug_assert!(self.load_factor > 0.0 && self.load_factor <= 1.0);
        debug_assert!(self.growth_factor >= 2);
        debug_assert!(self.initial_capacity >= 1);
    }
}
