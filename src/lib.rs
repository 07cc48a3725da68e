//! `subpool`: a user-space suballocator for byte pools.
//!
//! A pool carves a fixed-size buffer into reserved and free regions on
//! request, using either best-fit or first-fit placement, and coalesces
//! adjacent free regions back together on release. A [`registry::Registry`]
//! manages any number of independent pools by opaque [`pool::PoolId`].
//!
//! The module layout mirrors the five collaborating components in the
//! design:
//!
//! - [`arena`] (C1): index-addressed storage for region descriptors.
//! - [`list`] (C2): the address-ordered doubly-linked list threaded through it.
//! - [`gap_index`] (C3): a size-sorted index over the free regions.
//! - [`pool`] (C4/C5): placement and coalescing, and the public [`pool::Pool`] type.
//! - [`registry`] (C6): the process-wide table of pools.
//!
//! `arena`, `list`, and `gap_index` are internal bookkeeping and are not part
//! of the public API; `pool` and `registry` are. See [`prelude`] for the
//! typical set of imports.

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod policy;
pub mod pool;
pub mod prelude;
pub mod registry;

pub(crate) mod arena;
pub(crate) mod gap_index;
pub(crate) mod list;
