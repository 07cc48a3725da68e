//! Error type returned by fallible `subpool` operations.

use thiserror::Error;

/// Error type that `subpool` operations can return.
///
/// Every fallible path in this crate returns one of these five kinds; none of
/// them wrap a type-erased error, since the underlying failure is always one
/// of the following well-known conditions.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// An internal precondition was violated, or growing a structure (arena,
    /// gap index, or registry) failed because the backing allocation could
    /// not be reserved.
    #[error("operation failed: {0}")]
    Fail(String),
    /// No free region large enough to satisfy the requested size exists in
    /// the pool.
    #[error("no free region large enough for the request")]
    NoSpace,
    /// A descriptor removal was attempted against a gap index that does not
    /// contain it.
    #[error("descriptor not found in gap index")]
    NotFound,
    /// `close` was attempted on a pool that still has live allocations.
    #[error("pool still has live allocations")]
    NotFreed,
    /// The registry has already been initialized, or is being used after
    /// `shutdown` retired it (see `Registry::open`).
    #[error("registry already initialized")]
    AlreadyInitialized,
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
