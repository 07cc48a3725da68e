//! Convenience re-export of the crate's public surface.
//!
//! ```
//! use subpool::prelude::*;
//! ```

pub use crate::config::{PoolOptions, RegistryOptions};
pub use crate::error::{Error, Result};
pub use crate::policy::Policy;
pub use crate::pool::{Allocation, Pool, PoolId, Segment};
pub use crate::registry::Registry;
