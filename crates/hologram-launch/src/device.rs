//! Device collaborator contract

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dims::{BlockDim, GridDim};

/// Versioned instruction-set generation of a device (e.g. `8.6`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComputeCapability {
    pub major: u32,
    pub minor: u32,
}

impl ComputeCapability {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `major * 10 + minor`, the form used in architecture names (`sm_86`)
    pub const fn as_combined_number(&self) -> u32 {
        self.major * 10 + self.minor
    }

    pub const fn from_combined_number(combined: u32) -> Self {
        Self::new(combined / 10, combined % 10)
    }
}

impl fmt::Display for ComputeCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Device properties consulted when configuring a launch
///
/// Implementations are expected to answer from cached metadata; the launch
/// builder calls these on every validation and build without caching.
pub trait Device {
    /// Instruction-set generation of the device
    fn compute_capability(&self) -> ComputeCapability;

    /// Maximum number of threads in one block
    fn max_threads_per_block(&self) -> u32;

    /// Maximum extent of a block along each axis
    fn max_block_dims(&self) -> BlockDim;

    /// Maximum extent of a grid along each axis
    fn max_grid_dims(&self) -> GridDim;

    /// Maximum shared memory a single block may use, in bytes
    fn max_shared_memory_per_block(&self) -> u32;

    /// Number of multiprocessors on the device
    fn multiprocessor_count(&self) -> u32;
}
