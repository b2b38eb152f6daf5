//! Resolved launch configuration

use std::fmt;

use serde::Serialize;

use crate::dims::{BlockDim, CompositeDims, GridDim, OverallDim};

/// Launch configuration for kernel execution
///
/// Produced by [`LaunchConfigBuilder::build`](crate::LaunchConfigBuilder::build)
/// with every field resolved and checked; it cannot be modified afterwards.
/// To derive a variation, seed a new builder with
/// [`LaunchConfigBuilder::from_config`](crate::LaunchConfigBuilder::from_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LaunchConfig {
    dimensions: CompositeDims,
    overall: OverallDim,
    dynamic_shared_memory_size: u32,
    block_cooperation: bool,
}

impl LaunchConfig {
    pub(crate) const fn new(
        dimensions: CompositeDims,
        overall: OverallDim,
        dynamic_shared_memory_size: u32,
        block_cooperation: bool,
    ) -> Self {
        Self {
            dimensions,
            overall,
            dynamic_shared_memory_size,
            block_cooperation,
        }
    }

    /// Grid and block dimensions
    pub const fn dimensions(&self) -> CompositeDims {
        self.dimensions
    }

    pub const fn block(&self) -> BlockDim {
        self.dimensions.block
    }

    pub const fn grid(&self) -> GridDim {
        self.dimensions.grid
    }

    /// Threads the launch is meant to cover; never more than grid × block
    /// along any axis unless supplied by the caller alongside a derived geometry
    pub const fn overall(&self) -> OverallDim {
        self.overall
    }

    /// Dynamic shared memory per block, in bytes
    pub const fn dynamic_shared_memory_size(&self) -> u32 {
        self.dynamic_shared_memory_size
    }

    /// Whether blocks may synchronize across the whole grid
    pub const fn block_cooperation(&self) -> bool {
        self.block_cooperation
    }

    /// Get total number of blocks
    pub const fn total_blocks(&self) -> u64 {
        self.dimensions.grid.total_blocks()
    }

    /// Get total number of threads across all blocks
    pub const fn total_threads(&self) -> u64 {
        self.dimensions.grid.total_blocks() * self.dimensions.block.volume()
    }
}

impl fmt::Display for LaunchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grid={}, block={}, overall={}, shared_mem={}B",
            self.dimensions.grid, self.dimensions.block, self.overall, self.dynamic_shared_memory_size
        )?;
        if self.block_cooperation {
            f.write_str(", cooperative")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_config() {
        let config = LaunchConfig::new(
            CompositeDims::new(GridDim::new(2, 2, 1), BlockDim::new(8, 8, 1)),
            OverallDim::new(16, 16, 1),
            1024,
            false,
        );

        assert_eq!(config.total_blocks(), 4);
        assert_eq!(config.total_threads(), 256); // 4 blocks * 64 threads/block
        assert_eq!(
            config.to_string(),
            "grid=(2, 2, 1), block=(8, 8, 1), overall=(16, 16, 1), shared_mem=1024B"
        );
    }

    #[test]
    fn test_display_cooperative() {
        let config = LaunchConfig::new(
            CompositeDims::new(GridDim::linear(4), BlockDim::linear(32)),
            OverallDim::linear(100),
            0,
            true,
        );
        assert!(config.to_string().ends_with(", cooperative"));
    }

    #[test]
    fn test_serialize() {
        let config = LaunchConfig::new(
            CompositeDims::new(GridDim::linear(4), BlockDim::linear(32)),
            OverallDim::linear(100),
            128,
            false,
        );
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["dimensions"]["grid"]["x"], 4);
        assert_eq!(json["dimensions"]["block"]["x"], 32);
        assert_eq!(json["overall"]["x"], 100);
        assert_eq!(json["dynamic_shared_memory_size"], 128);
        assert_eq!(json["block_cooperation"], false);
    }
}
