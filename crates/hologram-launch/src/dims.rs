//! Launch geometry dimensions and the arithmetic relating them
//!
//! A launch is described by three triples:
//!
//! ```text
//! BlockDim    threads per block        (u32 per axis)
//! GridDim     blocks in the grid       (u32 per axis)
//! OverallDim  threads the launch covers (u64 per axis)
//! ```
//!
//! For every axis `overall <= grid * block`. When the grid is derived from the
//! overall and block dimensions it is the ceiling of their quotient, so the
//! grid may overshoot the overall extent by less than one block.

use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// Block dimensions
///
/// Defines the 3D arrangement of threads within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDim {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl BlockDim {
    /// Create new block dimensions
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create 1D block
    pub const fn linear(size: u32) -> Self {
        Self { x: size, y: 1, z: 1 }
    }

    /// Create 2D block
    pub const fn square(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Number of threads in the block
    pub const fn volume(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    /// Number of threads in the block, saturating at `u32::MAX`
    ///
    /// Kernel and shared-memory queries take the block size as `u32`; any
    /// block that passes device validation fits.
    pub const fn threads(&self) -> u32 {
        let volume = self.volume();
        if volume > u32::MAX as u64 {
            u32::MAX
        } else {
            volume as u32
        }
    }

    /// True if any axis is zero
    pub const fn has_zero_axis(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    pub(crate) const fn axes(&self) -> [(char, u32); 3] {
        [('x', self.x), ('y', self.y), ('z', self.z)]
    }
}

impl Default for BlockDim {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

impl fmt::Display for BlockDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Grid dimensions
///
/// Defines the 3D iteration space of blocks that execute the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDim {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridDim {
    /// Create new grid dimensions
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create 1D grid
    pub const fn linear(size: u32) -> Self {
        Self { x: size, y: 1, z: 1 }
    }

    /// Create 2D grid
    pub const fn square(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Get total number of blocks
    pub const fn total_blocks(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    /// True if any axis is zero
    pub const fn has_zero_axis(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    pub(crate) const fn axes(&self) -> [(char, u32); 3] {
        [('x', self.x), ('y', self.y), ('z', self.z)]
    }
}

impl Default for GridDim {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

impl fmt::Display for GridDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Overall dimensions
///
/// The number of threads along each axis that the launch is meant to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverallDim {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl OverallDim {
    /// Create new overall dimensions
    pub const fn new(x: u64, y: u64, z: u64) -> Self {
        Self { x, y, z }
    }

    /// Create 1D overall dimensions
    pub const fn linear(size: u64) -> Self {
        Self { x: size, y: 1, z: 1 }
    }

    /// Create 2D overall dimensions
    pub const fn square(x: u64, y: u64) -> Self {
        Self { x, y, z: 1 }
    }

    /// True if any axis is zero
    pub const fn has_zero_axis(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    /// Number of blocks of the given shape needed to cover these dimensions
    ///
    /// Each axis is rounded up independently. All block axes must be non-zero.
    pub fn blocks_for(&self, block: BlockDim) -> GridDim {
        GridDim::new(
            div_rounding_up(self.x, block.x),
            div_rounding_up(self.y, block.y),
            div_rounding_up(self.z, block.z),
        )
    }

    /// Smallest block covering these dimensions with the given grid
    ///
    /// Each axis is rounded up independently. All grid axes must be non-zero.
    pub fn block_for(&self, grid: GridDim) -> BlockDim {
        BlockDim::new(
            div_rounding_up(self.x, grid.x),
            div_rounding_up(self.y, grid.y),
            div_rounding_up(self.z, grid.z),
        )
    }

    /// True if `dims` launches at least this many threads along every axis
    pub fn is_covered_by(&self, dims: CompositeDims) -> bool {
        let launched = dims.grid * dims.block;
        self.x <= launched.x && self.y <= launched.y && self.z <= launched.z
    }
}

impl fmt::Display for OverallDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Mul<BlockDim> for GridDim {
    type Output = OverallDim;

    fn mul(self, block: BlockDim) -> OverallDim {
        OverallDim::new(
            u64::from(self.x) * u64::from(block.x),
            u64::from(self.y) * u64::from(block.y),
            u64::from(self.z) * u64::from(block.z),
        )
    }
}

impl Mul<GridDim> for BlockDim {
    type Output = OverallDim;

    fn mul(self, grid: GridDim) -> OverallDim {
        grid * self
    }
}

/// A fully resolved grid and block pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CompositeDims {
    pub grid: GridDim,
    pub block: BlockDim,
}

impl CompositeDims {
    pub const fn new(grid: GridDim, block: BlockDim) -> Self {
        Self { grid, block }
    }

    /// Overall dimensions launched by this grid and block
    pub fn overall(&self) -> OverallDim {
        self.grid * self.block
    }
}

impl fmt::Display for CompositeDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid={}, block={}", self.grid, self.block)
    }
}

/// Divide, rounding up
///
/// `divisor` must be non-zero. The quotient is truncated to `u32`; keeping it
/// in range is the caller's obligation and is not checked here.
pub const fn div_rounding_up(dividend: u64, divisor: u32) -> u32 {
    let divisor = divisor as u64;
    let quotient = dividend / divisor;
    let rounded = if quotient * divisor == dividend {
        quotient
    } else {
        quotient + 1
    };
    rounded as u32
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_dim() {
        let block = BlockDim::new(8, 8, 1);
        assert_eq!(block.volume(), 64);
        assert_eq!(block.threads(), 64);
        assert_eq!(block.to_string(), "(8, 8, 1)");

        assert_eq!(BlockDim::linear(256).volume(), 256);
        assert_eq!(BlockDim::square(16, 16).volume(), 256);
        assert_eq!(BlockDim::default(), BlockDim::new(1, 1, 1));
    }

    #[test]
    fn test_block_threads_saturate() {
        let huge = BlockDim::new(u32::MAX, 2, 1);
        assert_eq!(huge.volume(), u64::from(u32::MAX) * 2);
        assert_eq!(huge.threads(), u32::MAX);
    }

    #[test]
    fn test_grid_dim() {
        let grid = GridDim::new(2, 3, 4);
        assert_eq!(grid.total_blocks(), 24);
        assert_eq!(grid.to_string(), "(2, 3, 4)");
        assert!(!grid.has_zero_axis());
        assert!(GridDim::new(2, 0, 4).has_zero_axis());
    }

    #[test]
    fn test_div_rounding_up() {
        assert_eq!(div_rounding_up(100, 32), 4);
        assert_eq!(div_rounding_up(96, 32), 3);
        assert_eq!(div_rounding_up(1, 1024), 1);
        assert_eq!(div_rounding_up(0, 7), 0);
    }

    #[test]
    fn test_blocks_for() {
        let overall = OverallDim::new(100, 30, 1);
        assert_eq!(overall.blocks_for(BlockDim::new(32, 8, 1)), GridDim::new(4, 4, 1));
    }

    #[test]
    fn test_block_for() {
        let overall = OverallDim::linear(100);
        assert_eq!(overall.block_for(GridDim::linear(4)), BlockDim::linear(25));
        assert_eq!(overall.block_for(GridDim::linear(3)), BlockDim::linear(34));
    }

    #[test]
    fn test_grid_times_block() {
        let overall = GridDim::new(3, 2, 1) * BlockDim::new(16, 4, 2);
        assert_eq!(overall, OverallDim::new(48, 8, 2));
        assert_eq!(BlockDim::new(16, 4, 2) * GridDim::new(3, 2, 1), overall);

        // No overflow in the u64 product
        let wide = GridDim::linear(u32::MAX) * BlockDim::linear(1024);
        assert_eq!(wide.x, u64::from(u32::MAX) * 1024);
    }

    #[test]
    fn test_is_covered_by() {
        let dims = CompositeDims::new(GridDim::linear(4), BlockDim::linear(32));
        assert!(OverallDim::linear(100).is_covered_by(dims));
        assert!(OverallDim::linear(128).is_covered_by(dims));
        assert!(!OverallDim::linear(129).is_covered_by(dims));
        assert_eq!(dims.overall(), OverallDim::linear(128));
    }
}
