//! Launch configuration builder
//!
//! The builder accepts a partial, possibly redundant description of a launch
//! and resolves it into a [`LaunchConfig`]. Geometry can be given as any two of
//! block, grid and overall dimensions, or derived from a kernel's occupancy:
//!
//! ```text
//! block + overall  ->  grid  = ceil(overall / block)
//! grid  + overall  ->  block = ceil(overall / grid)
//! block + grid     ->  overall = grid * block
//! saturate         ->  grid  = active blocks per SM * SM count   (block given)
//! min params       ->  block, grid from the kernel's occupancy model
//! ```
//!
//! Mutators check what they can locally and fail eagerly; [`build`] resolves
//! the geometry and, under [`Validation::Checked`], re-verifies the result
//! against the bound kernel and device.
//!
//! [`build`]: LaunchConfigBuilder::build

use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::LaunchConfig;
use crate::device::Device;
use crate::dims::{BlockDim, CompositeDims, GridDim, OverallDim};
use crate::error::{LaunchError, Result, Underspecified};
use crate::kernel::Kernel;
use crate::shared_memory::DynamicSharedMemory;
use crate::toolkit::ToolkitVersion;
use crate::validate::{self, Validation};

const SATURATE: &str = "saturating the device with active blocks";
const MIN_PARAMS: &str = "finding the minimum grid parameters for maximum occupancy";

/// How the builder currently intends to arrive at the launch geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryMode {
    /// From explicitly given block, grid and overall dimensions
    Explicit,
    /// Grid sized to fill the device with resident blocks of the given size
    SaturateWithActiveBlocks,
    /// Block and grid both chosen by the kernel's occupancy model
    MinParamsForMaxOccupancy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Geometry {
    /// Nothing set is `Explicit` with every field `None`.
    Explicit {
        block: Option<BlockDim>,
        grid: Option<GridDim>,
        overall: Option<OverallDim>,
    },
    SaturateWithActiveBlocks {
        block: BlockDim,
    },
    /// A caller-supplied overall survives verbatim and is not checked
    /// against the derived geometry.
    MinParamsForMaxOccupancy {
        overall: Option<OverallDim>,
    },
}

impl Default for Geometry {
    fn default() -> Self {
        Self::Explicit {
            block: None,
            grid: None,
            overall: None,
        }
    }
}

/// Builder for [`LaunchConfig`]
///
/// The kernel and device are borrowed, never owned: they must outlive the
/// builder, and the builder never modifies them.
///
/// # Usage
///
/// ```rust
/// use hologram_launch::{BlockDim, GridDim, LaunchConfigBuilder, OverallDim, Validation};
///
/// # fn main() -> hologram_launch::Result<()> {
/// let config = LaunchConfigBuilder::new()
///     .block_size(32)?
///     .overall_size(100)?
///     .dynamic_shared_memory_size(128)?
///     .build(Validation::Checked)?;
///
/// assert_eq!(config.grid(), GridDim::linear(4));
/// assert_eq!(config.block(), BlockDim::linear(32));
/// assert_eq!(config.overall(), OverallDim::linear(100));
/// assert_eq!(config.dynamic_shared_memory_size(), 128);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct LaunchConfigBuilder<'a> {
    geometry: Geometry,
    block_cooperation: bool,
    dynamic_shared_memory: DynamicSharedMemory,
    kernel: Option<&'a dyn Kernel>,
    device: Option<&'a dyn Device>,
    toolkit: ToolkitVersion,
}

impl<'a> LaunchConfigBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder with an existing configuration
    ///
    /// Block and grid dimensions, dynamic shared memory and cooperation are
    /// copied. The overall dimensions are not; they are recomputed from the
    /// grid and block on the next build.
    pub fn from_config(config: &LaunchConfig) -> Self {
        Self {
            geometry: Geometry::Explicit {
                block: Some(config.block()),
                grid: Some(config.grid()),
                overall: None,
            },
            block_cooperation: config.block_cooperation(),
            dynamic_shared_memory: DynamicSharedMemory::Fixed(config.dynamic_shared_memory_size()),
            ..Self::default()
        }
    }

    // ============================================================================================
    // Introspection
    // ============================================================================================

    pub fn mode(&self) -> GeometryMode {
        match self.geometry {
            Geometry::Explicit { .. } => GeometryMode::Explicit,
            Geometry::SaturateWithActiveBlocks { .. } => GeometryMode::SaturateWithActiveBlocks,
            Geometry::MinParamsForMaxOccupancy { .. } => GeometryMode::MinParamsForMaxOccupancy,
        }
    }

    /// Block dimensions as currently specified (not derived)
    pub fn specified_block(&self) -> Option<BlockDim> {
        match self.geometry {
            Geometry::Explicit { block, .. } => block,
            Geometry::SaturateWithActiveBlocks { block } => Some(block),
            Geometry::MinParamsForMaxOccupancy { .. } => None,
        }
    }

    /// Grid dimensions as currently specified (not derived)
    pub fn specified_grid(&self) -> Option<GridDim> {
        match self.geometry {
            Geometry::Explicit { grid, .. } => grid,
            _ => None,
        }
    }

    /// Overall dimensions as currently specified (not derived)
    pub fn specified_overall(&self) -> Option<OverallDim> {
        match self.geometry {
            Geometry::Explicit { overall, .. } | Geometry::MinParamsForMaxOccupancy { overall } => overall,
            Geometry::SaturateWithActiveBlocks { .. } => None,
        }
    }

    pub fn dynamic_shared_memory_requirement(&self) -> &DynamicSharedMemory {
        &self.dynamic_shared_memory
    }

    pub fn toolkit_version(&self) -> ToolkitVersion {
        self.toolkit
    }

    // ============================================================================================
    // Geometry
    // ============================================================================================

    /// Set the block dimensions
    ///
    /// Clears overall dimensions derived alongside a grid, since the new block
    /// may invalidate them. Ends minimum-parameter mode; saturation keeps
    /// running with the new block. Fails if any axis is zero, if the block exceeds
    /// the bound kernel's or device's limits, or if grid and overall are both
    /// set and disagree with it.
    pub fn block_dimensions(&mut self, dims: BlockDim) -> Result<&mut Self> {
        validate::block_dimensions(dims)?;
        if let Geometry::Explicit {
            grid: Some(grid),
            overall: Some(overall),
            ..
        } = self.geometry
        {
            validate::all_dimensions_agree(dims, grid, overall)?;
        }
        self.validate_block_limits(dims)?;
        trace!(block = %dims, "set block dimensions");
        self.replace_block(dims);
        Ok(self)
    }

    /// Set a one-dimensional block of `size` threads
    pub fn block_size(&mut self, size: u32) -> Result<&mut Self> {
        self.block_dimensions(BlockDim::linear(size))
    }

    /// Use the largest linear block the bound kernel (or else device) allows
    pub fn use_maximum_linear_block(&mut self) -> Result<&mut Self> {
        let max_size = match (self.kernel, self.device) {
            (Some(kernel), _) => kernel.max_threads_per_block(),
            (None, Some(device)) => device.max_threads_per_block(),
            (None, None) => return Err(LaunchError::KernelOrDeviceRequired),
        };
        let dims = BlockDim::linear(max_size);
        trace!(block = %dims, "use maximum linear block");
        self.replace_block(dims);
        Ok(self)
    }

    fn replace_block(&mut self, dims: BlockDim) {
        self.geometry = match self.geometry {
            Geometry::Explicit { grid, overall, .. } => Geometry::Explicit {
                block: Some(dims),
                grid,
                overall: if grid.is_some() { None } else { overall },
            },
            Geometry::SaturateWithActiveBlocks { .. } => Geometry::SaturateWithActiveBlocks { block: dims },
            Geometry::MinParamsForMaxOccupancy { overall } => Geometry::Explicit {
                block: Some(dims),
                grid: None,
                overall,
            },
        };
    }

    /// Set the grid dimensions, in blocks
    ///
    /// Ends any occupancy-derived mode. Clears overall dimensions when a block
    /// is set, since the pair now determines them.
    pub fn grid_dimensions(&mut self, dims: GridDim) -> Result<&mut Self> {
        validate::grid_dimensions(dims)?;
        if let Geometry::Explicit {
            block: Some(block),
            overall: Some(overall),
            ..
        } = self.geometry
        {
            validate::all_dimensions_agree(block, dims, overall)?;
        }
        if let Some(device) = self.device {
            validate::grid_against_device(device, dims)?;
        }
        trace!(grid = %dims, "set grid dimensions");
        self.geometry = match self.geometry {
            Geometry::Explicit { block, overall, .. } => Geometry::Explicit {
                block,
                grid: Some(dims),
                overall: if block.is_some() { None } else { overall },
            },
            Geometry::SaturateWithActiveBlocks { block } => Geometry::Explicit {
                block: Some(block),
                grid: Some(dims),
                overall: None,
            },
            Geometry::MinParamsForMaxOccupancy { overall } => Geometry::Explicit {
                block: None,
                grid: Some(dims),
                overall,
            },
        };
        Ok(self)
    }

    /// Set a one-dimensional grid of `size` blocks
    pub fn grid_size(&mut self, size: u32) -> Result<&mut Self> {
        self.grid_dimensions(GridDim::linear(size))
    }

    /// Alias for [`grid_size`](Self::grid_size)
    pub fn num_blocks(&mut self, size: u32) -> Result<&mut Self> {
        self.grid_size(size)
    }

    /// Set the overall dimensions, in threads
    ///
    /// Fails with a mismatch if block and grid are both set and their product
    /// differs. Ends saturation mode. Under minimum-parameter mode the value
    /// is kept as given and reported unchanged by the build.
    pub fn overall_dimensions(&mut self, dims: OverallDim) -> Result<&mut Self> {
        validate::overall_dimensions(dims)?;
        if let Geometry::Explicit {
            block: Some(block),
            grid: Some(grid),
            ..
        } = self.geometry
        {
            validate::all_dimensions_agree(block, grid, dims)?;
        }
        trace!(overall = %dims, "set overall dimensions");
        self.geometry = match self.geometry {
            Geometry::Explicit { block, grid, .. } => Geometry::Explicit {
                block,
                grid,
                overall: Some(dims),
            },
            Geometry::SaturateWithActiveBlocks { block } => Geometry::Explicit {
                block: Some(block),
                grid: None,
                overall: Some(dims),
            },
            Geometry::MinParamsForMaxOccupancy { .. } => Geometry::MinParamsForMaxOccupancy { overall: Some(dims) },
        };
        Ok(self)
    }

    /// Set one-dimensional overall dimensions of `size` threads
    pub fn overall_size(&mut self, size: u64) -> Result<&mut Self> {
        self.overall_dimensions(OverallDim::linear(size))
    }

    /// Set block and grid together, dropping any overall dimensions
    pub fn dimensions(&mut self, dims: CompositeDims) -> Result<&mut Self> {
        validate::block_dimensions(dims.block)?;
        validate::grid_dimensions(dims.grid)?;
        self.validate_block_limits(dims.block)?;
        if let Some(device) = self.device {
            validate::grid_against_device(device, dims.grid)?;
        }
        trace!(%dims, "set composite dimensions");
        self.geometry = Geometry::Explicit {
            block: Some(dims.block),
            grid: Some(dims.grid),
            overall: None,
        };
        Ok(self)
    }

    /// Size the grid to exactly fill the device with resident blocks
    ///
    /// Needs a kernel and block dimensions. Clears grid and overall
    /// dimensions and ends minimum-parameter mode. The grid is computed on
    /// build as a one-dimensional count.
    pub fn saturate_with_active_blocks(&mut self) -> Result<&mut Self> {
        if self.kernel.is_none() {
            return Err(LaunchError::KernelRequired(SATURATE));
        }
        let block = self.specified_block().ok_or(LaunchError::BlockDimensionsRequired)?;
        trace!(%block, "saturate with active blocks");
        self.geometry = Geometry::SaturateWithActiveBlocks { block };
        Ok(self)
    }

    /// Let the kernel's occupancy model choose both block and grid
    ///
    /// Needs a kernel and a toolkit with occupancy queries. Clears block, grid
    /// and overall dimensions and ends saturation mode.
    pub fn min_params_for_max_occupancy(&mut self) -> Result<&mut Self> {
        if self.kernel.is_none() {
            return Err(LaunchError::KernelRequired(MIN_PARAMS));
        }
        self.require_occupancy_api()?;
        trace!("min params for max occupancy");
        self.geometry = Geometry::MinParamsForMaxOccupancy { overall: None };
        Ok(self)
    }

    // ============================================================================================
    // Auxiliary parameters
    // ============================================================================================

    /// Use a fixed amount of dynamic shared memory per block
    pub fn dynamic_shared_memory_size(&mut self, size: u32) -> Result<&mut Self> {
        self.validate_shared_memory(size)?;
        trace!(size, "set dynamic shared memory size");
        self.dynamic_shared_memory = DynamicSharedMemory::Fixed(size);
        Ok(self)
    }

    /// Compute dynamic shared memory from the block size at build time
    pub fn dynamic_shared_memory_sizer<F>(&mut self, sizer: F) -> &mut Self
    where
        F: Fn(u32) -> u32 + Send + Sync + 'static,
    {
        trace!("set dynamic shared memory sizer");
        self.dynamic_shared_memory = DynamicSharedMemory::per_block_size(sizer);
        self
    }

    /// Set the dynamic shared memory requirement
    ///
    /// A fixed size is validated now; a sizing function on build.
    pub fn dynamic_shared_memory(&mut self, shared_memory: DynamicSharedMemory) -> Result<&mut Self> {
        if let Some(size) = shared_memory.fixed_size() {
            self.validate_shared_memory(size)?;
        }
        self.dynamic_shared_memory = shared_memory;
        Ok(self)
    }

    pub fn no_dynamic_shared_memory(&mut self) -> &mut Self {
        self.dynamic_shared_memory = DynamicSharedMemory::Fixed(0);
        self
    }

    pub fn block_cooperation(&mut self, cooperation: bool) -> &mut Self {
        self.block_cooperation = cooperation;
        self
    }

    pub fn blocks_may_cooperate(&mut self) -> &mut Self {
        self.block_cooperation(true)
    }

    pub fn blocks_dont_cooperate(&mut self) -> &mut Self {
        self.block_cooperation(false)
    }

    /// Select the toolkit capabilities used by occupancy-derived modes
    pub fn toolkit(&mut self, toolkit: ToolkitVersion) -> &mut Self {
        self.toolkit = toolkit;
        self
    }

    // ============================================================================================
    // Collaborators
    // ============================================================================================

    /// Bind a kernel
    ///
    /// Known block dimensions (given, or derivable from grid and overall) and
    /// a fixed dynamic shared memory size are re-checked against its limits.
    pub fn kernel(&mut self, kernel: &'a dyn Kernel) -> Result<&mut Self> {
        if let Some(block) = self.known_block() {
            validate::block_against_kernel(kernel, block)?;
        }
        if let Some(size) = self.dynamic_shared_memory.fixed_size() {
            validate::shared_memory_against_kernel(kernel, size)?;
        }
        self.kernel = Some(kernel);
        Ok(self)
    }

    /// Unbind the kernel; geometry is left untouched
    pub fn no_kernel(&mut self) -> &mut Self {
        self.kernel = None;
        self
    }

    /// Alias for [`no_kernel`](Self::no_kernel)
    pub fn kernel_independent(&mut self) -> &mut Self {
        self.no_kernel()
    }

    /// Bind a device
    ///
    /// Known block dimensions and a fixed dynamic shared memory size are
    /// re-checked against its limits.
    pub fn device(&mut self, device: &'a dyn Device) -> Result<&mut Self> {
        if let Some(block) = self.known_block() {
            validate::block_against_device(device, block)?;
        }
        if let Some(size) = self.dynamic_shared_memory.fixed_size() {
            validate::shared_memory_against_device(device, size)?;
        }
        self.device = Some(device);
        Ok(self)
    }

    /// Unbind the device; geometry is left untouched
    pub fn no_device(&mut self) -> &mut Self {
        self.device = None;
        self
    }

    // ============================================================================================
    // Resolution
    // ============================================================================================

    /// Resolve the geometry and package the launch configuration
    pub fn build(&self, validation: Validation) -> Result<LaunchConfig> {
        let dims = self.composite_dimensions(validation)?;
        let overall = match self.specified_overall() {
            Some(overall) => {
                if !overall.is_covered_by(dims) {
                    warn!(%overall, %dims, "overall dimensions exceed the derived grid and block");
                }
                overall
            }
            None => dims.overall(),
        };

        let dynamic_shared_memory_size = self.dynamic_shared_memory.size_for(dims.block.threads());
        if validation == Validation::Checked {
            self.validate_shared_memory(dynamic_shared_memory_size)?;
        }

        debug!(
            grid = %dims.grid,
            block = %dims.block,
            %overall,
            dynamic_shared_memory_size,
            block_cooperation = self.block_cooperation,
            ?validation,
            "resolved launch configuration"
        );
        Ok(LaunchConfig::new(
            dims,
            overall,
            dynamic_shared_memory_size,
            self.block_cooperation,
        ))
    }

    /// Resolve the geometry and store it back as explicit dimensions
    ///
    /// The stored overall dimensions are grid × block, replacing any smaller
    /// overall the grid overshoots, so the three stored fields always agree.
    pub fn resolve_dimensions(&mut self) -> Result<CompositeDims> {
        let dims = self.composite_dimensions(Validation::Checked)?;
        self.geometry = Geometry::Explicit {
            block: Some(dims.block),
            grid: Some(dims.grid),
            overall: Some(dims.overall()),
        };
        Ok(dims)
    }

    fn composite_dimensions(&self, validation: Validation) -> Result<CompositeDims> {
        let dims = self.unvalidated_composite_dimensions()?;
        if validation == Validation::Checked {
            self.validate_composite_dimensions(dims)?;
        }
        Ok(dims)
    }

    fn unvalidated_composite_dimensions(&self) -> Result<CompositeDims> {
        match self.geometry {
            Geometry::SaturateWithActiveBlocks { block } => {
                let kernel = self.kernel.ok_or(LaunchError::KernelRequired(SATURATE))?;
                let threads = block.threads();
                let shared_memory = self.dynamic_shared_memory.size_for(threads);
                let blocks_per_multiprocessor = kernel.max_active_blocks_per_multiprocessor(threads, shared_memory)?;
                if blocks_per_multiprocessor == 0 {
                    return Err(LaunchError::NoActiveBlocks { threads, shared_memory });
                }
                let multiprocessors = self.device.unwrap_or_else(|| kernel.device()).multiprocessor_count();
                let grid = blocks_per_multiprocessor
                    .checked_mul(multiprocessors)
                    .ok_or(LaunchError::GridOverflow {
                        blocks_per_multiprocessor,
                        multiprocessors,
                    })?;
                Ok(CompositeDims::new(GridDim::linear(grid), block))
            }
            Geometry::MinParamsForMaxOccupancy { .. } => {
                let kernel = self.kernel.ok_or(LaunchError::KernelRequired(MIN_PARAMS))?;
                self.require_occupancy_api()?;
                kernel.min_grid_params_for_max_occupancy(&self.dynamic_shared_memory)
            }
            Geometry::Explicit { block, grid, overall } => match (block, grid, overall) {
                (Some(block), _, Some(overall)) => Ok(CompositeDims::new(overall.blocks_for(block), block)),
                (None, Some(grid), Some(overall)) => Ok(CompositeDims::new(grid, overall.block_for(grid))),
                (Some(block), Some(grid), None) => Ok(CompositeDims::new(grid, block)),
                (None, None, _) => Err(LaunchError::Underspecified(Underspecified::NeitherBlockNorGrid)),
                (None, Some(_), None) => Err(LaunchError::Underspecified(Underspecified::GridWithoutBlockOrOverall)),
                (Some(_), None, None) => Err(LaunchError::Underspecified(Underspecified::OnlyBlock)),
            },
        }
    }

    // ============================================================================================
    // Validation helpers
    // ============================================================================================

    /// Block dimensions known without consulting a kernel's occupancy model
    fn known_block(&self) -> Option<BlockDim> {
        match self.geometry {
            Geometry::Explicit { block: Some(block), .. } | Geometry::SaturateWithActiveBlocks { block } => {
                Some(block)
            }
            Geometry::Explicit {
                block: None,
                grid: Some(grid),
                overall: Some(overall),
            } => Some(overall.block_for(grid)),
            _ => None,
        }
    }

    fn validate_block_limits(&self, block: BlockDim) -> Result<()> {
        if let Some(kernel) = self.kernel {
            validate::block_against_kernel(kernel, block)?;
        }
        if let Some(device) = self.device {
            validate::block_against_device(device, block)?;
        }
        Ok(())
    }

    fn validate_shared_memory(&self, size: u32) -> Result<()> {
        if let Some(kernel) = self.kernel {
            validate::shared_memory_against_kernel(kernel, size)?;
        }
        if let Some(device) = self.device {
            validate::shared_memory_against_device(device, size)?;
        }
        Ok(())
    }

    /// Checks for a geometry assembled from several mutation paths that may
    /// each have passed locally. The kernel's own device stands in when no
    /// device is bound.
    fn validate_composite_dimensions(&self, dims: CompositeDims) -> Result<()> {
        validate::block_dimensions(dims.block)?;
        validate::grid_dimensions(dims.grid)?;
        // A derived grid is truncated to u32 and may wrap
        if let Geometry::Explicit { overall: Some(overall), .. } = self.geometry {
            validate::overall_covered(overall, dims)?;
        }
        if let Some(kernel) = self.kernel {
            validate::block_against_kernel(kernel, dims.block)?;
        }
        if let Some(device) = self.effective_device() {
            validate::block_against_device(device, dims.block)?;
            validate::grid_against_device(device, dims.grid)?;
        }
        Ok(())
    }

    fn effective_device(&self) -> Option<&'a dyn Device> {
        match (self.device, self.kernel) {
            (Some(device), _) => Some(device),
            (None, Some(kernel)) => Some(kernel.device()),
            (None, None) => None,
        }
    }

    fn require_occupancy_api(&self) -> Result<()> {
        if !self.toolkit.supports_occupancy_api() {
            return Err(LaunchError::Unsupported {
                feature: MIN_PARAMS,
                toolkit: self.toolkit,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for LaunchConfigBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchConfigBuilder")
            .field("geometry", &self.geometry)
            .field("block_cooperation", &self.block_cooperation)
            .field("dynamic_shared_memory", &self.dynamic_shared_memory)
            .field("kernel", &self.kernel.is_some())
            .field("device", &self.device.is_some())
            .field("toolkit", &self.toolkit)
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
