//! Validation of launch parameters against each other and against collaborator limits

use crate::device::Device;
use crate::dims::{BlockDim, CompositeDims, GridDim, OverallDim};
use crate::error::{DimensionKind, LaunchError, LimitSource, Result};
use crate::kernel::Kernel;

/// How much checking [`build`](crate::LaunchConfigBuilder::build) performs
///
/// Mutators always run their local checks. `Checked` additionally re-verifies
/// the resolved geometry and shared memory size against the bound kernel and
/// device; `Fast` trusts the mutators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Validation {
    Fast,
    #[default]
    Checked,
}

pub(crate) fn block_dimensions(block: BlockDim) -> Result<()> {
    if block.has_zero_axis() {
        return Err(LaunchError::zero_dimension(DimensionKind::Block, block));
    }
    Ok(())
}

pub(crate) fn grid_dimensions(grid: GridDim) -> Result<()> {
    if grid.has_zero_axis() {
        return Err(LaunchError::zero_dimension(DimensionKind::Grid, grid));
    }
    Ok(())
}

pub(crate) fn overall_dimensions(overall: OverallDim) -> Result<()> {
    if overall.has_zero_axis() {
        return Err(LaunchError::zero_dimension(DimensionKind::Overall, overall));
    }
    Ok(())
}

/// All three geometry fields given: they must agree exactly
pub(crate) fn all_dimensions_agree(block: BlockDim, grid: GridDim, overall: OverallDim) -> Result<()> {
    if grid * block != overall {
        return Err(LaunchError::DimensionMismatch { block, grid, overall });
    }
    Ok(())
}

/// Every overall axis must fit inside grid × block on that axis
pub(crate) fn overall_covered(overall: OverallDim, dims: CompositeDims) -> Result<()> {
    if !overall.is_covered_by(dims) {
        return Err(LaunchError::OverallNotCovered {
            overall,
            grid: dims.grid,
            block: dims.block,
        });
    }
    Ok(())
}

pub(crate) fn block_against_kernel(kernel: &dyn Kernel, block: BlockDim) -> Result<()> {
    let limit = kernel.max_threads_per_block();
    if block.volume() > u64::from(limit) {
        return Err(LaunchError::TooManyThreads {
            threads: block.volume(),
            limit,
            imposed_by: LimitSource::Kernel,
        });
    }
    Ok(())
}

pub(crate) fn block_against_device(device: &dyn Device, block: BlockDim) -> Result<()> {
    let limit = device.max_threads_per_block();
    if block.volume() > u64::from(limit) {
        return Err(LaunchError::TooManyThreads {
            threads: block.volume(),
            limit,
            imposed_by: LimitSource::Device,
        });
    }
    let max = device.max_block_dims();
    for ((axis, value), (_, limit)) in block.axes().into_iter().zip(max.axes()) {
        if value > limit {
            return Err(LaunchError::BlockAxisTooLarge { axis, value, limit });
        }
    }
    Ok(())
}

pub(crate) fn grid_against_device(device: &dyn Device, grid: GridDim) -> Result<()> {
    let max = device.max_grid_dims();
    for ((axis, value), (_, limit)) in grid.axes().into_iter().zip(max.axes()) {
        if value > limit {
            return Err(LaunchError::GridAxisTooLarge { axis, value, limit });
        }
    }
    Ok(())
}

pub(crate) fn shared_memory_against_kernel(kernel: &dyn Kernel, size: u32) -> Result<()> {
    let limit = kernel.max_dynamic_shared_memory();
    if size > limit {
        return Err(LaunchError::SharedMemoryTooLarge {
            requested: size,
            limit,
            imposed_by: LimitSource::Kernel,
        });
    }
    Ok(())
}

pub(crate) fn shared_memory_against_device(device: &dyn Device, size: u32) -> Result<()> {
    let limit = device.max_shared_memory_per_block();
    if size > limit {
        return Err(LaunchError::SharedMemoryTooLarge {
            requested: size,
            limit,
            imposed_by: LimitSource::Device,
        });
    }
    Ok(())
}
