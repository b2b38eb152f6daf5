//! Kernel collaborator contract

use crate::device::Device;
use crate::dims::CompositeDims;
use crate::error::Result;
use crate::shared_memory::DynamicSharedMemory;

/// Compiled kernel properties consulted when configuring a launch
///
/// # Usage
///
/// ```rust
/// use hologram_launch::sim::{DeviceSpec, KernelSpec};
/// use hologram_launch::{Kernel, LaunchConfigBuilder, Validation};
///
/// # fn main() -> hologram_launch::Result<()> {
/// let device = DeviceSpec::ampere_a100();
/// let kernel = KernelSpec::new(&device, 32, 0);
///
/// let config = LaunchConfigBuilder::new()
///     .kernel(&kernel)?
///     .block_size(256)?
///     .saturate_with_active_blocks()?
///     .build(Validation::Checked)?;
///
/// let per_sm = kernel.max_active_blocks_per_multiprocessor(256, 0)?;
/// assert_eq!(config.grid().x, per_sm * 108);
/// # Ok(())
/// # }
/// ```
pub trait Kernel {
    /// Device the kernel was loaded on
    fn device(&self) -> &dyn Device;

    /// Maximum number of threads in one block launching this kernel
    fn max_threads_per_block(&self) -> u32;

    /// Maximum dynamic shared memory a block of this kernel may request, in bytes
    fn max_dynamic_shared_memory(&self) -> u32;

    /// How many blocks of `block_size` threads, each using
    /// `dynamic_shared_memory` bytes, can be resident on one multiprocessor
    fn max_active_blocks_per_multiprocessor(&self, block_size: u32, dynamic_shared_memory: u32) -> Result<u32>;

    /// Smallest grid and its block size that reach maximum occupancy
    fn min_grid_params_for_max_occupancy(&self, dynamic_shared_memory: &DynamicSharedMemory) -> Result<CompositeDims>;
}
