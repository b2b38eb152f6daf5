//! Reference device and kernel collaborators
//!
//! [`DeviceSpec`] describes a device by its published architecture limits and
//! [`KernelSpec`] describes a compiled kernel by its resource usage. Together
//! they answer occupancy queries the way the hardware occupancy calculator
//! does, so launch configurations can be resolved and tested without a device.
//!
//! Resident blocks per multiprocessor are limited by:
//!
//! ```text
//! warps      max_warps_per_sm / warps_per_block
//! registers  registers_per_sm / (round_up(regs * warp, unit) * warps_per_block)
//! shared     shared_per_sm / round_up(static + dynamic, unit)
//! blocks     max_blocks_per_sm
//! ```

use crate::device::{ComputeCapability, Device};
use crate::dims::{BlockDim, CompositeDims, GridDim};
use crate::error::{LaunchError, Result};
use crate::kernel::Kernel;
use crate::shared_memory::DynamicSharedMemory;

/// Architecture limits of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    pub name: String,
    pub compute_capability: ComputeCapability,
    pub multiprocessor_count: u32,
    pub warp_size: u32,
    pub max_threads_per_block: u32,
    pub max_block_dims: BlockDim,
    pub max_grid_dims: GridDim,
    pub max_threads_per_multiprocessor: u32,
    pub max_blocks_per_multiprocessor: u32,
    pub registers_per_multiprocessor: u32,
    pub register_allocation_unit: u32,
    pub shared_memory_per_multiprocessor: u32,
    pub shared_memory_allocation_unit: u32,
    pub max_shared_memory_per_block: u32,
}

const MAX_BLOCK_DIMS: BlockDim = BlockDim::new(1024, 1024, 64);
const MAX_GRID_DIMS: GridDim = GridDim::new(i32::MAX as u32, 65535, 65535);

impl DeviceSpec {
    /// NVIDIA A100 (compute capability 8.0)
    pub fn ampere_a100() -> Self {
        Self {
            name: "A100".into(),
            compute_capability: ComputeCapability::new(8, 0),
            multiprocessor_count: 108,
            warp_size: 32,
            max_threads_per_block: 1024,
            max_block_dims: MAX_BLOCK_DIMS,
            max_grid_dims: MAX_GRID_DIMS,
            max_threads_per_multiprocessor: 2048,
            max_blocks_per_multiprocessor: 32,
            registers_per_multiprocessor: 65536,
            register_allocation_unit: 256,
            shared_memory_per_multiprocessor: 164 * 1024,
            shared_memory_allocation_unit: 128,
            max_shared_memory_per_block: 48 * 1024,
        }
    }

    /// NVIDIA GeForce RTX 4090 (compute capability 8.9)
    pub fn ada_rtx4090() -> Self {
        Self {
            name: "RTX 4090".into(),
            compute_capability: ComputeCapability::new(8, 9),
            multiprocessor_count: 128,
            max_threads_per_multiprocessor: 1536,
            max_blocks_per_multiprocessor: 24,
            shared_memory_per_multiprocessor: 100 * 1024,
            shared_memory_allocation_unit: 256,
            ..Self::ampere_a100()
        }
    }

    /// NVIDIA H100 (compute capability 9.0)
    pub fn hopper_h100() -> Self {
        Self {
            name: "H100".into(),
            compute_capability: ComputeCapability::new(9, 0),
            multiprocessor_count: 132,
            shared_memory_per_multiprocessor: 228 * 1024,
            shared_memory_allocation_unit: 256,
            ..Self::ampere_a100()
        }
    }

    /// Small single-multiprocessor device for tests and software fallbacks
    pub fn generic() -> Self {
        Self {
            name: "generic".into(),
            compute_capability: ComputeCapability::new(5, 2),
            multiprocessor_count: 1,
            max_threads_per_multiprocessor: 1024,
            max_blocks_per_multiprocessor: 16,
            registers_per_multiprocessor: 32768,
            shared_memory_per_multiprocessor: 48 * 1024,
            shared_memory_allocation_unit: 256,
            ..Self::ampere_a100()
        }
    }
}

impl Device for DeviceSpec {
    fn compute_capability(&self) -> ComputeCapability {
        self.compute_capability
    }

    fn max_threads_per_block(&self) -> u32 {
        self.max_threads_per_block
    }

    fn max_block_dims(&self) -> BlockDim {
        self.max_block_dims
    }

    fn max_grid_dims(&self) -> GridDim {
        self.max_grid_dims
    }

    fn max_shared_memory_per_block(&self) -> u32 {
        self.max_shared_memory_per_block
    }

    fn multiprocessor_count(&self) -> u32 {
        self.multiprocessor_count
    }
}

/// Resource usage of a compiled kernel on a [`DeviceSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSpec<'d> {
    device: &'d DeviceSpec,
    registers_per_thread: u32,
    static_shared_memory: u32,
    max_threads_per_block: u32,
}

impl<'d> KernelSpec<'d> {
    /// Describe a kernel using `registers_per_thread` registers and
    /// `static_shared_memory` bytes of statically allocated shared memory
    ///
    /// The kernel's block size limit is the device limit, lowered when the
    /// register file cannot hold a full block.
    pub fn new(device: &'d DeviceSpec, registers_per_thread: u32, static_shared_memory: u32) -> Self {
        let mut max_threads_per_block = device.max_threads_per_block;
        let regs_per_warp = registers_per_warp(device, registers_per_thread);
        if regs_per_warp > 0 {
            let warps = device.registers_per_multiprocessor / regs_per_warp;
            max_threads_per_block = max_threads_per_block.min(warps.saturating_mul(warp_size(device)));
        }
        Self {
            device,
            registers_per_thread,
            static_shared_memory,
            max_threads_per_block,
        }
    }

    /// Lower the block size limit, as a launch-bounds annotation would
    pub fn with_max_threads_per_block(mut self, limit: u32) -> Self {
        self.max_threads_per_block = self.max_threads_per_block.min(limit);
        self
    }

    pub fn registers_per_thread(&self) -> u32 {
        self.registers_per_thread
    }

    pub fn static_shared_memory(&self) -> u32 {
        self.static_shared_memory
    }

    fn active_blocks(&self, block_size: u32, dynamic_shared_memory: u32) -> u32 {
        let device = self.device;
        if block_size == 0 || block_size > self.max_threads_per_block {
            return 0;
        }
        if dynamic_shared_memory > self.max_dynamic_shared_memory() {
            return 0;
        }

        let warp_size = warp_size(device);
        let warps_per_block = block_size.div_ceil(warp_size);
        let max_warps = device.max_threads_per_multiprocessor / warp_size;
        let by_warps = max_warps / warps_per_block;

        let regs_per_block = registers_per_warp(device, self.registers_per_thread).saturating_mul(warps_per_block);
        let by_registers = match regs_per_block {
            0 => u32::MAX,
            regs => device.registers_per_multiprocessor / regs,
        };

        let shared = round_up(
            self.static_shared_memory.saturating_add(dynamic_shared_memory),
            device.shared_memory_allocation_unit,
        );
        let by_shared_memory = match shared {
            0 => u32::MAX,
            bytes => device.shared_memory_per_multiprocessor / bytes,
        };

        by_warps
            .min(by_registers)
            .min(by_shared_memory)
            .min(device.max_blocks_per_multiprocessor)
    }
}

impl Kernel for KernelSpec<'_> {
    fn device(&self) -> &dyn Device {
        self.device
    }

    fn max_threads_per_block(&self) -> u32 {
        self.max_threads_per_block
    }

    fn max_dynamic_shared_memory(&self) -> u32 {
        self.device
            .max_shared_memory_per_block
            .saturating_sub(self.static_shared_memory)
    }

    fn max_active_blocks_per_multiprocessor(&self, block_size: u32, dynamic_shared_memory: u32) -> Result<u32> {
        Ok(self.active_blocks(block_size, dynamic_shared_memory))
    }

    /// Search warp-multiple block sizes from the largest down, keeping the
    /// first that reaches the highest resident thread count. The grid is the
    /// number of such blocks resident across all multiprocessors. A kernel
    /// capped below one warp is tried at its cap alone.
    fn min_grid_params_for_max_occupancy(&self, dynamic_shared_memory: &DynamicSharedMemory) -> Result<CompositeDims> {
        let warp_size = warp_size(self.device);
        let mut best: Option<(u32, u32)> = None;
        let mut best_threads = 0u64;

        let mut block_size = match self.max_threads_per_block - self.max_threads_per_block % warp_size {
            0 => self.max_threads_per_block,
            rounded => rounded,
        };
        while block_size > 0 {
            let active = self.active_blocks(block_size, dynamic_shared_memory.size_for(block_size));
            let resident_threads = u64::from(active) * u64::from(block_size);
            if resident_threads > best_threads {
                best_threads = resident_threads;
                best = Some((block_size, active));
            }
            block_size = block_size.saturating_sub(warp_size);
        }

        let (block_size, active) =
            best.ok_or_else(|| LaunchError::occupancy_query("no block size admits a resident block"))?;
        let grid = active
            .checked_mul(self.device.multiprocessor_count)
            .ok_or(LaunchError::GridOverflow {
                blocks_per_multiprocessor: active,
                multiprocessors: self.device.multiprocessor_count,
            })?;
        Ok(CompositeDims::new(GridDim::linear(grid), BlockDim::linear(block_size)))
    }
}

/// A zero warp size in a hand-built spec counts as single-thread warps
fn warp_size(device: &DeviceSpec) -> u32 {
    device.warp_size.max(1)
}

fn registers_per_warp(device: &DeviceSpec, registers_per_thread: u32) -> u32 {
    round_up(
        registers_per_thread.saturating_mul(warp_size(device)),
        device.register_allocation_unit,
    )
}

fn round_up(value: u32, unit: u32) -> u32 {
    if unit == 0 {
        value
    } else {
        value.div_ceil(unit).saturating_mul(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warp_limited() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 32, 0);
        // 8 warps per block, 64 warps per SM; registers allow 8 blocks too
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(256, 0).unwrap(), 8);
    }

    #[test]
    fn test_shared_memory_limited() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 32, 0);
        // 164 KiB / 48 KiB = 3 blocks
        assert_eq!(
            kernel.max_active_blocks_per_multiprocessor(256, 48 * 1024).unwrap(),
            3
        );
    }

    #[test]
    fn test_register_limited() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 128, 0);
        // 128 regs * 32 lanes = 4096 per warp, 16 warps fit in 64K registers
        assert_eq!(kernel.max_threads_per_block(), 512);
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(256, 0).unwrap(), 2);
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(1024, 0).unwrap(), 0);
    }

    #[test]
    fn test_block_limit_per_multiprocessor() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 16, 0);
        // 32 threads per block would allow 64 blocks by warps; capped at 32
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(32, 0).unwrap(), 32);
    }

    #[test]
    fn test_max_dynamic_shared_memory() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 32, 4096);
        assert_eq!(kernel.max_dynamic_shared_memory(), 48 * 1024 - 4096);
        assert_eq!(
            kernel
                .max_active_blocks_per_multiprocessor(256, 48 * 1024)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_min_grid_params() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 32, 0);
        let dims = kernel
            .min_grid_params_for_max_occupancy(&DynamicSharedMemory::default())
            .unwrap();
        // 1024-thread blocks already fill an SM (2 x 1024 = 2048 threads)
        assert_eq!(dims.block, BlockDim::linear(1024));
        assert_eq!(dims.grid, GridDim::linear(2 * 108));
    }

    #[test]
    fn test_min_grid_params_with_sizer() {
        let device = DeviceSpec::generic();
        let kernel = KernelSpec::new(&device, 32, 0);
        // 64 bytes per thread: a 1024-thread block needs 64 KiB, more than the
        // 48 KiB per-block limit; 768 threads need exactly 48 KiB
        let shmem = DynamicSharedMemory::per_block_size(|threads| threads * 64);
        let dims = kernel.min_grid_params_for_max_occupancy(&shmem).unwrap();
        assert_eq!(dims.block, BlockDim::linear(768));
        assert_eq!(dims.grid, GridDim::linear(1));
    }

    #[test]
    fn test_min_grid_params_nothing_fits() {
        let device = DeviceSpec::generic();
        let kernel = KernelSpec::new(&device, 32, 0);
        let shmem = DynamicSharedMemory::Fixed(64 * 1024);
        let err = kernel.min_grid_params_for_max_occupancy(&shmem).unwrap_err();
        assert!(matches!(err, LaunchError::OccupancyQuery(_)));
    }

    #[test]
    fn test_min_grid_params_below_one_warp() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, 32, 0).with_max_threads_per_block(16);
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(16, 0).unwrap(), 32);

        let dims = kernel
            .min_grid_params_for_max_occupancy(&DynamicSharedMemory::default())
            .unwrap();
        assert_eq!(dims.block, BlockDim::linear(16));
        assert_eq!(dims.grid, GridDim::linear(32 * 108));
    }

    #[test]
    fn test_zero_warp_size_does_not_panic() {
        let device = DeviceSpec {
            warp_size: 0,
            ..DeviceSpec::generic()
        };
        let kernel = KernelSpec::new(&device, 32, 0);
        // Each one-thread warp takes a 256-register allocation unit
        assert_eq!(kernel.max_threads_per_block(), 128);
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(64, 0).unwrap(), 2);
        assert!(kernel
            .min_grid_params_for_max_occupancy(&DynamicSharedMemory::default())
            .is_ok());
    }

    #[test]
    fn test_huge_register_count_limits_block() {
        let device = DeviceSpec::ampere_a100();
        let kernel = KernelSpec::new(&device, u32::MAX, 0);
        assert_eq!(kernel.max_threads_per_block(), 0);
        assert_eq!(kernel.max_active_blocks_per_multiprocessor(32, 0).unwrap(), 0);
    }

    #[test]
    fn test_presets() {
        let h100 = DeviceSpec::hopper_h100();
        assert_eq!(h100.multiprocessor_count(), 132);
        assert_eq!(h100.compute_capability(), ComputeCapability::new(9, 0));
        assert_eq!(DeviceSpec::ada_rtx4090().max_threads_per_multiprocessor, 1536);
    }
}
