//! # hologram-launch - Kernel Launch Geometry
//!
//! Resolves a partial description of a GPU kernel launch into a complete,
//! consistent [`LaunchConfig`].
//!
//! ## Architecture
//!
//! A launch is described by block dimensions (threads per block), grid
//! dimensions (blocks per grid) and overall dimensions (threads the launch is
//! meant to cover). [`LaunchConfigBuilder`] accepts any sufficient subset and
//! derives the rest:
//!
//! - **Explicit geometry**: any two of block, grid and overall; all three if they agree
//! - **Saturation**: a given block size, with the grid filling every multiprocessor
//! - **Minimum parameters**: block and grid chosen by the kernel's occupancy model
//!
//! Kernels and devices are consulted through the [`Kernel`] and [`Device`]
//! traits. The [`sim`] module implements both from published architecture
//! limits so launches can be resolved without hardware.
//!
//! ## Example
//!
//! ```rust
//! use hologram_launch::sim::{DeviceSpec, KernelSpec};
//! use hologram_launch::{BlockDim, LaunchConfigBuilder, OverallDim, Validation};
//!
//! # fn main() -> hologram_launch::Result<()> {
//! let device = DeviceSpec::ampere_a100();
//! let kernel = KernelSpec::new(&device, 32, 0);
//!
//! let config = LaunchConfigBuilder::new()
//!     .kernel(&kernel)?
//!     .block_dimensions(BlockDim::square(16, 16))?
//!     .overall_dimensions(OverallDim::square(1920, 1080))?
//!     .build(Validation::Checked)?;
//!
//! assert_eq!(config.grid().x, 120);
//! assert_eq!(config.grid().y, 68);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod device;
pub mod dims;
pub mod error;
pub mod kernel;
pub mod shared_memory;
pub mod sim;
pub mod toolkit;
pub mod validate;

// Re-export primary types
pub use builder::{GeometryMode, LaunchConfigBuilder};
pub use config::LaunchConfig;
pub use device::{ComputeCapability, Device};
pub use dims::{div_rounding_up, BlockDim, CompositeDims, GridDim, OverallDim};
pub use error::{DimensionKind, ErrorKind, LaunchError, LimitSource, Result, Underspecified};
pub use kernel::Kernel;
pub use shared_memory::{DynamicSharedMemory, SharedMemorySizer};
pub use toolkit::ToolkitVersion;
pub use validate::Validation;
