//! Error types for launch configuration

use std::fmt;

use crate::dims::{BlockDim, GridDim, OverallDim};
use crate::toolkit::ToolkitVersion;

/// Result type for launch configuration operations
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Broad classification of a [`LaunchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The supplied value is structurally wrong (zero axes, mismatched
    /// dimensions, limits exceeded, unparsable input).
    InvalidArgument,
    /// The operation is not meaningful given the rest of the configuration.
    InvalidState,
}

/// Which of the three geometry fields a value was given for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    Block,
    Grid,
    Overall,
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Block => "block",
            Self::Grid => "grid",
            Self::Overall => "overall",
        };
        f.write_str(name)
    }
}

/// Collaborator that imposed a violated limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSource {
    Kernel,
    Device,
}

impl fmt::Display for LimitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel => f.write_str("kernel"),
            Self::Device => f.write_str("device"),
        }
    }
}

/// The ways an explicit geometry can fail to determine a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Underspecified {
    /// Neither block nor grid dimensions were given.
    NeitherBlockNorGrid,
    /// Grid dimensions were given in blocks, with no block or overall dimensions.
    GridWithoutBlockOrOverall,
    /// Only block dimensions were given.
    OnlyBlock,
}

impl fmt::Display for Underspecified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NeitherBlockNorGrid => "neither block nor grid dimensions have been specified",
            Self::GridWithoutBlockOrOverall => {
                "grid dimensions have only been specified in terms of blocks, \
                 with no block or overall dimensions specified"
            }
            Self::OnlyBlock => "only block dimensions have been specified - cannot resolve launch grid dimensions",
        };
        f.write_str(msg)
    }
}

/// Errors raised while configuring or resolving a launch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    /// A dimension triple has an axis of size zero
    #[error("{kind} dimensions {dims} have a zero-sized axis")]
    ZeroDimension { kind: DimensionKind, dims: String },

    /// Block, grid and overall dimensions were all given and disagree
    #[error("specified block {block}, grid {grid} and overall {overall} dimensions do not agree")]
    DimensionMismatch {
        block: BlockDim,
        grid: GridDim,
        overall: OverallDim,
    },

    /// Explicit overall dimensions reach past the resolved grid and block
    #[error("overall dimensions {overall} are not covered by grid {grid} of {block} blocks")]
    OverallNotCovered {
        overall: OverallDim,
        grid: GridDim,
        block: BlockDim,
    },

    /// Block volume exceeds a kernel or device limit
    #[error("block of {threads} threads exceeds the {imposed_by} limit of {limit} threads per block")]
    TooManyThreads {
        threads: u64,
        limit: u32,
        imposed_by: LimitSource,
    },

    /// A single block axis exceeds the device limit for that axis
    #[error("block dimension {axis} = {value} exceeds the device limit of {limit}")]
    BlockAxisTooLarge { axis: char, value: u32, limit: u32 },

    /// A single grid axis exceeds the device limit for that axis
    #[error("grid dimension {axis} = {value} exceeds the device limit of {limit}")]
    GridAxisTooLarge { axis: char, value: u32, limit: u32 },

    /// Dynamic shared memory exceeds a kernel or device limit
    #[error("dynamic shared memory of {requested} bytes exceeds the {imposed_by} limit of {limit} bytes")]
    SharedMemoryTooLarge {
        requested: u32,
        limit: u32,
        imposed_by: LimitSource,
    },

    /// Operation needs a kernel and none is set
    #[error("a kernel must be set for {0}")]
    KernelRequired(&'static str),

    /// Operation needs either a kernel or a device and neither is set
    #[error("using the maximum-size linear block requires a kernel or a device to be set")]
    KernelOrDeviceRequired,

    /// Saturation requested before the block dimensions are known
    #[error("the block dimensions must be known to determine how many blocks saturate the device")]
    BlockDimensionsRequired,

    /// Build invoked with too few geometry fields
    #[error("{0}")]
    Underspecified(Underspecified),

    /// The configured toolkit lacks a capability
    #[error("{feature} is not supported by toolkit version {toolkit}")]
    Unsupported {
        feature: &'static str,
        toolkit: ToolkitVersion,
    },

    /// The kernel cannot keep any block of the given shape resident
    #[error("kernel admits no active blocks of {threads} threads with {shared_memory} bytes of dynamic shared memory")]
    NoActiveBlocks { threads: u32, shared_memory: u32 },

    /// The saturating grid does not fit a grid dimension
    #[error("saturating grid of {blocks_per_multiprocessor} blocks on each of {multiprocessors} multiprocessors overflows")]
    GridOverflow {
        blocks_per_multiprocessor: u32,
        multiprocessors: u32,
    },

    /// A kernel occupancy query failed
    #[error("occupancy query failed: {0}")]
    OccupancyQuery(String),

    /// A toolkit version string could not be parsed
    #[error("invalid toolkit version {0:?}, expected MAJOR.MINOR")]
    InvalidToolkitVersion(String),
}

impl LaunchError {
    /// Create a zero-dimension error for the given dimensions
    pub fn zero_dimension(kind: DimensionKind, dims: impl fmt::Display) -> Self {
        Self::ZeroDimension {
            kind,
            dims: dims.to_string(),
        }
    }

    /// Create an occupancy query error
    pub fn occupancy_query(msg: impl Into<String>) -> Self {
        Self::OccupancyQuery(msg.into())
    }

    /// Classify this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroDimension { .. }
            | Self::DimensionMismatch { .. }
            | Self::OverallNotCovered { .. }
            | Self::TooManyThreads { .. }
            | Self::BlockAxisTooLarge { .. }
            | Self::GridAxisTooLarge { .. }
            | Self::SharedMemoryTooLarge { .. }
            | Self::GridOverflow { .. }
            | Self::InvalidToolkitVersion(_) => ErrorKind::InvalidArgument,
            Self::KernelRequired(_)
            | Self::KernelOrDeviceRequired
            | Self::BlockDimensionsRequired
            | Self::Underspecified(_)
            | Self::Unsupported { .. }
            | Self::NoActiveBlocks { .. }
            | Self::OccupancyQuery(_) => ErrorKind::InvalidState,
        }
    }

    /// True for [`ErrorKind::InvalidArgument`] errors
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument)
    }

    /// True for [`ErrorKind::InvalidState`] errors
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidState)
    }
}
