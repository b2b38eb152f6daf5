//! Dynamic shared memory sizing

use std::fmt;
use std::sync::Arc;

/// Function from block size (threads) to dynamic shared memory bytes
pub type SharedMemorySizer = Arc<dyn Fn(u32) -> u32 + Send + Sync>;

/// Dynamic shared memory requirement of a launch
///
/// Either a fixed byte count or a function of the block size, evaluated once
/// the block size is resolved. Exactly one is active; choosing one replaces
/// the other.
#[derive(Clone)]
pub enum DynamicSharedMemory {
    Fixed(u32),
    PerBlockSize(SharedMemorySizer),
}

impl DynamicSharedMemory {
    /// Size as a function of the block size
    pub fn per_block_size<F>(sizer: F) -> Self
    where
        F: Fn(u32) -> u32 + Send + Sync + 'static,
    {
        Self::PerBlockSize(Arc::new(sizer))
    }

    /// Bytes required by a block of `block_size` threads
    pub fn size_for(&self, block_size: u32) -> u32 {
        match self {
            Self::Fixed(size) => *size,
            Self::PerBlockSize(sizer) => sizer(block_size),
        }
    }

    /// The fixed size, if no sizing function is active
    pub fn fixed_size(&self) -> Option<u32> {
        match self {
            Self::Fixed(size) => Some(*size),
            Self::PerBlockSize(_) => None,
        }
    }
}

impl Default for DynamicSharedMemory {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

impl fmt::Debug for DynamicSharedMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(size) => f.debug_tuple("Fixed").field(size).finish(),
            Self::PerBlockSize(_) => f.write_str("PerBlockSize(..)"),
        }
    }
}

impl From<u32> for DynamicSharedMemory {
    fn from(size: u32) -> Self {
        Self::Fixed(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed() {
        let shmem = DynamicSharedMemory::from(128);
        assert_eq!(shmem.size_for(1024), 128);
        assert_eq!(shmem.fixed_size(), Some(128));
        assert_eq!(format!("{shmem:?}"), "Fixed(128)");
    }

    #[test]
    fn test_per_block_size() {
        let shmem = DynamicSharedMemory::per_block_size(|threads| threads * 4);
        assert_eq!(shmem.size_for(256), 1024);
        assert_eq!(shmem.fixed_size(), None);
        assert_eq!(format!("{shmem:?}"), "PerBlockSize(..)");
    }
}
