//! # hologram-rtc - Runtime Compilation Options
//!
//! Describes how device code should be compiled at runtime and turns that
//! description into compiler arguments.
//!
//! ## Example
//!
//! ```rust
//! use hologram_launch::ComputeCapability;
//! use hologram_rtc::{marshal, render, CompilationOptions};
//!
//! # fn main() -> hologram_rtc::Result<()> {
//! let mut opts = CompilationOptions::new();
//! opts.set_target(ComputeCapability::new(8, 0))
//!     .set_language_dialect_name("c++17")?
//!     .define_value("BLOCK_SIZE", "256");
//! opts.use_fast_math = true;
//!
//! assert_eq!(
//!     render(&opts),
//!     "--use_fast_math --std=c++17 --gpu-architecture=sm_80 -DBLOCK_SIZE=256"
//! );
//! assert_eq!(marshal(&opts).len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod dialect;
pub mod error;
pub mod marshal;
pub mod options;

pub use dialect::CppDialect;
pub use error::{Result, RtcError};
pub use marshal::{marshal, process, render, MarshalTarget, MarshalledOptions, OptionEnd};
pub use options::{CompilationOptions, DiagnosticHandling, DiagnosticNumber};
