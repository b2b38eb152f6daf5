//! # hologram-launch-suite
//!
//! Umbrella crate for kernel launch preparation:
//!
//! - [`launch`] - launch geometry resolution ([`hologram_launch`])
//! - [`rtc`] - runtime-compilation options and their marshalling ([`hologram_rtc`])

pub use hologram_launch as launch;
pub use hologram_rtc as rtc;
