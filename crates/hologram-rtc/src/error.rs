//! Error types for runtime-compilation options

/// Result type for runtime-compilation option operations
pub type Result<T> = std::result::Result<T, RtcError>;

/// Errors raised while configuring compilation options
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RtcError {
    #[error("no C++ dialect named \"{0}\"")]
    UnknownDialect(String),
}

impl RtcError {
    /// Every option error is an invalid argument
    pub const fn kind(&self) -> hologram_launch::ErrorKind {
        match self {
            Self::UnknownDialect(_) => hologram_launch::ErrorKind::InvalidArgument,
        }
    }
}
