//! Error handling for Ambra
//!
//! The mixer core is mostly total: modulation math, interpolation and
//! preset diffing cannot fail. Errors come from the edges: the host audio
//! runtime and configuration loading.

use thiserror::Error;

/// Result type alias for Ambra operations
pub type Result<T> = std::result::Result<T, AmbraError>;

/// Main error type for Ambra operations
#[derive(Error, Debug)]
pub enum AmbraError {
    // Host runtime errors
    #[error("Failed to create playback channel for clip '{clip}': {reason}")]
    ChannelCreation { clip: String, reason: String },

    /// Raised by the host runtime while a channel is being destroyed.
    /// The mixer recovers from this locally (logged as a warning); it only
    /// surfaces through the backend trait itself.
    #[error("Failed to tear down playback channel for clip '{clip}': {reason}")]
    ChannelTeardown { clip: String, reason: String },

    // Preset errors
    #[error("Unknown preset: '{name}'")]
    UnknownPreset { name: String },

    // Configuration errors
    #[error("Duplicate clip '{clip}' in {scope}")]
    DuplicateClip { scope: String, clip: String },

    #[error("Crossfade time must be positive and at most {max}s, got {secs}s")]
    InvalidCrossfade { secs: f32, max: f32 },

    #[error("Sound '{sound}': {field} = {value} outside [{min}, {max}]")]
    ParameterOutOfRange {
        sound: String,
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AmbraError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AmbraError::ChannelCreation { .. } => "CHANNEL_CREATION",
            AmbraError::ChannelTeardown { .. } => "CHANNEL_TEARDOWN",
            AmbraError::UnknownPreset { .. } => "UNKNOWN_PRESET",
            AmbraError::DuplicateClip { .. } => "DUPLICATE_CLIP",
            AmbraError::InvalidCrossfade { .. } => "INVALID_CROSSFADE",
            AmbraError::ParameterOutOfRange { .. } => "PARAMETER_OUT_OF_RANGE",
            AmbraError::Io(_) => "IO_ERROR",
            AmbraError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Teardown failures are always recoverable: the mixer logs them and
    /// carries on with the remaining teardown sequence.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AmbraError::ChannelTeardown { .. })
    }
}
