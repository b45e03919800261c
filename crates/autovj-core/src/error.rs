//! Error types for setup, configuration and audio capture
//!
//! The analysis data path itself has no error channel; these errors only
//! come from loading config, touching the file system or opening devices.
use thiserror::Error;

/// Engine errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Device enumeration or configuration failed
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Stream could not be built or started
    #[error("Audio stream error: {0}")]
    AudioStream(String),

    /// Tried to start a session with no input device selected
    #[error("No input device selected")]
    NoDeviceSelected,

    /// Operation not allowed while a live session is running
    #[error("A live session is already running")]
    SessionActive,
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(feature = "audio")]
mod cpal_conversions {
    use super::CoreError;

    impl From<cpal::DevicesError> for CoreError {
        fn from(err: cpal::DevicesError) -> Self {
            CoreError::AudioDevice(format!("Failed to enumerate devices: {}", err))
        }
    }

    impl From<cpal::DeviceNameError> for CoreError {
        fn from(err: cpal::DeviceNameError) -> Self {
            CoreError::AudioDevice(format!("Failed to get device name: {}", err))
        }
    }

    impl From<cpal::SupportedStreamConfigsError> for CoreError {
        fn from(err: cpal::SupportedStreamConfigsError) -> Self {
            CoreError::AudioDevice(format!("Failed to query input configs: {}", err))
        }
    }

    impl From<cpal::DefaultStreamConfigError> for CoreError {
        fn from(err: cpal::DefaultStreamConfigError) -> Self {
            CoreError::AudioDevice(format!("Failed to get default input config: {}", err))
        }
    }

    impl From<cpal::BuildStreamError> for CoreError {
        fn from(err: cpal::BuildStreamError) -> Self {
            CoreError::AudioStream(format!("Failed to build input stream: {}", err))
        }
    }

    impl From<cpal::PlayStreamError> for CoreError {
        fn from(err: cpal::PlayStreamError) -> Self {
            CoreError::AudioStream(format!("Failed to start input stream: {}", err))
        }
    }
}
