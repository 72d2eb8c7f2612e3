//! Error types for the off-screen browser bridge

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Texture or compositing errors
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    /// Settings errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Engine binary provisioning errors
    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),
    /// GPU device acquisition errors
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The session context has already been shut down
    #[error("Session context is shut down")]
    ContextShutDown,
}

/// Surface compositing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// The texture has not been allocated on the render thread yet
    #[error("Texture is not initialized")]
    NotInitialized,
    /// The handle does not name a live texture
    #[error("Unknown texture handle {0}")]
    UnknownHandle(u64),
    /// A pixel buffer is shorter than its reported dimensions require
    #[error("Buffer of {actual} bytes is too small for {width}x{height} (needs {expected})")]
    BufferTooSmall {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// A popup paint arrived before any popup geometry
    #[error("Popup damage without popup geometry")]
    NoPopupGeometry,
    /// The backend refused the operation
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Settings errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read settings file
    #[error("Failed to read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse settings
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// Settings parsed but are not usable
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Engine artifact provisioning errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// A downloaded artifact did not match its published checksum
    #[error("Integrity check failed for {file}: expected {expected}, got {actual}")]
    Integrity {
        file: String,
        expected: String,
        actual: String,
    },
    /// The artifact could not be fetched
    #[error("Network error: {0}")]
    Network(String),
}

/// GPU-related errors
#[derive(Debug, Error)]
pub enum GpuError {
    /// No suitable GPU adapter found
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    /// Failed to create device
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),
}

/// Convenience Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
