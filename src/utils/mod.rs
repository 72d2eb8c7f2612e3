//! Shared utilities and error types

pub mod error;

pub use error::{BridgeError, ConfigError, GpuError, ProvisionError, Result, SurfaceError};
