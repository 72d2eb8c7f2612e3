//! Bridge settings

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::input::KeyboardFilter;
use crate::platform::Platform;
use crate::utils::ConfigError;

/// Mirror used for engine artifact downloads
pub const DEFAULT_DOWNLOAD_MIRROR: &str = "https://dl.ccbluex.net/resources";

/// Default frame rate requested from the engine
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Upper bound accepted for `frame_rate`
pub const MAX_FRAME_RATE: u32 = 240;

/// Settings shared by every session of a [`SessionContext`](crate::SessionContext)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Skip the artifact provisioning check
    pub skip_download: bool,
    pub download_mirror: String,
    pub user_agent: Option<String>,
    /// Control+R reloads the page
    pub browser_controls: bool,
    /// Zoom and history shortcuts
    pub extended_controls: bool,
    pub transparent: bool,
    pub frame_rate: u32,
    /// Overrides the platform smooth-scroll policy
    pub smooth_scroll: Option<bool>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            skip_download: false,
            download_mirror: DEFAULT_DOWNLOAD_MIRROR.to_string(),
            user_agent: None,
            browser_controls: true,
            extended_controls: false,
            transparent: false,
            frame_rate: DEFAULT_FRAME_RATE,
            smooth_scroll: None,
        }
    }
}

impl BridgeSettings {
    /// Parse and validate settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mirror = Url::parse(&self.download_mirror).map_err(|e| ConfigError::Invalid {
            field: "download_mirror",
            reason: e.to_string(),
        })?;
        if !matches!(mirror.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "download_mirror",
                reason: format!("unsupported scheme `{}`", mirror.scheme()),
            });
        }
        if !(1..=MAX_FRAME_RATE).contains(&self.frame_rate) {
            return Err(ConfigError::Invalid {
                field: "frame_rate",
                reason: format!("{} is outside 1..={}", self.frame_rate, MAX_FRAME_RATE),
            });
        }
        Ok(())
    }

    /// Shortcut configuration for the input translator
    pub fn keyboard_filter(&self) -> KeyboardFilter {
        KeyboardFilter {
            browser_controls: self.browser_controls,
            extended_controls: self.extended_controls,
        }
    }

    /// Whether wheel deltas pass through unmodified on `platform`
    pub fn native_smooth_scroll(&self, platform: Option<Platform>) -> bool {
        self.smooth_scroll
            .unwrap_or_else(|| platform.is_some_and(|p| p.has_native_smooth_scroll()))
    }
}
