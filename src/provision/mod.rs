//! Engine artifact provisioning
//!
//! The engine binaries are fetched by an external pipeline. The bridge only
//! needs to know whether a download is required and to run it before the
//! first session is created.

use crate::config::BridgeSettings;
use crate::utils::ProvisionError;

/// Pipeline that installs the engine artifacts
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactProvisioner {
    /// Whether the installed artifacts are missing or outdated
    fn requires_download(&self) -> bool;

    /// Fetch and verify the artifacts
    fn download(&mut self) -> Result<(), ProvisionError>;
}

/// Artifacts installed out of band; never downloads
#[derive(Debug, Clone, Copy, Default)]
pub struct PreinstalledArtifacts;

impl ArtifactProvisioner for PreinstalledArtifacts {
    fn requires_download(&self) -> bool {
        false
    }

    fn download(&mut self) -> Result<(), ProvisionError> {
        Ok(())
    }
}

/// Make sure the artifacts are present. Returns `true` if a download ran.
pub fn ensure_provisioned(
    provisioner: &mut dyn ArtifactProvisioner,
    settings: &BridgeSettings,
) -> Result<bool, ProvisionError> {
    if settings.skip_download {
        log::info!("Skipping artifact check");
        return Ok(false);
    }
    if !provisioner.requires_download() {
        log::info!("Engine artifacts are up to date");
        return Ok(false);
    }

    log::info!("Downloading engine artifacts from {}", settings.download_mirror);
    provisioner.download()?;
    log::info!("Engine artifacts installed");
    Ok(true)
}
