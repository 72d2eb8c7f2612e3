//! Explicitly owned bridge context
//!
//! Holds the settings, platform and render queue shared by every session
//! and tracks the sessions it created so they can be closed on shutdown.

use std::sync::{Mutex, Weak};

use super::{lock, BrowserSession, SharedSession};
use crate::compositor::TextureBackend;
use crate::config::BridgeSettings;
use crate::engine::BrowserEngine;
use crate::input::InputTranslator;
use crate::platform::Platform;
use crate::provision::{self, ArtifactProvisioner};
use crate::render_queue::RenderSubmitter;
use crate::utils::{BridgeError, Result};

pub struct SessionContext {
    settings: BridgeSettings,
    platform: Option<Platform>,
    render: RenderSubmitter,
    sessions: Vec<Weak<Mutex<BrowserSession>>>,
    shut_down: bool,
}

impl SessionContext {
    /// Validate `settings`, provision the engine artifacts and create the context
    pub fn initialize(
        settings: BridgeSettings,
        provisioner: &mut dyn ArtifactProvisioner,
        render: RenderSubmitter,
    ) -> Result<Self> {
        settings.validate()?;

        let platform = Platform::current();
        match platform {
            Some(platform) => log::info!("Initializing bridge on {}", platform),
            None => log::warn!(
                "Unsupported platform {}/{}",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
        }

        provision::ensure_provisioned(provisioner, &settings)?;

        Ok(Self {
            settings,
            platform,
            render,
            sessions: Vec::new(),
            shut_down: false,
        })
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Create a session driving `engine` and presenting into `backend`
    pub fn create_session(
        &mut self,
        engine: Box<dyn BrowserEngine>,
        backend: Box<dyn TextureBackend>,
    ) -> Result<SharedSession> {
        if self.shut_down {
            return Err(BridgeError::ContextShutDown);
        }

        let input = InputTranslator::new(
            self.settings.native_smooth_scroll(self.platform),
            self.settings.keyboard_filter(),
        );
        let session = SharedSession::new(BrowserSession::new(engine, backend, input, self.render.clone()));

        self.sessions.retain(|s| s.strong_count() > 0);
        self.sessions.push(session.downgrade());
        log::debug!("Created session ({} tracked)", self.sessions.len());
        Ok(session)
    }

    /// [`create_session`](Self::create_session) and announce the initial view size
    pub fn create_session_with_size(
        &mut self,
        engine: Box<dyn BrowserEngine>,
        backend: Box<dyn TextureBackend>,
        width: u32,
        height: u32,
    ) -> Result<SharedSession> {
        let session = self.create_session(engine, backend)?;
        session.with_session(|s| s.resize(width, height));
        Ok(session)
    }

    /// Sessions that are still alive and open
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|s| !lock(s).is_closed())
            .count()
    }

    /// Close every tracked session. Returns the number closed by this call.
    pub fn shutdown(&mut self) -> usize {
        if self.shut_down {
            return 0;
        }
        self.shut_down = true;

        let closed = self
            .sessions
            .drain(..)
            .filter_map(|s| s.upgrade())
            .filter(|s| lock(s).close())
            .count();
        log::info!("Bridge shut down, closed {} session(s)", closed);
        closed
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
