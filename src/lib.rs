//! # osr-bridge - Off-Screen Browser Session Bridge
//!
//! Connects an embedded browser engine that renders off-screen to a host
//! application that composites the page into its own GPU pipeline and
//! feeds it pointer, wheel and keyboard input.
//!
//! ## Architecture
//!
//! The bridge is organized into the following core modules:
//!
//! - **compositor**: damage-aware texture uploads and popup overlay recomposition
//! - **input**: host input to engine event translation, click counting, shortcut chords
//! - **drag**: off-screen drag-and-drop state machine
//! - **cursor**: cursor catalogue, drag cursor virtualization, host listener
//! - **engine**: traits the engine binding implements and consumes
//! - **session**: per-browser session, thread-safe handle, owned session context
//! - **render_queue**: tasks marshaled onto the host render thread
//! - **platform**: platform detection and smooth-scroll policy
//! - **config**: bridge settings
//! - **provision**: engine artifact provisioning interface
//! - **utils**: shared error types

pub mod compositor;
pub mod config;
pub mod cursor;
pub mod drag;
pub mod engine;
pub mod input;
pub mod platform;
pub mod provision;
pub mod render_queue;
pub mod session;
pub mod utils;

// Re-export main types for convenience
pub use config::BridgeSettings;
pub use engine::{BrowserEngine, EngineCallbacks};
pub use render_queue::{RenderQueue, RenderSubmitter};
pub use session::{BrowserSession, SessionContext, SharedSession};
pub use utils::error::{BridgeError, Result};

/// Bridge version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "osr-bridge";
