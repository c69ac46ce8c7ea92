//! # Persona WASM
//!
//! Browser fingerprint normalization compiled to WebAssembly.
//!
//! A Profile describes a synthetic identity: user agent, hardware counts,
//! screen geometry, timezone, GPU strings, plugin names and, optionally, a
//! location. Installing it patches the live page so every introspectable
//! surface reports that identity and the values agree with each other.
//!
//! ## Architecture
//!
//! ```text
//! install_profile (JS)
//!   ↓
//! Profile + OverrideConfig → InstallContext
//!   ↓
//! OverrideRegistry
//!   ↓
//! PropertyOverride / intercept / NoiseInjector units
//!   ↓
//! Navigator, Screen, Window, Intl, Date, WebGL, Canvas, Permissions, ...
//! ```
//!
//! ## Features
//!
//! - **Native toString()**: every getter and trap is a WASM closure
//! - **Descriptor fidelity**: accessors land where the native ones live,
//!   getter-only and configurable
//! - **Call-contract preservation**: unrecognized calls always reach the
//!   original method with the original receiver
//! - **Per-call pixel noise**: canvas and WebGL read-back never hash the same twice

use wasm_bindgen::prelude::*;

pub mod error;
pub mod overrides;
pub mod profile;

pub use error::{ErrorCode, ErrorInfo, PersonaError, Result};
pub use overrides::context::{Geometry, InstallContext, OverrideConfig, ScreenMetrics};
pub use overrides::noise::NoiseInjector;
pub use overrides::plugins::{FakePlugin, PluginCatalog};
pub use overrides::{InstallReport, OverrideRegistry, OverrideStatus};
pub use profile::{Coordinates, Profile};

/// Initialize the module
///
/// Sets up logging. A host that already installed a logger keeps its own.
#[wasm_bindgen(start)]
pub fn init() {
    let _ = console_log::init_with_level(log::Level::Info);
    log::debug!("persona-wasm initialized");
}
