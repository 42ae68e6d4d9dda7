// SPDX-License-Identifier: MIT

//! Report platform: plugins on disk, handlers, rendering, sessions and the
//! HTTP API around the engine

pub mod answers;
pub mod config;
pub mod handlers;
pub mod loader;
pub mod registry;
pub mod render;
pub mod server;
pub mod session;
pub mod types;
pub mod validation;

pub use config::PlatformConfig;
pub use loader::PluginLoader;
pub use registry::{ReportHandler, ReportRegistry};
pub use render::DocumentRenderer;
pub use session::ReportSession;
pub use types::{Manifest, PluginConfig, PluginInfo};
