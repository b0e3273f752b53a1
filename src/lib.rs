// src/lib.rs
//! Orrery
//!
//! An interactive 3D scene viewer/editor built on wgpu and winit, with a
//! REST document-store backend for saving and loading the scene.

pub mod app;
pub mod assets;
pub mod gfx;
pub mod persist;
pub mod scene;
pub mod server;
pub mod session;

// Re-export main types for convenience
pub use app::OrreryApp;
pub use session::{SceneSession, SessionConfig};

/// Creates a viewer application configured from the environment
pub fn default() -> anyhow::Result<OrreryApp> {
    OrreryApp::new(SessionConfig::from_env())
}
