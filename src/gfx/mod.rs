//! # Graphics Module
//!
//! Everything that touches wgpu lives under here: the render engine
//! (surface, device, pipeline), procedural geometry, texture resources, and
//! the adapter that projects the entity arena into GPU objects. The scene
//! model never imports from this module; the dependency points one way.

pub mod geometry;
pub mod render_engine;
pub mod scene_adapter;
pub mod texture;
pub mod vertex;

pub use render_engine::RenderEngine;
pub use scene_adapter::SceneAdapter;
