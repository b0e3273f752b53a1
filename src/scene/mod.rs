//! Scene model: entity arena, camera, lights, and the persisted document
//! form. Deliberately free of wgpu/winit types so serialization and tests
//! never touch the GPU.

pub mod camera;
pub mod document;
pub mod entity;
pub mod graph;
pub mod light;

pub use camera::Camera;
pub use document::{DocumentError, SceneDocument, FORMAT_VERSION};
pub use entity::{Animate, Cuboid, Entity, EntityKind, Planet};
pub use graph::{EntityId, SceneGraph};
pub use light::Light;
