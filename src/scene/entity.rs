//! Renderable entity kinds and the animation capability.
//!
//! Entities are plain data: geometry parameters, a texture reference and a
//! spin state. Nothing in here touches the GPU; the render adapter projects
//! entities into mesh buffers separately.

use serde::{Deserialize, Serialize};

/// Capability trait for anything that advances once per animation tick.
///
/// New entity kinds implement this alongside a new [`EntityKind`] variant.
pub trait Animate {
    /// Advance the animation state by `dt` seconds.
    fn animate(&mut self, dt: f32);
}

/// A planet-like body: a textured UV sphere spinning about its local Y axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Sphere radius in scene units.
    pub radius: f32,
    /// Tessellation quality (longitude and latitude segment count).
    pub quality: u32,
    /// URL of the surface texture; fetched asynchronously after the entity
    /// is already in the graph.
    pub texture_url: String,
    /// Spin rate in radians per second.
    pub rotation_speed: f32,
}

/// A decorative box with a solid color and an optional slow spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    /// Edge length in scene units.
    pub size: f32,
    /// Base color, linear RGB.
    pub color: [f32; 3],
    /// Spin rate in radians per second (0.0 for a static box).
    pub rotation_speed: f32,
}

/// Closed set of entity kinds. Extending the scene with a new kind means a
/// new variant here plus an [`Animate`] impl for its parameter struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    Planet(Planet),
    Cuboid(Cuboid),
}

impl EntityKind {
    /// Spin rate of this kind, radians per second.
    pub fn rotation_speed(&self) -> f32 {
        match self {
            EntityKind::Planet(p) => p.rotation_speed,
            EntityKind::Cuboid(c) => c.rotation_speed,
        }
    }

    /// The texture this kind wants fetched, if any.
    pub fn texture_url(&self) -> Option<&str> {
        match self {
            EntityKind::Planet(p) => Some(&p.texture_url),
            EntityKind::Cuboid(_) => None,
        }
    }
}

/// One renderable object in the scene graph.
///
/// The name is a human-readable label and is not guaranteed unique; the
/// arena id is the stable identity (see [`crate::scene::graph::SceneGraph`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// World position of the entity origin.
    pub position: [f32; 3],
    /// Current rotation about the local Y axis, radians. Persisted so a
    /// loaded scene resumes from the stored angle rather than wall time.
    #[serde(default)]
    pub spin: f32,
    #[serde(flatten)]
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(name: impl Into<String>, position: [f32; 3], kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            position,
            spin: 0.0,
            kind,
        }
    }
}

impl Animate for Entity {
    fn animate(&mut self, dt: f32) {
        self.spin += self.kind.rotation_speed() * dt;
        // Keep the angle bounded; a session left running for days should not
        // accumulate float error in the stored document.
        if self.spin.abs() > std::f32::consts::TAU {
            self.spin %= std::f32::consts::TAU;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet(speed: f32) -> Entity {
        Entity::new(
            "Test",
            [0.0, 0.0, 0.0],
            EntityKind::Planet(Planet {
                radius: 1.0,
                quality: 8,
                texture_url: "http://example.invalid/t.jpg".into(),
                rotation_speed: speed,
            }),
        )
    }

    #[test]
    fn animate_advances_spin_by_rate_times_dt() {
        let mut e = planet(0.3);
        e.animate(1.0);
        assert!((e.spin - 0.3).abs() < 1e-6);
        e.animate(0.5);
        assert!((e.spin - 0.45).abs() < 1e-6);
    }

    #[test]
    fn static_cuboid_does_not_spin() {
        let mut e = Entity::new(
            "Box",
            [1.0, 2.0, 3.0],
            EntityKind::Cuboid(Cuboid {
                size: 2.0,
                color: [0.0, 1.0, 0.0],
                rotation_speed: 0.0,
            }),
        );
        e.animate(10.0);
        assert_eq!(e.spin, 0.0);
    }

    #[test]
    fn spin_stays_bounded() {
        let mut e = planet(100.0);
        for _ in 0..1000 {
            e.animate(1.0);
        }
        assert!(e.spin.abs() <= std::f32::consts::TAU);
    }
}
