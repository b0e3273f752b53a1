//! The scene document: the JSON-serializable snapshot of a scene graph.
//!
//! This is the only shape that crosses the persistence boundary. The stored
//! document is versioned so a future schema change can be detected instead of
//! silently misread.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::camera::Camera;
use super::entity::Entity;
use super::graph::SceneGraph;
use super::light::Light;

/// Current on-the-wire schema version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported scene document version {found} (expected {FORMAT_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("malformed scene document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A structurally complete serialization of camera + lights + entities,
/// sufficient for exact visual reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub format_version: u32,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub entities: Vec<Entity>,
}

impl SceneGraph {
    /// Snapshot the graph. Pure read; the graph is untouched.
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            format_version: FORMAT_VERSION,
            camera: self.camera.clone(),
            lights: self.lights.clone(),
            entities: self.iter().map(|(_, e)| e.clone()).collect(),
        }
    }

    /// Rebuilds a graph from a snapshot.
    ///
    /// Entities come back behaviorally identical to freshly constructed ones:
    /// rotation speed is restored verbatim and spin resumes from the stored
    /// angle, not from elapsed wall time. Fresh arena ids are assigned.
    pub fn from_document(doc: SceneDocument) -> Result<SceneGraph, DocumentError> {
        if doc.format_version != FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: doc.format_version,
            });
        }

        let mut graph = SceneGraph::new();
        graph.camera = doc.camera;
        graph.lights = doc.lights;
        for entity in doc.entities {
            graph.insert(entity);
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::entity::{Cuboid, EntityKind, Planet};

    fn sample_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        graph.camera.position = [0.0, 1.0, 12.0];
        graph.camera.fovy_deg = 60.0;
        graph.lights.push(Light::soft_ambient());
        graph.lights.push(Light::default_directional());
        graph.insert(Entity::new(
            "Earth",
            [0.0, 0.0, 0.0],
            EntityKind::Planet(Planet {
                radius: 6.371,
                quality: 32,
                texture_url: "http://example.invalid/earth.jpg".into(),
                rotation_speed: 0.3,
            }),
        ));
        let mut moon = Entity::new(
            "Moon",
            [6.0, 10.0, 0.0],
            EntityKind::Planet(Planet {
                radius: 1.737,
                quality: 32,
                texture_url: "http://example.invalid/moon.jpg".into(),
                rotation_speed: 0.3,
            }),
        );
        moon.spin = 1.25;
        graph.insert(moon);
        graph.insert(Entity::new(
            "Marker Cube",
            [6.0, 6.0, 0.0],
            EntityKind::Cuboid(Cuboid {
                size: 2.0,
                color: [0.0, 1.0, 0.0],
                rotation_speed: 0.0,
            }),
        ));
        graph
    }

    #[test]
    fn round_trip_preserves_structure() {
        let graph = sample_graph();
        let doc = graph.to_document();

        // Through actual JSON, the way the persistence layer carries it.
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: SceneDocument = serde_json::from_str(&json).unwrap();
        let rebuilt = SceneGraph::from_document(parsed).unwrap();

        assert_eq!(rebuilt.len(), graph.len());
        let original: Vec<_> = graph.iter().map(|(_, e)| e.clone()).collect();
        let restored: Vec<_> = rebuilt.iter().map(|(_, e)| e.clone()).collect();
        assert_eq!(original, restored);

        assert_eq!(rebuilt.camera.fovy_deg, graph.camera.fovy_deg);
        assert_eq!(rebuilt.camera.znear, graph.camera.znear);
        assert_eq!(rebuilt.camera.zfar, graph.camera.zfar);
        assert_eq!(rebuilt.camera.position, graph.camera.position);
        assert_eq!(rebuilt.lights, graph.lights);
    }

    #[test]
    fn to_document_does_not_mutate_the_graph() {
        let graph = sample_graph();
        let before: Vec<_> = graph.iter().map(|(_, e)| e.clone()).collect();
        let _ = graph.to_document();
        let after: Vec<_> = graph.iter().map(|(_, e)| e.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut doc = sample_graph().to_document();
        doc.format_version = 99;
        match SceneGraph::from_document(doc) {
            Err(DocumentError::UnsupportedVersion { found: 99 }) => {}
            other => panic!("expected version error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn entity_kind_tags_are_stable() {
        let doc = sample_graph().to_document();
        let value = serde_json::to_value(&doc).unwrap();
        let kinds: Vec<_> = value["entities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, ["planet", "planet", "cuboid"]);
    }
}
