//! The scene graph: an arena of entities plus the current camera and lights.
//!
//! Entities are keyed by stable ids from a monotone counter; ids are never
//! reused within one graph. All mutation happens on the session thread, so
//! the arena needs no interior locking.

use std::collections::BTreeMap;

use super::camera::Camera;
use super::entity::{Animate, Entity};
use super::light::Light;

/// Stable identity of an entity within one graph.
///
/// Ids do not survive a graph replacement: a load builds a fresh graph with
/// fresh ids, and everything keyed on the old ids (GPU objects, pending
/// texture loads) is rebuilt from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

pub struct SceneGraph {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    pub camera: Camera,
    pub lights: Vec<Light>,
}

impl SceneGraph {
    /// Creates an empty graph with a default camera and no lights.
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 0,
            camera: Camera::default(),
            lights: Vec::new(),
        }
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    /// Detaches and destroys one entity. Returns it if it was present.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.entities.iter_mut().map(|(id, e)| (*id, e))
    }

    /// Advances every entity's animation step exactly once.
    pub fn animate_all(&mut self, dt: f32) {
        for entity in self.entities.values_mut() {
            entity.animate(dt);
        }
    }

    /// Names are labels, not keys, but the editor prefers them unique.
    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.entities.values().any(|e| e.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::entity::{Cuboid, EntityKind};

    fn cuboid(name: &str) -> Entity {
        Entity::new(
            name,
            [0.0, 0.0, 0.0],
            EntityKind::Cuboid(Cuboid {
                size: 1.0,
                color: [1.0, 1.0, 1.0],
                rotation_speed: 0.0,
            }),
        )
    }

    #[test]
    fn ids_are_stable_and_not_reused() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(cuboid("a"));
        let b = graph.insert(cuboid("b"));
        assert_ne!(a, b);

        graph.remove(a);
        let c = graph.insert(cuboid("c"));
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn remove_is_a_noop_for_unknown_ids() {
        let mut graph = SceneGraph::new();
        let id = graph.insert(cuboid("a"));
        graph.remove(id);
        assert!(graph.remove(id).is_none());
        assert!(graph.is_empty());
    }

    #[test]
    fn ensure_unique_name_suffixes_duplicates() {
        let mut graph = SceneGraph::new();
        graph.insert(cuboid("Moon"));
        assert_eq!(graph.ensure_unique_name("Moon"), "Moon (1)");
        assert_eq!(graph.ensure_unique_name("Earth"), "Earth");
    }
}
