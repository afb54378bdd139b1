//! Local entities mirrored from the room.
//!
//! Each remote player or resource gets exactly one [`LocalEntity`], keyed by
//! the id the room assigned to it. The entity carries what is drawn now
//! (`position`) and what the server last said (`server`).

use std::collections::BTreeMap;

use grind_shared::{
    math::Vec2,
    render::{SpriteHandle, TextHandle},
};

/// Last authoritative fields reported for an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerSnapshot {
    pub position: Vec2,
    pub health: Option<u32>,
}

impl ServerSnapshot {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            health: None,
        }
    }
}

/// On-screen representation of a remote entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEntity {
    pub position: Vec2,
    pub sprite: SpriteHandle,
    pub server: ServerSnapshot,
}

impl LocalEntity {
    /// A freshly spawned entity sits exactly on its server position.
    pub fn spawned(sprite: SpriteHandle, server: ServerSnapshot) -> Self {
        Self {
            position: server.position,
            sprite,
            server,
        }
    }
}

/// A player entity. The local player also carries a marker drawn at its
/// authoritative position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEntity {
    pub entity: LocalEntity,
    pub reference_marker: Option<SpriteHandle>,
}

/// A resource entity with its health label.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntity {
    pub entity: LocalEntity,
    pub label: TextHandle,
    pub health: u32,
}

/// Entities keyed by server id, iterated in id order.
#[derive(Debug)]
pub struct EntityRegistry<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for EntityRegistry<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> EntityRegistry<K, V> {
    /// Inserts an entity, handing back whatever it replaced.
    pub fn insert(&mut self, id: K, entity: V) -> Option<V> {
        self.entries.insert(id, entity)
    }

    pub fn remove(&mut self, id: &K) -> Option<V> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &K) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &K) -> Option<&mut V> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut reg = EntityRegistry::default();
        assert!(reg.insert("a", 1).is_none());
        assert_eq!(reg.insert("a", 2), Some(1));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&"a"), Some(&2));
    }

    #[test]
    fn removing_unknown_id_is_harmless() {
        let mut reg: EntityRegistry<&str, u32> = EntityRegistry::default();
        assert!(reg.remove(&"ghost").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn spawned_entity_starts_on_server_position() {
        let e = LocalEntity::spawned(SpriteHandle(1), ServerSnapshot::at(Vec2::new(3.0, 4.0)));
        assert_eq!(e.position, Vec2::new(3.0, 4.0));
        assert_eq!(e.server.health, None);
    }
}
