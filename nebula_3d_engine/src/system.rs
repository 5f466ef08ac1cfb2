//! Entity identity and the component/system discipline.
//!
//! Every runtime system (spatial, collision, render) owns its components
//! exclusively, keyed by [`EntityId`]. Removal from one system never
//! cascades into another. Ids are minted by an explicit [`IdAllocator`]
//! owned by the application state; there is no process-wide counter.

use std::fmt;
use std::hash::{Hash, Hasher};
use rustc_hash::{FxHashSet, FxHasher};

/// Unique identity of an entity, stable for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints entity ids
///
/// Two kinds of id coexist: counter-allocated ids from [`next_id`], and
/// string-derived ids from [`id_from_string`] (used for entities named in
/// map files). String-derived ids are recorded in a reserved set which the
/// counter skips, so the two kinds never collide.
///
/// [`next_id`]: IdAllocator::next_id
/// [`id_from_string`]: IdAllocator::id_from_string
#[derive(Default)]
pub struct IdAllocator {
    next_id: u64,
    reserved: FxHashSet<u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next counter id, skipping reserved ids
    pub fn next_id(&mut self) -> EntityId {
        while self.reserved.contains(&self.next_id) {
            self.next_id += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Derive a stable id from a name and reserve it
    ///
    /// The same name always yields the same id within a process, so named
    /// entities can be looked up from any system without a registry.
    pub fn id_from_string(&mut self, name: &str) -> EntityId {
        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);
        let id = hasher.finish();
        self.reserved.insert(id);
        EntityId(id)
    }
}

/// A per-entity record belonging to exactly one system
pub trait Component {
    /// The owning entity
    fn entity_id(&self) -> EntityId;
}

/// Map discipline shared by the runtime systems
///
/// `add` is deliberately not part of the trait: its signature differs per
/// system (the collision system needs the owning entity's spatial component
/// to transform its volume into world space).
pub trait System {
    type Component: Component;

    /// Remove and return the entity's component, if present
    fn remove(&mut self, entity_id: EntityId) -> Option<Self::Component>;

    /// Whether the entity has a component in this system
    fn has(&self, entity_id: EntityId) -> bool;

    /// The entity's component
    fn get(&self, entity_id: EntityId) -> Option<&Self::Component>;

    /// The entity's component, mutably
    fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut Self::Component>;

    /// Per-frame update hook
    fn update(&mut self);
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
