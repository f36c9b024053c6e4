//! Entity identity, allocation, and the per-entity component container.
//!
//! An [`EntityId`] is a generational handle: the index names a slot in the
//! allocator and the generation is bumped every time that slot is recycled,
//! so handles held across a despawn become stale and fail [`EntityAllocator::is_alive`].
//!
//! An [`Entity`] pairs an id with its [`ComponentStore`] and a liveness flag.
//! The flag is only a *mark*: entities flagged dead stay in the live
//! collection until the orchestrator's frame boundary.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::component::{ComponentKind, ComponentStore};
use crate::EcsError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    /// Slot index in the allocator.
    pub index: u32,
    /// Generation of the slot at allocation time.
    pub generation: u32,
}

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s with generational tracking.
///
/// Free indices are kept in a FIFO queue so that generations are spread out
/// over time rather than concentrated on a hot index.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation for each index slot.
    generations: Vec<u32>,
    /// Whether the slot is currently alive.
    alive: Vec<bool>,
    /// Free-list of recyclable indices.
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`], reusing a recycled index when one is
    /// available.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            // The generation was already bumped on deallocate.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Deallocate an entity, bumping the slot generation so outstanding
    /// handles become stale.
    ///
    /// Returns `false` if the id was already dead or stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        let idx = id.index as usize;
        if idx >= self.generations.len()
            || self.generations[idx] != id.generation
            || !self.alive[idx]
        {
            return false;
        }
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index);
        true
    }

    /// Whether `id` refers to a currently allocated entity whose generation
    /// matches the slot.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation
    }

    /// Number of currently allocated entities.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An identity plus its component store and a liveness mark.
///
/// Entities compare by identity, never by component values. Marking an entity
/// dead does not remove it; the orchestrator drops dead entities at the end
/// of the frame so no stage observes a mid-frame disappearance.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    store: ComponentStore,
    dead: bool,
}

impl Entity {
    /// Wrap an allocated id and a component store.
    pub fn new(id: EntityId, store: ComponentStore) -> Self {
        Self {
            id,
            store,
            dead: false,
        }
    }

    /// The entity's identifier.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Read access to the component store.
    #[inline]
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Mutable access to the component store.
    #[inline]
    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    /// Whether this entity has been marked for removal.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Mark or unmark this entity for removal at the frame boundary.
    #[inline]
    pub fn set_dead(&mut self, dead: bool) {
        self.dead = dead;
    }

    /// Whether the store holds a component of type `T`.
    pub fn has<T: 'static>(&self) -> bool {
        self.store.contains(ComponentKind::of::<T>())
    }

    /// The component of type `T`, or `None` when absent.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.store.get::<T>()
    }

    /// Mutable component of type `T`, or `None` when absent.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.store.get_mut::<T>()
    }

    /// Insert a component, overwriting and returning any previous instance.
    pub fn put<T: 'static>(&mut self, component: T) -> Option<T> {
        self.store.put(component)
    }

    /// Remove and return the component of type `T`.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        self.store.take::<T>()
    }

    /// The component of type `T`, as a typed failure when absent.
    ///
    /// Use this where presence is an invariant (a stage's required kinds, a
    /// reaction that only fires for matching fixtures). For a plain presence
    /// probe use [`get`](Self::get) or [`has`](Self::has).
    pub fn component<T: 'static>(&self) -> Result<&T, EcsError> {
        self.store.get::<T>().ok_or(EcsError::MissingComponent {
            entity: self.id,
            component: ComponentKind::of::<T>().name(),
        })
    }

    /// Mutable counterpart of [`component`](Self::component).
    pub fn component_mut<T: 'static>(&mut self) -> Result<&mut T, EcsError> {
        let id = self.id;
        self.store
            .get_mut::<T>()
            .ok_or(EcsError::MissingComponent {
                entity: id,
                component: ComponentKind::of::<T>().name(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
