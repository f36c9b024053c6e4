//! Component kinds and the per-entity component store.
//!
//! A [`ComponentKind`] is an explicit type tag: the Rust `TypeId` plus a
//! captured type name for diagnostics. Stages declare the kinds they require
//! and the orchestrator matches entities by kind set, so dispatch never
//! depends on runtime downcasting beyond the store's own typed accessors.
//!
//! A [`ComponentStore`] maps each kind to exactly one component instance.
//! Insertion overwrites; lookup returns the instance or absence.

use std::any::{Any, TypeId};
use std::collections::hash_map::Keys;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// A type tag identifying one component kind.
///
/// Equality and hashing use only the `TypeId`; the name rides along for
/// error messages and logging.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// The kind tag for component type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The captured type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.name)
    }
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Mapping from component kind to exactly one component instance.
///
/// An entity holds at most one component of each kind; [`put`](Self::put)
/// overwrites any previous instance of the same kind.
#[derive(Default)]
pub struct ComponentStore {
    slots: HashMap<ComponentKind, Box<dyn Any>>,
}

impl ComponentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component, returning the previous instance of that kind if
    /// one was present.
    pub fn put<T: 'static>(&mut self, component: T) -> Option<T> {
        self.slots
            .insert(ComponentKind::of::<T>(), Box::new(component))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// The component of type `T`, or `None` when absent.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.slots
            .get(&ComponentKind::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Mutable component of type `T`, or `None` when absent.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&ComponentKind::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Remove and return the component of type `T`.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        self.slots
            .remove(&ComponentKind::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Whether a component of the given kind is present.
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Whether every kind in `kinds` is present.
    pub fn has_all(&self, kinds: &HashSet<ComponentKind>) -> bool {
        kinds.iter().all(|kind| self.slots.contains_key(kind))
    }

    /// Iterator over the kinds currently stored.
    pub fn kinds(&self) -> Keys<'_, ComponentKind, Box<dyn Any>> {
        self.slots.keys()
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
