//! Named per-entity behaviors run every frame.
//!
//! A [`Behaviors`] component holds an ordered list of named updatables.
//! The [`BehaviorStage`] detaches the component while running them so each
//! updatable gets full mutable access to its entity, then reattaches it.

use std::collections::HashSet;

use zenith_ecs::prelude::*;

type BehaviorFn = Box<dyn FnMut(&mut Entity, f32)>;

// ---------------------------------------------------------------------------
// Behaviors
// ---------------------------------------------------------------------------

/// An ordered collection of named per-frame updatables.
#[derive(Default)]
pub struct Behaviors {
    entries: Vec<(String, BehaviorFn)>,
}

impl Behaviors {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Same collection with a behavior appended.
    pub fn with_behavior(
        mut self,
        name: impl Into<String>,
        behavior: impl FnMut(&mut Entity, f32) + 'static,
    ) -> Self {
        self.add(name, behavior);
        self
    }

    /// Append a behavior. Behaviors run in insertion order.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        behavior: impl FnMut(&mut Entity, f32) + 'static,
    ) {
        self.entries.push((name.into(), Box::new(behavior)));
    }

    /// Remove the behavior registered under `name`. Returns `false` when no
    /// such behavior exists.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_name, _)| entry_name != name);
        self.entries.len() != before
    }

    /// Registered behavior names, in run order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered behaviors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no behaviors are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn run_all(&mut self, entity: &mut Entity, dt: f32) {
        for (_, behavior) in &mut self.entries {
            behavior(entity, dt);
        }
    }
}

impl std::fmt::Debug for Behaviors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// BehaviorStage
// ---------------------------------------------------------------------------

/// Runs every entity's [`Behaviors`] in insertion order.
pub struct BehaviorStage {
    kinds: HashSet<ComponentKind>,
}

impl BehaviorStage {
    /// A behavior stage requiring the [`Behaviors`] component.
    pub fn new() -> Self {
        let mut kinds = HashSet::new();
        kinds.insert(ComponentKind::of::<Behaviors>());
        Self { kinds }
    }
}

impl Default for BehaviorStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for BehaviorStage {
    fn name(&self) -> &str {
        "behavior"
    }

    fn required_kinds(&self) -> &HashSet<ComponentKind> {
        &self.kinds
    }

    fn update_entity(
        &mut self,
        entity: &mut Entity,
        ctx: &mut StageContext<'_>,
    ) -> Result<(), EcsError> {
        // Detached while running so behaviors may mutate any component,
        // then reattached. A behavior replacing the Behaviors component
        // loses to the reattachment.
        let mut behaviors = match entity.take::<Behaviors>() {
            Some(behaviors) => behaviors,
            None => return Ok(()),
        };
        behaviors.run_all(entity, ctx.dt);
        entity.put(behaviors);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
