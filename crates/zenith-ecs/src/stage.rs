//! The stage abstraction: per-frame logic units matched to entities by
//! component kind set.
//!
//! A stage names the component kinds it requires; the orchestrator runs
//! [`Stage::update_entity`] for every live entity whose store satisfies that
//! set. [`Stage::pre_process`] and [`Stage::post_process`] bracket the
//! per-entity pass, with post-processing receiving the whole entity slice for
//! cross-entity work such as collision resolution.

use std::collections::HashSet;

use crate::component::ComponentKind;
use crate::entity::Entity;
use crate::message::MessageDispatcher;
use crate::EcsError;

// ---------------------------------------------------------------------------
// StageContext
// ---------------------------------------------------------------------------

/// Per-frame context handed to every stage callback.
///
/// Carries the fixed timestep and mutable access to the frame's message
/// dispatcher so stages can publish without owning it.
pub struct StageContext<'a> {
    /// Seconds advanced by this frame.
    pub dt: f32,
    /// Dispatcher for publishing messages; queued messages flush at the end
    /// of the frame.
    pub messages: &'a mut MessageDispatcher,
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A unit of per-frame logic dispatched over matching entities.
///
/// Entities match when their component store contains every kind in
/// [`required_kinds`](Self::required_kinds). An empty set matches every
/// entity.
pub trait Stage {
    /// Stable name used for registration, enable toggles, and logging.
    fn name(&self) -> &str;

    /// Component kinds an entity must hold to be visited by
    /// [`update_entity`](Self::update_entity).
    fn required_kinds(&self) -> &HashSet<ComponentKind>;

    /// Runs once per frame before any entity is visited.
    fn pre_process(&mut self, _ctx: &mut StageContext<'_>) {}

    /// Runs once per matching entity.
    ///
    /// Errors are isolated: the orchestrator logs the failure and continues
    /// with the next entity rather than aborting the frame.
    fn update_entity(&mut self, entity: &mut Entity, ctx: &mut StageContext<'_>)
        -> Result<(), EcsError>;

    /// Runs once per frame after every matching entity has been visited.
    ///
    /// Receives the full entity slice for cross-entity work.
    fn post_process(&mut self, _entities: &mut [Entity], _ctx: &mut StageContext<'_>) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
