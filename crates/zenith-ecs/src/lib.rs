//! Entity-component-service runtime core.
//!
//! `zenith-ecs` provides the simulation backbone: generational entity ids,
//! per-entity component stores keyed by type, stages that dispatch over
//! entities by component kind set, a queue-and-flush message dispatcher, and
//! a mark-based timer for gameplay countdowns.
//!
//! The [`Orchestrator`] owns all of it and advances the world one fixed
//! timestep at a time. Spawns become visible at the next frame start and
//! removals apply at the frame end, so within a frame every stage observes
//! the same population.
//!
//! # Quick Start
//!
//! ```
//! use std::collections::HashSet;
//! use zenith_ecs::prelude::*;
//!
//! struct Position { x: f32 }
//! struct Velocity { dx: f32 }
//!
//! struct MovementStage {
//!     kinds: HashSet<ComponentKind>,
//! }
//!
//! impl MovementStage {
//!     fn new() -> Self {
//!         let mut kinds = HashSet::new();
//!         kinds.insert(ComponentKind::of::<Position>());
//!         kinds.insert(ComponentKind::of::<Velocity>());
//!         Self { kinds }
//!     }
//! }
//!
//! impl Stage for MovementStage {
//!     fn name(&self) -> &str { "movement" }
//!     fn required_kinds(&self) -> &HashSet<ComponentKind> { &self.kinds }
//!     fn update_entity(
//!         &mut self,
//!         entity: &mut Entity,
//!         ctx: &mut StageContext<'_>,
//!     ) -> Result<(), EcsError> {
//!         let dx = entity.component::<Velocity>()?.dx;
//!         entity.component_mut::<Position>()?.x += dx * ctx.dt;
//!         Ok(())
//!     }
//! }
//!
//! let mut orchestrator = Orchestrator::new();
//! orchestrator.add_stage(Box::new(MovementStage::new())).unwrap();
//!
//! let mut store = ComponentStore::new();
//! store.put(Position { x: 0.0 });
//! store.put(Velocity { dx: 60.0 });
//! let id = orchestrator.spawn(store);
//!
//! for _ in 0..60 {
//!     orchestrator.update(1.0 / 60.0);
//! }
//!
//! let entity = orchestrator.entity(id).unwrap();
//! assert!((entity.get::<Position>().unwrap().x - 60.0).abs() < 1e-3);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod message;
pub mod orchestrator;
pub mod stage;
pub mod timer;

pub use component::{ComponentKind, ComponentStore};
pub use entity::{Entity, EntityAllocator, EntityId};
pub use message::{ListenerAction, ListenerId, Message, MessageDispatcher};
pub use orchestrator::Orchestrator;
pub use stage::{Stage, StageContext};
pub use timer::{TimeMark, Timer, TimerError};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced by the runtime core.
#[derive(Debug, Error)]
pub enum EcsError {
    /// An operation required a component the entity does not hold.
    #[error("entity {entity} is missing component {component}")]
    MissingComponent {
        /// The entity that was inspected.
        entity: EntityId,
        /// Type name of the absent component.
        component: &'static str,
    },

    /// A stage was registered under a name that is already taken.
    #[error("a stage named {name:?} is already registered")]
    DuplicateStage {
        /// The conflicting stage name.
        name: String,
    },

    /// A stage toggle referenced a name no stage is registered under.
    #[error("no stage named {name:?} is registered")]
    UnknownStage {
        /// The unmatched stage name.
        name: String,
    },

    /// Timer construction or mark placement was rejected.
    #[error(transparent)]
    Timer(#[from] TimerError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Single-import surface for hosts and stage implementations.
pub mod prelude {
    pub use crate::component::{ComponentKind, ComponentStore};
    pub use crate::entity::{Entity, EntityId};
    pub use crate::message::{ListenerAction, ListenerId, Message, MessageDispatcher};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::stage::{Stage, StageContext};
    pub use crate::timer::{TimeMark, Timer};
    pub use crate::EcsError;
}
