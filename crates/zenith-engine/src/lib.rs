//! Zenith Engine -- 2D AABB physics, damage, and level plumbing on the ECS core.
//!
//! This crate builds on [`zenith_ecs`] with the gameplay-facing stages: a
//! [`PhysicsStage`](physics::PhysicsStage) that integrates bodies, resolves
//! block collisions, and dispatches fixture reactions; health and damage
//! handling; trajectories, per-entity behaviors, out-of-bounds culling; and
//! spawn-layer level population.
//!
//! # Quick Start
//!
//! ```
//! use zenith_engine::prelude::*;
//!
//! let mut orchestrator = Orchestrator::new();
//! orchestrator
//!     .add_stage(Box::new(PhysicsStage::new(Vec2::new(0.0, 600.0))))
//!     .unwrap();
//! orchestrator.add_stage(Box::new(HealthStage::new())).unwrap();
//!
//! // A dynamic body falling onto a static floor.
//! let mut store = ComponentStore::new();
//! store.put(Body::new(Aabb::new(20.0, 0.0, 16.0, 16.0), BodyType::Dynamic));
//! let faller = orchestrator.spawn(store);
//!
//! let mut store = ComponentStore::new();
//! store.put(
//!     Body::new(Aabb::new(0.0, 100.0, 200.0, 16.0), BodyType::Static)
//!         .with_fixture(Fixture::new(FixtureKind::Block, 200.0, 16.0)),
//! );
//! orchestrator.spawn(store);
//!
//! for _ in 0..120 {
//!     orchestrator.update(1.0 / 60.0);
//! }
//!
//! let body = orchestrator.entity(faller).unwrap().get::<Body>().unwrap();
//! assert!((body.bounds.bottom() - 100.0).abs() < 0.01);
//! assert!(body.collision_flags.get(Direction::Down));
//! ```

#![deny(unsafe_code)]

pub mod behavior;
pub mod body;
pub mod culling;
pub mod digest;
pub mod health;
pub mod level;
pub mod math;
pub mod physics;
pub mod trajectory;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use zenith_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use zenith_ecs::prelude::*;

    // Math.
    pub use crate::math::{Aabb, Vec2};

    // Bodies and fixtures.
    pub use crate::body::{
        Body, BodyError, BodyType, CollisionFlags, Direction, Fixture, FixtureKind,
    };

    // Physics stage and reactions.
    pub use crate::physics::{KindFilter, PhysicsStage, ReactionArgs, ReactionTable};

    // Damage and health.
    pub use crate::health::{Damageable, Damager, Health, HealthStage};

    // Motion and behaviors.
    pub use crate::behavior::{BehaviorStage, Behaviors};
    pub use crate::trajectory::{
        Trajectory, TrajectoryError, TrajectorySegment, TrajectoryStage,
    };

    // Culling.
    pub use crate::culling::{CullOutOfBounds, CullingStage};

    // Level population.
    pub use crate::level::{
        layers_from_json, populate, LevelError, SpawnEntry, SpawnLayer, SpawnRegistry,
    };

    // Determinism digests.
    pub use crate::digest::world_digest;
}
