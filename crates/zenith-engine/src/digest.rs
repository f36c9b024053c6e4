//! World-state digests for determinism checks.
//!
//! Serializes the observable physical state of every body, in entity order,
//! and hashes the bytes with blake3. Two runs fed identical inputs must
//! produce identical digests frame after frame; any divergence pinpoints
//! nondeterminism in the pipeline.

use serde::Serialize;
use zenith_ecs::prelude::*;

use crate::body::{Body, BodyType, CollisionFlags};
use crate::math::{Aabb, Vec2};

#[derive(Serialize)]
struct BodySnapshot {
    entity: EntityId,
    bounds: Aabb,
    velocity: Vec2,
    body_type: BodyType,
    collision_flags: CollisionFlags,
    last_delta: Vec2,
}

/// Hex blake3 digest of every body's state, in entity order.
///
/// Entities without a body contribute nothing, so adding a body-less entity
/// does not shift the digest.
pub fn world_digest(entities: &[Entity]) -> Result<String, serde_json::Error> {
    let snapshots: Vec<BodySnapshot> = entities
        .iter()
        .filter_map(|entity| {
            entity.get::<Body>().map(|body| BodySnapshot {
                entity: entity.id(),
                bounds: body.bounds,
                velocity: body.velocity,
                body_type: body.body_type,
                collision_flags: body.collision_flags,
                last_delta: body.last_delta,
            })
        })
        .collect();
    let bytes = serde_json::to_vec(&snapshots)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsStage;

    fn seeded_world() -> Orchestrator {
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .add_stage(Box::new(PhysicsStage::new(Vec2::new(0.0, 600.0))))
            .unwrap();

        let mut store = ComponentStore::new();
        store.put(
            Body::new(Aabb::new(0.0, 0.0, 10.0, 10.0), BodyType::Dynamic)
                .with_velocity(Vec2::new(30.0, 0.0)),
        );
        orchestrator.spawn(store);

        let mut store = ComponentStore::new();
        store.put(Body::new(
            Aabb::new(0.0, 100.0, 100.0, 20.0),
            BodyType::Static,
        ));
        orchestrator.spawn(store);

        orchestrator
    }

    #[test]
    fn identical_replays_produce_identical_digests() {
        let mut left = seeded_world();
        let mut right = seeded_world();

        for _ in 0..120 {
            left.update(1.0 / 60.0);
            right.update(1.0 / 60.0);
            assert_eq!(
                world_digest(left.entities()).unwrap(),
                world_digest(right.entities()).unwrap()
            );
        }
    }

    #[test]
    fn digest_changes_when_state_changes() {
        let mut orchestrator = seeded_world();
        let before = world_digest(orchestrator.entities()).unwrap();
        orchestrator.update(1.0 / 60.0);
        let after = world_digest(orchestrator.entities()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn body_less_entities_do_not_affect_the_digest() {
        struct Tag;

        let mut plain = seeded_world();
        let mut tagged = seeded_world();
        let mut store = ComponentStore::new();
        store.put(Tag);
        tagged.spawn(store);

        for _ in 0..10 {
            plain.update(1.0 / 60.0);
            tagged.update(1.0 / 60.0);
        }
        assert_eq!(
            world_digest(plain.entities()).unwrap(),
            world_digest(tagged.entities()).unwrap()
        );
    }
}
