//! Out-of-bounds culling for projectiles and escaped bodies.
//!
//! Entities opt in with the [`CullOutOfBounds`] marker. Once a marked
//! entity's body leaves the world bounds entirely it is marked dead and
//! removed at the frame boundary like any other despawn.

use std::collections::HashSet;

use zenith_ecs::prelude::*;

use crate::body::Body;
use crate::math::Aabb;

/// Marker component opting an entity into culling.
#[derive(Debug, Clone, Copy, Default)]
pub struct CullOutOfBounds;

/// Marks entities dead once their body is fully outside the world bounds.
pub struct CullingStage {
    kinds: HashSet<ComponentKind>,
    world_bounds: Aabb,
}

impl CullingStage {
    /// A culling stage retiring bodies that leave `world_bounds`.
    pub fn new(world_bounds: Aabb) -> Self {
        let mut kinds = HashSet::new();
        kinds.insert(ComponentKind::of::<CullOutOfBounds>());
        kinds.insert(ComponentKind::of::<Body>());
        Self {
            kinds,
            world_bounds,
        }
    }
}

impl Stage for CullingStage {
    fn name(&self) -> &str {
        "culling"
    }

    fn required_kinds(&self) -> &HashSet<ComponentKind> {
        &self.kinds
    }

    fn update_entity(
        &mut self,
        entity: &mut Entity,
        _ctx: &mut StageContext<'_>,
    ) -> Result<(), EcsError> {
        let bounds = entity.component::<Body>()?.bounds;
        if !bounds.overlaps(&self.world_bounds) {
            tracing::debug!(entity = %entity.id(), "culled out of bounds");
            entity.set_dead(true);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
