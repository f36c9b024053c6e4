//! The frame orchestrator: owns entities, stages, and the message
//! dispatcher, and drives them through fixed-timestep frames.
//!
//! Each [`update`](Orchestrator::update) call runs one frame:
//!
//! 1. Pending spawns join the live set.
//! 2. Each enabled stage runs `pre_process`, then `update_entity` for every
//!    live matching entity, then `post_process` over the whole slice.
//! 3. Entities marked dead are removed and their ids recycled.
//! 4. The message queue flushes.
//!
//! A failing `update_entity` is logged and skipped; one faulty entity never
//! aborts the frame for the others.

use std::collections::VecDeque;

use crate::component::ComponentStore;
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::message::MessageDispatcher;
use crate::stage::{Stage, StageContext};
use crate::EcsError;

// ---------------------------------------------------------------------------
// StageEntry
// ---------------------------------------------------------------------------

struct StageEntry {
    stage: Box<dyn Stage>,
    enabled: bool,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the entity population and runs registered stages over it each frame.
pub struct Orchestrator {
    allocator: EntityAllocator,
    entities: Vec<Entity>,
    pending_spawns: VecDeque<Entity>,
    stages: Vec<StageEntry>,
    dispatcher: MessageDispatcher,
    frame: u64,
}

impl Orchestrator {
    /// Create an orchestrator with no entities and no stages.
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: Vec::new(),
            pending_spawns: VecDeque::new(),
            stages: Vec::new(),
            dispatcher: MessageDispatcher::new(),
            frame: 0,
        }
    }

    // -- Stage registration -------------------------------------------------

    /// Register a stage. Stages run in registration order.
    ///
    /// Fails with [`EcsError::DuplicateStage`] when a stage with the same
    /// name is already registered.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) -> Result<(), EcsError> {
        if self.stages.iter().any(|entry| entry.stage.name() == stage.name()) {
            return Err(EcsError::DuplicateStage {
                name: stage.name().to_string(),
            });
        }
        self.stages.push(StageEntry {
            stage,
            enabled: true,
        });
        Ok(())
    }

    /// Enable or disable a stage by name.
    ///
    /// A disabled stage is skipped entirely, pre- and post-processing
    /// included.
    pub fn set_stage_enabled(&mut self, name: &str, enabled: bool) -> Result<(), EcsError> {
        let entry = self
            .stages
            .iter_mut()
            .find(|entry| entry.stage.name() == name)
            .ok_or_else(|| EcsError::UnknownStage {
                name: name.to_string(),
            })?;
        entry.enabled = enabled;
        tracing::debug!(stage = name, enabled, "stage toggled");
        Ok(())
    }

    /// Whether a stage is currently enabled.
    pub fn stage_enabled(&self, name: &str) -> Option<bool> {
        self.stages
            .iter()
            .find(|entry| entry.stage.name() == name)
            .map(|entry| entry.enabled)
    }

    // -- Entity lifecycle ---------------------------------------------------

    /// Queue an entity for insertion at the start of the next frame.
    ///
    /// The id is allocated immediately so the caller can wire references
    /// before the entity becomes visible to stages.
    pub fn spawn(&mut self, store: ComponentStore) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push_back(Entity::new(id, store));
        id
    }

    /// Mark an entity for removal at the end of the current frame.
    ///
    /// Returns `false` when the id is stale or unknown.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if let Some(entity) = self.entities.iter_mut().find(|e| e.id() == id) {
            entity.set_dead(true);
            return true;
        }
        false
    }

    /// Whether `id` refers to a live, non-stale entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    /// The live entity slice, in spawn order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Mutable access to the live entity slice.
    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Shared entity lookup by id.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    /// Mutable entity lookup by id.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    /// Number of live entities, pending spawns excluded.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Messaging ----------------------------------------------------------

    /// The message dispatcher, for host-side subscriptions and publishes.
    pub fn messages(&mut self) -> &mut MessageDispatcher {
        &mut self.dispatcher
    }

    // -- Frame loop ---------------------------------------------------------

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one fixed-timestep frame.
    pub fn update(&mut self, dt: f32) {
        // 1. Pending spawns become visible before any stage runs.
        while let Some(entity) = self.pending_spawns.pop_front() {
            tracing::trace!(entity = %entity.id(), "spawn applied");
            self.entities.push(entity);
        }

        // 2. Stages, in registration order.
        for entry in &mut self.stages {
            if !entry.enabled {
                continue;
            }
            let stage = &mut entry.stage;
            let mut ctx = StageContext {
                dt,
                messages: &mut self.dispatcher,
            };

            stage.pre_process(&mut ctx);

            let required = stage.required_kinds().clone();
            for entity in &mut self.entities {
                if entity.is_dead() || !entity.store().has_all(&required) {
                    continue;
                }
                if let Err(error) = stage.update_entity(entity, &mut ctx) {
                    tracing::warn!(
                        stage = stage.name(),
                        entity = %entity.id(),
                        %error,
                        "stage update failed for entity, skipping"
                    );
                }
            }

            stage.post_process(&mut self.entities, &mut ctx);
        }

        // 3. Dead entities leave the population and their ids recycle.
        let allocator = &mut self.allocator;
        self.entities.retain(|entity| {
            if entity.is_dead() {
                tracing::trace!(entity = %entity.id(), "despawn applied");
                allocator.deallocate(entity.id());
                false
            } else {
                true
            }
        });

        // 4. Messages queued during the frame reach their listeners.
        self.dispatcher.flush(dt);

        self.frame += 1;
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
