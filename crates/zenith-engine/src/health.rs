//! Damage capability components and the health stage.
//!
//! Damage participation is expressed as plain components rather than traits
//! on entity types: a [`Damager`] carries a tag and an amount, a
//! [`Damageable`] decides acceptance via its tag mask and invincibility
//! window, and [`Health`] is the depletable pool. The physics reactions only
//! detect overlap; acceptance lives entirely in [`Damageable`].

use std::collections::BTreeSet;
use std::collections::HashSet;

use serde_json::json;
use zenith_ecs::prelude::*;
use zenith_ecs::timer::TimerError;

// ---------------------------------------------------------------------------
// Capability components
// ---------------------------------------------------------------------------

/// The damage-dealing side of an overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Damager {
    /// Tag matched against the target's acceptance mask.
    pub tag: String,
    /// Amount subtracted from the target's health on acceptance.
    pub damage: i32,
}

impl Damager {
    /// A damager with the given tag and amount.
    pub fn new(tag: impl Into<String>, damage: i32) -> Self {
        Self {
            tag: tag.into(),
            damage,
        }
    }
}

/// The damage-receiving side of an overlap.
///
/// Acceptance requires the damager's tag to be in the mask and the
/// invincibility window to be inactive. The window starts inactive
/// (timer finished) and is armed by [`begin_invincibility`](Self::begin_invincibility).
#[derive(Debug)]
pub struct Damageable {
    mask: BTreeSet<String>,
    invincibility: Timer,
}

impl Damageable {
    /// A damageable with an empty mask and the given invincibility window.
    pub fn new(invincibility_duration: f32) -> Result<Self, TimerError> {
        Ok(Self {
            mask: BTreeSet::new(),
            invincibility: Timer::finished(invincibility_duration)?,
        })
    }

    /// Same damageable accepting damage tagged `tag`.
    pub fn accepting(mut self, tag: impl Into<String>) -> Self {
        self.mask.insert(tag.into());
        self
    }

    /// Whether a damager with `tag` would be accepted right now.
    pub fn can_be_damaged_by(&self, tag: &str) -> bool {
        !self.is_invincible() && self.mask.contains(tag)
    }

    /// Whether the invincibility window is currently running.
    pub fn is_invincible(&self) -> bool {
        !self.invincibility.is_finished()
    }

    /// Arm the invincibility window from the start.
    pub fn begin_invincibility(&mut self) {
        self.invincibility.reset();
    }

    /// Advance the invincibility window.
    pub fn tick(&mut self, dt: f32) {
        self.invincibility.update(dt);
    }
}

/// A depletable hit-point pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    /// Current hit points, floored at zero.
    pub current: i32,
    /// Maximum hit points.
    pub max: i32,
}

impl Health {
    /// Full health at `max`.
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Subtract `amount`, flooring at zero.
    pub fn apply_damage(&mut self, amount: i32) {
        self.current = (self.current - amount).max(0);
    }

    /// Whether the pool has reached zero.
    pub fn is_depleted(&self) -> bool {
        self.current <= 0
    }
}

// ---------------------------------------------------------------------------
// HealthStage
// ---------------------------------------------------------------------------

/// Ticks invincibility windows and retires entities whose health ran out.
///
/// Runs after the physics stage so damage applied this frame is observed
/// this frame. A retiring entity is marked dead and a `"death"` message is
/// published; removal happens at the frame boundary as usual.
pub struct HealthStage {
    kinds: HashSet<ComponentKind>,
}

impl HealthStage {
    /// A health stage requiring the [`Health`] component.
    pub fn new() -> Self {
        let mut kinds = HashSet::new();
        kinds.insert(ComponentKind::of::<Health>());
        Self { kinds }
    }
}

impl Default for HealthStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for HealthStage {
    fn name(&self) -> &str {
        "health"
    }

    fn required_kinds(&self) -> &HashSet<ComponentKind> {
        &self.kinds
    }

    fn update_entity(
        &mut self,
        entity: &mut Entity,
        ctx: &mut StageContext<'_>,
    ) -> Result<(), EcsError> {
        if let Some(damageable) = entity.get_mut::<Damageable>() {
            damageable.tick(ctx.dt);
        }

        let depleted = entity.component::<Health>()?.is_depleted();
        if depleted && !entity.is_dead() {
            entity.set_dead(true);
            ctx.messages
                .publish(Message::from_entity(entity.id(), "death", json!(null)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn damageable_mask_and_invincibility() {
        let mut damageable = Damageable::new(0.5).unwrap().accepting("player_attack");

        assert!(!damageable.is_invincible(), "window starts inactive");
        assert!(damageable.can_be_damaged_by("player_attack"));
        assert!(!damageable.can_be_damaged_by("enemy_attack"));

        damageable.begin_invincibility();
        assert!(damageable.is_invincible());
        assert!(!damageable.can_be_damaged_by("player_attack"));

        damageable.tick(0.5);
        assert!(!damageable.is_invincible());
        assert!(damageable.can_be_damaged_by("player_attack"));
    }

    #[test]
    fn health_floors_at_zero() {
        let mut health = Health::new(3);
        health.apply_damage(2);
        assert_eq!(health.current, 1);
        assert!(!health.is_depleted());
        health.apply_damage(5);
        assert_eq!(health.current, 0);
        assert!(health.is_depleted());
    }

    #[test]
    fn depleted_entity_dies_at_frame_boundary() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_stage(Box::new(HealthStage::new())).unwrap();

        let deaths = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&deaths);
        orchestrator.messages().subscribe("death", move |message, _dt| {
            sink.borrow_mut().push(message.source);
            ListenerAction::Keep
        });

        let mut store = ComponentStore::new();
        store.put(Health { current: 0, max: 3 });
        let id = orchestrator.spawn(store);

        orchestrator.update(0.016);
        assert_eq!(deaths.borrow().as_slice(), &[Some(id)]);
        assert!(!orchestrator.is_alive(id), "removed at the frame boundary");
    }

    #[test]
    fn healthy_entity_survives() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_stage(Box::new(HealthStage::new())).unwrap();

        let mut store = ComponentStore::new();
        store.put(Health::new(3));
        store.put(Damageable::new(1.0).unwrap().accepting("spikes"));
        let id = orchestrator.spawn(store);

        for _ in 0..10 {
            orchestrator.update(0.016);
        }
        assert!(orchestrator.is_alive(id));
    }

    #[test]
    fn invincibility_ticks_down_through_stage() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_stage(Box::new(HealthStage::new())).unwrap();

        let mut store = ComponentStore::new();
        store.put(Health::new(3));
        let mut damageable = Damageable::new(0.1).unwrap().accepting("x");
        damageable.begin_invincibility();
        store.put(damageable);
        let id = orchestrator.spawn(store);

        orchestrator.update(0.016);
        assert!(orchestrator
            .entity(id)
            .unwrap()
            .get::<Damageable>()
            .unwrap()
            .is_invincible());

        for _ in 0..10 {
            orchestrator.update(0.016);
        }
        assert!(!orchestrator
            .entity(id)
            .unwrap()
            .get::<Damageable>()
            .unwrap()
            .is_invincible());
    }
}
