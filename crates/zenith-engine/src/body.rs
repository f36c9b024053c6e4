//! Physical state: bodies, their typed fixtures, and collision flags.
//!
//! A [`Body`] is one entity's physical presence: a position box, velocity,
//! per-tick impulse and friction inputs, and an ordered list of owned
//! [`Fixture`]s. Fixtures are the overlap surface of the engine: every
//! cross-entity interaction is keyed on a pair of [`FixtureKind`]s.
//!
//! Impulse and friction are strictly per-tick inputs. The integration step
//! consumes them and resets impulse to zero and friction to one, so a
//! behavior that wants sustained friction must reapply it every frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::math::{Aabb, Vec2};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by body configuration.
#[derive(Debug, Error, PartialEq)]
pub enum BodyError {
    /// A friction scalar component fell outside `(0, 1]`.
    #[error("friction scalar component {value} is outside (0, 1]")]
    FrictionOutOfRange {
        /// The rejected component value.
        value: f32,
    },
}

// ---------------------------------------------------------------------------
// BodyType and directions
// ---------------------------------------------------------------------------

/// How the physics stage treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Integrates motion, feels gravity and friction, collides with blocks.
    Dynamic,
    /// Never moves; other bodies collide against it.
    Static,
    /// Integrates motion but ignores gravity and friction; no block
    /// push-out. Projectiles and effects use this.
    Abstract,
}

/// One of the four cardinal contact directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Per-tick contact state against solid geometry.
///
/// Cleared at the start of every integration pass and recomputed during
/// block resolution, so a flag always describes the current frame only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl CollisionFlags {
    /// Read one direction.
    #[inline]
    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Set one direction.
    #[inline]
    pub fn set(&mut self, direction: Direction, value: bool) {
        match direction {
            Direction::Up => self.up = value,
            Direction::Down => self.down = value,
            Direction::Left => self.left = value,
            Direction::Right => self.right = value,
        }
    }

    /// Reset every direction to false.
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether any direction is set.
    #[inline]
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

// ---------------------------------------------------------------------------
// FixtureKind and Fixture
// ---------------------------------------------------------------------------

/// The interaction role of a fixture.
///
/// The built-in kinds cover the stock reaction rules; hosts extend the space
/// with [`Custom`](FixtureKind::Custom) tags and their own rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureKind {
    /// Solid geometry dynamic bodies are pushed out of.
    Block,
    /// Deals damage to overlapping damageable boxes.
    DamagerBox,
    /// Receives damage from overlapping damager boxes.
    DamageableBox,
    /// Protective region; interactions are host-defined.
    Shield,
    /// Sets a horizontal collision flag when brushing a block.
    WallSlideSensor,
    /// Carries overlapping dynamic bodies by its owner's last movement.
    FeetSticker,
    /// Marks overlapping entities dead.
    DeathZone,
    /// Host-defined kind.
    Custom(u16),
}

/// Per-tick hook letting an owner adjust a fixture before overlap checks.
pub type FixtureHook = Box<dyn FnMut(&mut Fixture, f32)>;

/// A typed sub-region of a body used for overlap queries.
///
/// `bounds` is derived every tick: the box is centered on the owner body's
/// center plus `offset`. Only `active` fixtures participate in overlap
/// detection.
pub struct Fixture {
    /// Interaction role.
    pub kind: FixtureKind,
    /// Whether the fixture participates in overlap detection this tick.
    pub active: bool,
    /// Displacement of the fixture center from the body center.
    pub offset: Vec2,
    /// Current world-space box; refreshed from the owner each tick.
    pub bounds: Aabb,
    /// Free-form data read by reactions, such as a reflect direction.
    pub user_data: Option<Value>,
    update_hook: Option<FixtureHook>,
}

impl Fixture {
    /// A fixture of `kind` with the given extents, centered on the owner.
    pub fn new(kind: FixtureKind, width: f32, height: f32) -> Self {
        Self {
            kind,
            active: true,
            offset: Vec2::ZERO,
            bounds: Aabb::new(0.0, 0.0, width, height),
            user_data: None,
            update_hook: None,
        }
    }

    /// Same fixture displaced from the body center by `offset`.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Attach free-form reaction data.
    pub fn with_user_data(mut self, data: Value) -> Self {
        self.user_data = Some(data);
        self
    }

    /// Install a per-tick update hook.
    pub fn with_update_hook(mut self, hook: impl FnMut(&mut Fixture, f32) + 'static) -> Self {
        self.update_hook = Some(Box::new(hook));
        self
    }

    /// Detach the update hook, if any. The physics stage removes the hook
    /// while running it so the hook can mutate the fixture freely.
    pub fn take_update_hook(&mut self) -> Option<FixtureHook> {
        self.update_hook.take()
    }

    /// Reinstall an update hook.
    pub fn set_update_hook(&mut self, hook: Option<FixtureHook>) {
        self.update_hook = hook;
    }

    /// Recenter the bounds on `body_center + offset`.
    pub fn sync_to(&mut self, body_center: Vec2) {
        self.bounds.set_center(body_center + self.offset);
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("kind", &self.kind)
            .field("active", &self.active)
            .field("offset", &self.offset)
            .field("bounds", &self.bounds)
            .field("user_data", &self.user_data)
            .field("has_update_hook", &self.update_hook.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Per-tick hook letting an owner adjust its body before integration.
pub type BodyHook = Box<dyn FnMut(&mut Body, f32)>;

/// One entity's physical state.
pub struct Body {
    /// World-space position box.
    pub bounds: Aabb,
    /// Current velocity in units per second.
    pub velocity: Vec2,
    /// One-tick velocity addition; zeroed after integration.
    pub impulse: Vec2,
    /// Extra per-body gravity added to the world gravity.
    pub gravity: Vec2,
    /// Whether gravity applies to this body.
    pub gravity_on: bool,
    /// Integration class.
    pub body_type: BodyType,
    /// Contact state recomputed each tick.
    pub collision_flags: CollisionFlags,
    /// Position change applied by the last integration step.
    pub last_delta: Vec2,
    fixtures: Vec<Fixture>,
    friction: Vec2,
    pre_process: Option<BodyHook>,
}

impl Body {
    /// A body of the given type occupying `bounds`, with neutral friction
    /// and gravity enabled.
    pub fn new(bounds: Aabb, body_type: BodyType) -> Self {
        Self {
            bounds,
            velocity: Vec2::ZERO,
            impulse: Vec2::ZERO,
            gravity: Vec2::ZERO,
            gravity_on: true,
            body_type,
            collision_flags: CollisionFlags::default(),
            last_delta: Vec2::ZERO,
            fixtures: Vec::new(),
            friction: Vec2::ONE,
            pre_process: None,
        }
    }

    /// Same body with an initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Same body with a fixture appended.
    pub fn with_fixture(mut self, mut fixture: Fixture) -> Self {
        fixture.sync_to(self.bounds.center());
        self.fixtures.push(fixture);
        self
    }

    /// Same body with a pre-integration hook installed.
    pub fn with_pre_process(mut self, hook: impl FnMut(&mut Body, f32) + 'static) -> Self {
        self.pre_process = Some(Box::new(hook));
        self
    }

    /// Append a fixture, snapping its bounds to the current body position.
    pub fn add_fixture(&mut self, mut fixture: Fixture) {
        fixture.sync_to(self.bounds.center());
        self.fixtures.push(fixture);
    }

    /// The owned fixtures, in insertion order.
    #[inline]
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Mutable access to the owned fixtures.
    #[inline]
    pub fn fixtures_mut(&mut self) -> &mut [Fixture] {
        &mut self.fixtures
    }

    /// Current friction scalar.
    #[inline]
    pub fn friction_scalar(&self) -> Vec2 {
        self.friction
    }

    /// Set the per-tick friction scalar.
    ///
    /// Each component must lie in `(0, 1]`, where 1 is no friction. Out of
    /// range values are rejected, never clamped, and the previous scalar
    /// is kept.
    pub fn set_friction_scalar(&mut self, friction: Vec2) -> Result<(), BodyError> {
        for value in [friction.x, friction.y] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(BodyError::FrictionOutOfRange { value });
            }
        }
        self.friction = friction;
        Ok(())
    }

    /// Reset friction to the neutral scalar. The physics stage calls this
    /// after consuming the scalar each tick.
    pub fn reset_friction(&mut self) {
        self.friction = Vec2::ONE;
    }

    /// Accumulate a one-tick impulse.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.impulse += impulse;
    }

    /// Detach the pre-integration hook, if any.
    pub fn take_pre_process(&mut self) -> Option<BodyHook> {
        self.pre_process.take()
    }

    /// Reinstall a pre-integration hook.
    pub fn set_pre_process(&mut self, hook: Option<BodyHook>) {
        self.pre_process = hook;
    }

    /// Recenter every fixture's bounds on the current body position.
    pub fn sync_fixtures(&mut self) {
        let center = self.bounds.center();
        for fixture in &mut self.fixtures {
            fixture.sync_to(center);
        }
    }

    /// First fixture of `kind`, if one exists.
    pub fn fixture_of_kind(&self, kind: FixtureKind) -> Option<&Fixture> {
        self.fixtures.iter().find(|fixture| fixture.kind == kind)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("bounds", &self.bounds)
            .field("velocity", &self.velocity)
            .field("impulse", &self.impulse)
            .field("body_type", &self.body_type)
            .field("collision_flags", &self.collision_flags)
            .field("fixtures", &self.fixtures)
            .field("has_pre_process", &self.pre_process.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
