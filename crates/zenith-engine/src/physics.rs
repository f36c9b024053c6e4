//! The physics stage: motion integration, fixture overlap reactions, and
//! block collision resolution.
//!
//! Per tick, each body moves through two phases. In the per-entity phase the
//! stage runs owner hooks, integrates velocity, impulse, gravity, and
//! friction into a position delta, consumes the per-tick inputs, clears the
//! collision flags, and recenters every fixture on the new position. In the
//! cross-entity phase it collects every intersecting pair of active fixtures
//! on different bodies, dispatches each through the [`ReactionTable`], and
//! finally pushes Dynamic bodies out of Block fixtures along the axis of
//! least penetration, setting the matching collision flag.
//!
//! Vertical resolution wins penetration ties, and the velocity component
//! pointing into a resolved contact is zeroed so a resting body does not
//! re-penetrate next tick.

use std::collections::HashSet;

use serde_json::json;
use zenith_ecs::prelude::*;

use crate::body::{Body, BodyType, Direction, FixtureKind};
use crate::math::{Aabb, Vec2};
use crate::health::{Damageable, Damager, Health};

// ---------------------------------------------------------------------------
// ReactionTable
// ---------------------------------------------------------------------------

/// Matches the second fixture kind of an overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    /// Exactly this kind.
    Is(FixtureKind),
    /// Any kind at all.
    Any,
}

impl KindFilter {
    #[inline]
    fn matches(&self, kind: FixtureKind) -> bool {
        match self {
            KindFilter::Is(expected) => *expected == kind,
            KindFilter::Any => true,
        }
    }
}

/// Everything a reaction may touch: both entities, the overlapping fixture
/// indices into their bodies, the message dispatcher, and the frame dt.
///
/// `source` is the entity owning the fixture that matched the rule's first
/// kind; rules are directional and the engine checks both orderings of a
/// pair before giving up.
pub struct ReactionArgs<'a> {
    pub source: &'a mut Entity,
    pub target: &'a mut Entity,
    pub source_fixture: usize,
    pub target_fixture: usize,
    pub messages: &'a mut MessageDispatcher,
    pub dt: f32,
}

type ReactionFn = Box<dyn FnMut(ReactionArgs<'_>)>;

struct ReactionRule {
    source: FixtureKind,
    target: KindFilter,
    reaction: ReactionFn,
}

/// Ordered rules mapping fixture-kind pairs to overlap reactions.
///
/// Rules are consulted in registration order; for each overlapping pair both
/// orderings are tried against each rule and the first match wins. A pair
/// matching no rule is a silent no-op.
#[derive(Default)]
pub struct ReactionTable {
    rules: Vec<ReactionRule>,
}

impl ReactionTable {
    /// An empty table with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock rule set: damage, death zones, wall slide sensors, and
    /// feet stickers. Shield fixtures carry no stock rule; hosts register
    /// their own using the shield's `user_data`.
    pub fn with_default_rules() -> Self {
        let mut table = Self::new();
        table.register(
            FixtureKind::DamagerBox,
            KindFilter::Is(FixtureKind::DamageableBox),
            damage_reaction,
        );
        table.register(FixtureKind::DeathZone, KindFilter::Any, death_zone_reaction);
        table.register(
            FixtureKind::WallSlideSensor,
            KindFilter::Is(FixtureKind::Block),
            wall_slide_reaction,
        );
        table.register(FixtureKind::FeetSticker, KindFilter::Any, feet_sticker_reaction);
        table
    }

    /// Append a rule. Later rules only fire for pairs no earlier rule
    /// matched.
    pub fn register(
        &mut self,
        source: FixtureKind,
        target: KindFilter,
        reaction: impl FnMut(ReactionArgs<'_>) + 'static,
    ) {
        self.rules.push(ReactionRule {
            source,
            target,
            reaction: Box::new(reaction),
        });
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching the pair in either ordering.
    ///
    /// Returns the rule index and whether the pair must be swapped so the
    /// rule's first kind becomes the source.
    fn match_pair(&self, a: FixtureKind, b: FixtureKind) -> Option<(usize, bool)> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.source == a && rule.target.matches(b) {
                return Some((index, false));
            }
            if rule.source == b && rule.target.matches(a) {
                return Some((index, true));
            }
        }
        None
    }

    fn invoke(&mut self, index: usize, args: ReactionArgs<'_>) {
        if let Some(rule) = self.rules.get_mut(index) {
            (rule.reaction)(args);
        }
    }
}

// ---------------------------------------------------------------------------
// Stock reactions
// ---------------------------------------------------------------------------

/// Damager box over damageable box: consult the target's acceptance, apply
/// damage, arm the invincibility window, publish a `"damage"` message.
///
/// The stage only detects the overlap; acceptance is entirely the target's
/// decision, so an armed invincibility window suppresses repeat hits while
/// the overlap persists.
fn damage_reaction(args: ReactionArgs<'_>) {
    let (tag, amount) = match args.source.get::<Damager>() {
        Some(damager) => (damager.tag.clone(), damager.damage),
        None => return,
    };
    let target_id = args.target.id();
    let Some(damageable) = args.target.get_mut::<Damageable>() else {
        return;
    };
    if !damageable.can_be_damaged_by(&tag) {
        return;
    }
    damageable.begin_invincibility();
    if let Some(health) = args.target.get_mut::<Health>() {
        health.apply_damage(amount);
    }
    args.messages.publish(Message::from_entity(
        target_id,
        "damage",
        json!({ "tag": tag, "amount": amount }),
    ));
}

/// Death zone over anything: mark the other entity dead. Removal still
/// waits for the frame boundary.
fn death_zone_reaction(args: ReactionArgs<'_>) {
    args.target.set_dead(true);
}

/// Wall slide sensor over a block: set the sensor owner's horizontal flag
/// toward the block.
fn wall_slide_reaction(args: ReactionArgs<'_>) {
    let sensor_center = match args
        .source
        .get::<Body>()
        .and_then(|body| body.fixtures().get(args.source_fixture))
    {
        Some(fixture) => fixture.bounds.center(),
        None => return,
    };
    let block_center = match args
        .target
        .get::<Body>()
        .and_then(|body| body.fixtures().get(args.target_fixture))
    {
        Some(fixture) => fixture.bounds.center(),
        None => return,
    };
    let Some(body) = args.source.get_mut::<Body>() else {
        return;
    };
    let side = if block_center.x > sensor_center.x {
        Direction::Right
    } else {
        Direction::Left
    };
    body.collision_flags.set(side, true);
}

/// Feet sticker over a dynamic body: carry the body by the sticker owner's
/// movement this tick. Moving platforms pair this with a trajectory.
fn feet_sticker_reaction(args: ReactionArgs<'_>) {
    let drag = match args.source.get::<Body>() {
        Some(body) => body.last_delta,
        None => return,
    };
    if drag == Vec2::ZERO {
        return;
    }
    let Some(target_body) = args.target.get_mut::<Body>() else {
        return;
    };
    if target_body.body_type != BodyType::Dynamic {
        return;
    }
    target_body.bounds.translate(drag);
    target_body.sync_fixtures();
}

// ---------------------------------------------------------------------------
// PhysicsStage
// ---------------------------------------------------------------------------

/// An intersecting pair of active fixtures on two different entities,
/// recorded by slice index before any mutation happens.
struct OverlapPair {
    a: usize,
    b: usize,
    fixture_a: usize,
    fixture_b: usize,
    kind_a: FixtureKind,
    kind_b: FixtureKind,
}

/// The stage integrating motion and resolving fixture interactions.
pub struct PhysicsStage {
    kinds: HashSet<ComponentKind>,
    world_gravity: Vec2,
    reactions: ReactionTable,
}

impl PhysicsStage {
    /// A physics stage with the given world gravity and the stock reaction
    /// rules.
    pub fn new(world_gravity: Vec2) -> Self {
        Self::with_reactions(world_gravity, ReactionTable::with_default_rules())
    }

    /// A physics stage with a caller-supplied reaction table.
    pub fn with_reactions(world_gravity: Vec2, reactions: ReactionTable) -> Self {
        let mut kinds = HashSet::new();
        kinds.insert(ComponentKind::of::<Body>());
        Self {
            kinds,
            world_gravity,
            reactions,
        }
    }

    /// The reaction table, for registering host rules.
    pub fn reactions_mut(&mut self) -> &mut ReactionTable {
        &mut self.reactions
    }

    /// The configured world gravity.
    pub fn world_gravity(&self) -> Vec2 {
        self.world_gravity
    }

    fn collect_pairs(entities: &[Entity]) -> Vec<OverlapPair> {
        let mut pairs = Vec::new();
        for a in 0..entities.len() {
            if entities[a].is_dead() {
                continue;
            }
            let Some(body_a) = entities[a].get::<Body>() else {
                continue;
            };
            for b in (a + 1)..entities.len() {
                if entities[b].is_dead() {
                    continue;
                }
                let Some(body_b) = entities[b].get::<Body>() else {
                    continue;
                };
                for (fixture_a, fa) in body_a.fixtures().iter().enumerate() {
                    if !fa.active {
                        continue;
                    }
                    for (fixture_b, fb) in body_b.fixtures().iter().enumerate() {
                        if !fb.active {
                            continue;
                        }
                        if fa.bounds.overlaps(&fb.bounds) {
                            pairs.push(OverlapPair {
                                a,
                                b,
                                fixture_a,
                                fixture_b,
                                kind_a: fa.kind,
                                kind_b: fb.kind,
                            });
                        }
                    }
                }
            }
        }
        pairs
    }

    fn resolve_blocks(entities: &mut [Entity]) {
        let mut blocks: Vec<(usize, Aabb)> = Vec::new();
        for (index, entity) in entities.iter().enumerate() {
            if entity.is_dead() {
                continue;
            }
            let Some(body) = entity.get::<Body>() else {
                continue;
            };
            for fixture in body.fixtures() {
                if fixture.active && fixture.kind == FixtureKind::Block {
                    blocks.push((index, fixture.bounds));
                }
            }
        }

        for index in 0..entities.len() {
            if entities[index].is_dead() {
                continue;
            }
            let Some(body) = entities[index].get_mut::<Body>() else {
                continue;
            };
            if body.body_type != BodyType::Dynamic {
                continue;
            }
            for &(owner, block) in &blocks {
                if owner == index || !body.bounds.overlaps(&block) {
                    continue;
                }
                let pen_x = body.bounds.penetration_x(&block);
                let pen_y = body.bounds.penetration_y(&block);
                // Vertical wins ties so gravity contacts resolve as landings.
                if pen_y <= pen_x {
                    if body.bounds.center().y < block.center().y {
                        body.bounds.y -= pen_y;
                        body.collision_flags.down = true;
                        if body.velocity.y > 0.0 {
                            body.velocity.y = 0.0;
                        }
                    } else {
                        body.bounds.y += pen_y;
                        body.collision_flags.up = true;
                        if body.velocity.y < 0.0 {
                            body.velocity.y = 0.0;
                        }
                    }
                } else if body.bounds.center().x < block.center().x {
                    body.bounds.x -= pen_x;
                    body.collision_flags.right = true;
                    if body.velocity.x > 0.0 {
                        body.velocity.x = 0.0;
                    }
                } else {
                    body.bounds.x += pen_x;
                    body.collision_flags.left = true;
                    if body.velocity.x < 0.0 {
                        body.velocity.x = 0.0;
                    }
                }
            }
            body.sync_fixtures();
        }
    }
}

/// Two disjoint mutable references into one slice. `first < second` must
/// hold.
fn split_pair(entities: &mut [Entity], first: usize, second: usize) -> (&mut Entity, &mut Entity) {
    let (head, tail) = entities.split_at_mut(second);
    (&mut head[first], &mut tail[0])
}

impl Stage for PhysicsStage {
    fn name(&self) -> &str {
        "physics"
    }

    fn required_kinds(&self) -> &HashSet<ComponentKind> {
        &self.kinds
    }

    fn update_entity(
        &mut self,
        entity: &mut Entity,
        ctx: &mut StageContext<'_>,
    ) -> Result<(), EcsError> {
        let body = entity.component_mut::<Body>()?;

        // Owner hooks run against the pre-integration state. Each hook is
        // detached while it runs so it may mutate its carrier freely.
        if let Some(mut hook) = body.take_pre_process() {
            hook(&mut *body, ctx.dt);
            body.set_pre_process(Some(hook));
        }
        for index in 0..body.fixtures().len() {
            if let Some(mut hook) = body.fixtures_mut()[index].take_update_hook() {
                hook(&mut body.fixtures_mut()[index], ctx.dt);
                body.fixtures_mut()[index].set_update_hook(Some(hook));
            }
        }

        match body.body_type {
            BodyType::Static => {
                body.impulse = Vec2::ZERO;
                body.reset_friction();
                body.last_delta = Vec2::ZERO;
                body.collision_flags.clear();
                body.sync_fixtures();
            }
            BodyType::Dynamic => {
                if body.gravity_on {
                    let gravity = self.world_gravity + body.gravity;
                    body.velocity += gravity * ctx.dt;
                }
                let delta = (body.velocity + body.impulse)
                    .component_mul(body.friction_scalar())
                    * ctx.dt;
                body.impulse = Vec2::ZERO;
                body.reset_friction();
                body.bounds.translate(delta);
                body.last_delta = delta;
                body.collision_flags.clear();
                body.sync_fixtures();
            }
            BodyType::Abstract => {
                // No gravity, no friction. Projectiles and effects.
                let delta = (body.velocity + body.impulse) * ctx.dt;
                body.impulse = Vec2::ZERO;
                body.reset_friction();
                body.bounds.translate(delta);
                body.last_delta = delta;
                body.collision_flags.clear();
                body.sync_fixtures();
            }
        }
        Ok(())
    }

    fn post_process(&mut self, entities: &mut [Entity], ctx: &mut StageContext<'_>) {
        let pairs = Self::collect_pairs(entities);
        for pair in pairs {
            let Some((rule_index, swapped)) = self.reactions.match_pair(pair.kind_a, pair.kind_b)
            else {
                continue;
            };
            let (first, second) = split_pair(entities, pair.a, pair.b);
            let (source, target, source_fixture, target_fixture) = if swapped {
                (second, first, pair.fixture_b, pair.fixture_a)
            } else {
                (first, second, pair.fixture_a, pair.fixture_b)
            };
            tracing::trace!(
                source = %source.id(),
                target = %target.id(),
                kind_a = ?pair.kind_a,
                kind_b = ?pair.kind_b,
                "reaction fired"
            );
            self.reactions.invoke(
                rule_index,
                ReactionArgs {
                    source,
                    target,
                    source_fixture,
                    target_fixture,
                    messages: &mut *ctx.messages,
                    dt: ctx.dt,
                },
            );
        }

        Self::resolve_blocks(entities);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
