//! Segment-based motion paths for platforms and patrolling bodies.
//!
//! A [`Trajectory`] is a cyclic list of `(velocity, duration)` segments.
//! The [`TrajectoryStage`] writes the current segment's velocity into the
//! entity's body each frame and advances through segments as their durations
//! elapse, wrapping back to the first segment after the last.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zenith_ecs::prelude::*;

use crate::body::Body;
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Construction-time validation failures for [`Trajectory`].
#[derive(Debug, Error, PartialEq)]
pub enum TrajectoryError {
    /// A trajectory needs at least one segment.
    #[error("trajectory has no segments")]
    Empty,

    /// A segment duration is zero, negative, or not finite.
    #[error("segment duration must be positive and finite, got {duration}")]
    InvalidSegmentDuration {
        /// The rejected duration.
        duration: f32,
    },
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// One leg of a trajectory: hold `velocity` for `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySegment {
    pub velocity: Vec2,
    pub duration: f32,
}

impl TrajectorySegment {
    /// A segment holding `velocity` for `duration` seconds.
    pub fn new(velocity: Vec2, duration: f32) -> Self {
        Self { velocity, duration }
    }
}

/// A cyclic sequence of velocity segments.
#[derive(Debug, Clone)]
pub struct Trajectory {
    segments: Vec<TrajectorySegment>,
    index: usize,
    remaining: f32,
}

impl Trajectory {
    /// A trajectory starting at the first segment.
    ///
    /// Durations must be positive and finite; a zero or negative duration
    /// would stall segment advancement.
    pub fn new(segments: Vec<TrajectorySegment>) -> Result<Self, TrajectoryError> {
        if segments.is_empty() {
            return Err(TrajectoryError::Empty);
        }
        for segment in &segments {
            if !(segment.duration > 0.0 && segment.duration.is_finite()) {
                return Err(TrajectoryError::InvalidSegmentDuration {
                    duration: segment.duration,
                });
            }
        }
        let remaining = segments[0].duration;
        Ok(Self {
            segments,
            index: 0,
            remaining,
        })
    }

    /// The segment currently in effect.
    pub fn current(&self) -> TrajectorySegment {
        self.segments[self.index]
    }

    /// The velocity in effect for a frame of length `dt`, advancing across
    /// segment boundaries afterwards.
    ///
    /// The current segment's velocity applies for the whole frame; the
    /// switch to the next segment takes effect on the following call.
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        let velocity = self.segments[self.index].velocity;
        self.remaining -= dt;
        while self.remaining <= 0.0 {
            self.index = (self.index + 1) % self.segments.len();
            self.remaining += self.segments[self.index].duration;
        }
        velocity
    }

    /// Restart at the first segment.
    pub fn reset(&mut self) {
        self.index = 0;
        self.remaining = self.segments[0].duration;
    }
}

// ---------------------------------------------------------------------------
// TrajectoryStage
// ---------------------------------------------------------------------------

/// Writes each entity's current trajectory velocity into its body.
///
/// Runs before the physics stage so the velocity set here is integrated in
/// the same frame.
pub struct TrajectoryStage {
    kinds: HashSet<ComponentKind>,
}

impl TrajectoryStage {
    /// A trajectory stage requiring [`Trajectory`] and [`Body`].
    pub fn new() -> Self {
        let mut kinds = HashSet::new();
        kinds.insert(ComponentKind::of::<Trajectory>());
        kinds.insert(ComponentKind::of::<Body>());
        Self { kinds }
    }
}

impl Default for TrajectoryStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TrajectoryStage {
    fn name(&self) -> &str {
        "trajectory"
    }

    fn required_kinds(&self) -> &HashSet<ComponentKind> {
        &self.kinds
    }

    fn update_entity(
        &mut self,
        entity: &mut Entity,
        ctx: &mut StageContext<'_>,
    ) -> Result<(), EcsError> {
        let velocity = entity.component_mut::<Trajectory>()?.advance(ctx.dt);
        entity.component_mut::<Body>()?.velocity = velocity;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
