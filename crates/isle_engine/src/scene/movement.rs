//! Waypoint movement for scene nodes
//!
//! Each node can carry an optional waypoint-following behavior that
//! rewrites its local transform every frame: Idle until started, Moving
//! while waypoints remain, back to Idle forever once a non-looping
//! sequence is exhausted.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Distance at which a waypoint counts as reached, in world units
pub(crate) const WAYPOINT_REACH_THRESHOLD: f32 = 5.0;

/// Waypoint-following state embedded in a scene node
///
/// Looping behavior is intentionally literal to the shipped demo: when a
/// looping sequence is exhausted, the *completed history* becomes the new
/// sequence. For a two-point path this reverses the direction of travel
/// each cycle rather than replaying from the start.
#[derive(Debug, Clone, Default)]
pub struct MovementState {
    movable: bool,
    looping: bool,
    speed: f32,
    waypoints: Vec<Vec3>,
    completed: Vec<Vec3>,
    index: usize,
    target: Vec3,
}

impl MovementState {
    /// Inert state; the node never moves until [`MovementState::start`]
    pub fn inert() -> Self {
        Self::default()
    }

    /// Begin following `waypoints` at `speed` world units per second
    ///
    /// # Panics
    /// Panics if `waypoints` is empty; a movable node with no waypoints
    /// is a programming error.
    pub fn start(waypoints: Vec<Vec3>, looping: bool, speed: f32) -> Self {
        assert!(!waypoints.is_empty(), "movement needs at least one waypoint");
        let target = waypoints[0];
        Self {
            movable: true,
            looping,
            speed,
            waypoints,
            completed: Vec::new(),
            index: 0,
            target,
        }
    }

    /// Whether the node still has waypoints to chase
    pub fn is_moving(&self) -> bool {
        self.movable && !self.waypoints.is_empty()
    }

    /// Waypoints remaining in the active sequence
    pub fn remaining_waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Current target waypoint
    pub fn current_target(&self) -> Vec3 {
        self.target
    }

    /// Advance one tick, rewriting `local` as a pure translation
    ///
    /// No easing and no orientation change; the node slides along the
    /// normalized direction to its target by `speed * dt`.
    pub fn advance(&mut self, local: &mut Mat4, dt: f32) {
        if !self.is_moving() {
            return;
        }

        let position = local.position();
        let distance = (self.target - position).magnitude();

        if distance < WAYPOINT_REACH_THRESHOLD {
            self.completed.push(self.target);
            self.index += 1;

            if self.index == self.waypoints.len() {
                if !self.looping {
                    self.movable = false;
                    return;
                }
                // The completed history becomes the new route
                self.waypoints = std::mem::take(&mut self.completed);
                self.index = 0;
            }

            self.target = self.waypoints[self.index];
        }

        // A repeated waypoint can leave us already at the target with a
        // zero-length offset; normalizing that would poison the transform
        // with NaN, so hold position until the next arrival check.
        let Some(direction) = (self.target - position).try_normalize(f32::EPSILON) else {
            return;
        };
        let new_position = position + direction * self.speed * dt;
        *local = Mat4::translation(new_position);
    }
}
