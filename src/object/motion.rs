//! Timed move-to / rotate-to commands.

use glam::Vec2;

use crate::scene::scheduler::EventId;
use crate::scene::ObjectId;

/// Which command a scheduled motion event completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Move,
    Rotate,
}

/// Scheduler payload for a motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub object: ObjectId,
    pub kind: MotionKind,
}

/// Velocity and duration needed to reach a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovePlan {
    pub linear_velocity: Vec2,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatePlan {
    pub angular_velocity: f32,
    pub duration: f64,
}

/// Straight-line velocity covering `from -> to` at `speed`.
pub fn plan_move(from: Vec2, to: Vec2, speed: f32) -> MovePlan {
    let offset = to - from;
    let distance = offset.length();
    MovePlan {
        linear_velocity: offset.normalize_or_zero() * speed,
        duration: f64::from(distance / speed),
    }
}

/// Rotation along the shortest arc from `from` to `to` at `speed` rad/s.
pub fn plan_rotate(from: f32, to: f32, speed: f32) -> RotatePlan {
    let relative = to - from;
    let delta = relative.sin().atan2(relative.cos());
    RotatePlan {
        angular_velocity: if delta > 0.0 { speed } else { -speed },
        duration: f64::from((delta / speed).abs()),
    }
}

/// One outstanding command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand<T> {
    pub event: EventId,
    pub target: T,
    pub auto_stop: bool,
    pub warp_to_target: bool,
}

/// At most one move and one rotate command per object.
#[derive(Debug, Clone, Default)]
pub struct MotionState {
    pub(crate) move_to: Option<MotionCommand<Vec2>>,
    pub(crate) rotate_to: Option<MotionCommand<f32>>,
}

impl MotionState {
    pub fn is_move_to_complete(&self) -> bool {
        self.move_to.is_none()
    }

    pub fn is_rotate_to_complete(&self) -> bool {
        self.rotate_to.is_none()
    }

    pub fn move_target(&self) -> Option<Vec2> {
        self.move_to.map(|c| c.target)
    }

    pub fn rotate_target(&self) -> Option<f32> {
        self.rotate_to.map(|c| c.target)
    }

    /// Take the move command if `event` is the one outstanding.
    pub(crate) fn take_move(&mut self, event: EventId) -> Option<MotionCommand<Vec2>> {
        match self.move_to {
            Some(command) if command.event == event => self.move_to.take(),
            _ => None,
        }
    }

    pub(crate) fn take_rotate(&mut self, event: EventId) -> Option<MotionCommand<f32>> {
        match self.rotate_to {
            Some(command) if command.event == event => self.rotate_to.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_plan_move() {
        let plan = plan_move(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0);
        assert_eq!(plan.linear_velocity, Vec2::new(2.0, 0.0));
        assert!((plan.duration - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_move_zero_distance() {
        let plan = plan_move(Vec2::ONE, Vec2::ONE, 1.0);
        assert_eq!(plan.linear_velocity, Vec2::ZERO);
        assert_eq!(plan.duration, 0.0);
    }

    #[test]
    fn test_plan_rotate_shortest_direction() {
        let eps = 1e-5;
        let plan = plan_rotate(0.0, FRAC_PI_2, 1.0);
        assert_eq!(plan.angular_velocity, 1.0);
        assert!((plan.duration - f64::from(FRAC_PI_2)).abs() < eps);

        // 3/4 turn counter-clockwise is a 1/4 turn clockwise.
        let plan = plan_rotate(0.0, 3.0 * FRAC_PI_2, 2.0);
        assert_eq!(plan.angular_velocity, -2.0);
        assert!((plan.duration - f64::from(FRAC_PI_2 / 2.0)).abs() < eps);
    }
}
