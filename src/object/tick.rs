//! Pre-tick / integrate / interpolate state for smoothing fixed-step motion.

use glam::Vec2;

use crate::math::{compute_aabb, transform_oobb, wrap_angle, Aabb2d, Oobb, Transform2d};

/// Spatial-index update produced by [`TickSpatials::integrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyUpdate {
    /// Union of the pre-tick and current AABB.
    pub aabb: Aabb2d,
    /// Position change since the pre-tick snapshot.
    pub displacement: Vec2,
}

/// Pre-tick snapshot, current AABB and render transform of one object.
///
/// While the spatial-dirty flag is clear the render transform equals the
/// current transform. Once a step moves the object, [`interpolate`](Self::interpolate)
/// blends between the pre-tick snapshot and the current transform.
#[derive(Debug, Clone)]
pub struct TickSpatials {
    pre_tick: Transform2d,
    pre_tick_aabb: Aabb2d,
    current_aabb: Aabb2d,
    render: Transform2d,
    render_oobb: Oobb,
    dirty: bool,
}

impl TickSpatials {
    pub fn new(current: Transform2d, local_oobb: &Oobb) -> Self {
        let aabb = compute_aabb(local_oobb, &current);
        Self {
            pre_tick: current,
            pre_tick_aabb: aabb,
            current_aabb: aabb,
            render: current,
            render_oobb: transform_oobb(local_oobb, &current),
            dirty: false,
        }
    }

    /// Collapse pre-tick, current and render onto `current`.
    ///
    /// Leaves the object flagged dirty so the next pre-integrate takes a fresh baseline.
    pub fn reset(&mut self, current: Transform2d, local_oobb: &Oobb) {
        self.pre_tick = current;
        self.render = current;
        self.current_aabb = compute_aabb(local_oobb, &current);
        self.pre_tick_aabb = self.current_aabb;
        self.render_oobb = transform_oobb(local_oobb, &current);
        self.dirty = true;
    }

    /// Take the interpolation baseline before a physics step. No-op when not dirty.
    pub fn pre_integrate(&mut self, current: Transform2d, local_oobb: &Oobb) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.pre_tick = current;
        self.render = current;
        self.pre_tick_aabb = self.current_aabb;
        self.render_oobb = transform_oobb(local_oobb, &current);
    }

    /// Compare the post-step transform with the baseline.
    ///
    /// Returns the swept AABB and displacement to push to the spatial index if the object moved.
    pub fn integrate(&mut self, current: Transform2d, local_oobb: &Oobb) -> Option<ProxyUpdate> {
        if current == self.pre_tick {
            return None;
        }
        self.dirty = true;
        self.current_aabb = compute_aabb(local_oobb, &current);
        Some(ProxyUpdate {
            aabb: self.pre_tick_aabb.union(&self.current_aabb),
            displacement: current.position - self.pre_tick.position,
        })
    }

    /// Produce the render transform for a frame.
    ///
    /// `factor` is the fraction of the step still to be covered: values below 1
    /// move back from `current` towards the pre-tick snapshot, 1 or more yields
    /// the pre-tick snapshot itself.
    pub fn interpolate(&mut self, current: Transform2d, factor: f32, local_oobb: &Oobb) {
        self.render = if !self.dirty {
            current
        } else if factor < 1.0 {
            let delta = current.position - self.pre_tick.position;
            let relative_angle = wrap_angle(current.angle - self.pre_tick.angle);
            Transform2d::new(
                current.position - delta * factor,
                current.angle - relative_angle * factor,
            )
        } else {
            self.pre_tick
        };
        self.render_oobb = transform_oobb(local_oobb, &self.render);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
    pub fn pre_tick(&self) -> Transform2d {
        self.pre_tick
    }
    pub fn pre_tick_aabb(&self) -> Aabb2d {
        self.pre_tick_aabb
    }
    pub fn current_aabb(&self) -> Aabb2d {
        self.current_aabb
    }
    pub fn render(&self) -> Transform2d {
        self.render
    }
    pub fn render_oobb(&self) -> &Oobb {
        &self.render_oobb
    }
}
