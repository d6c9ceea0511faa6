//! Rigid body state that is either a detached definition or a live physics body.

use glam::Vec2;

use crate::error::{PhysicsError, SceneError};
use crate::math::Transform2d;
use crate::physics::rigid_body::{Body, BodyDef, BodyType};
use crate::physics::{BodyHandle, PhysicsWorld, SharedPhysics};

use super::fail_closed;

enum BodyRepr {
    Detached(BodyDef),
    Attached {
        physics: SharedPhysics,
        handle: BodyHandle,
    },
}

/// An object's single rigid body.
///
/// Every accessor reads, and every mutator writes, whichever side is
/// authoritative: the [`BodyDef`] while detached or the live body while attached.
pub struct RigidBodyState {
    repr: BodyRepr,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self::new(BodyDef::default())
    }
}

impl RigidBodyState {
    pub fn new(def: BodyDef) -> Self {
        Self {
            repr: BodyRepr::Detached(def),
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.repr, BodyRepr::Attached { .. })
    }

    pub(crate) fn live(&self) -> Option<(&SharedPhysics, BodyHandle)> {
        match &self.repr {
            BodyRepr::Attached { physics, handle } => Some((physics, *handle)),
            BodyRepr::Detached(_) => None,
        }
    }

    fn read<R: Default>(&self, detached: impl FnOnce(&BodyDef) -> R, live: impl FnOnce(&Body) -> R) -> R {
        match &self.repr {
            BodyRepr::Detached(def) => detached(def),
            BodyRepr::Attached { physics, handle } => match physics.borrow().body(*handle) {
                Some(body) => live(&body),
                None => {
                    fail_closed(format_args!("rigid body {:?} is missing from the physics world", handle));
                    R::default()
                }
            },
        }
    }

    fn write(
        &mut self,
        detached: impl FnOnce(&mut BodyDef),
        live: impl FnOnce(&mut PhysicsWorld, BodyHandle) -> Result<(), PhysicsError>,
    ) {
        match &mut self.repr {
            BodyRepr::Detached(def) => detached(def),
            BodyRepr::Attached { physics, handle } => {
                if let Err(err) = live(&mut physics.borrow_mut(), *handle) {
                    fail_closed(format_args!("rigid body {:?}: {}", handle, err));
                }
            }
        }
    }

    fn write_body(&mut self, detached: impl FnOnce(&mut BodyDef), live: impl FnOnce(&mut Body)) {
        self.write(detached, |world, handle| {
            let body = world.body_mut(handle).ok_or(PhysicsError::InvalidBody)?;
            live(body);
            Ok(())
        });
    }

    /// Snapshot of the authoritative state as a definition.
    pub fn to_def(&self) -> BodyDef {
        self.read(BodyDef::clone, Body::to_def)
    }

    /// Create the live body from the definition.
    pub(crate) fn attach(
        &mut self,
        physics: &SharedPhysics,
        active: bool,
        user_data: u64,
    ) -> Result<BodyHandle, SceneError> {
        let BodyRepr::Detached(def) = &self.repr else {
            fail_closed(format_args!("rigid body is already attached"));
            return Err(SceneError::AlreadyAttached);
        };
        let def = BodyDef {
            active,
            user_data,
            ..def.clone()
        };
        let handle = physics.borrow_mut().create_body(&def);
        self.repr = BodyRepr::Attached {
            physics: physics.clone(),
            handle,
        };
        Ok(handle)
    }

    /// Copy the live state back into a definition and destroy the body with its fixtures.
    pub(crate) fn detach(&mut self) -> Result<(), SceneError> {
        let BodyRepr::Attached { physics, handle } = &self.repr else {
            fail_closed(format_args!("rigid body is not attached"));
            return Err(SceneError::NotAttached);
        };
        let mut world = physics.borrow_mut();
        let def = match world.body(*handle) {
            Some(body) => BodyDef {
                user_data: 0,
                ..body.to_def()
            },
            None => {
                fail_closed(format_args!("rigid body {:?} vanished before detach", handle));
                BodyDef::default()
            }
        };
        if let Err(err) = world.destroy_body(*handle) {
            fail_closed(format_args!("destroying rigid body {:?}: {}", handle, err));
        }
        drop(world);
        self.repr = BodyRepr::Detached(def);
        Ok(())
    }

    /// Apply every kinematic property of `def` except the transform, `active`
    /// and user data, which belong to the owning object.
    pub(crate) fn copy_from_def(&mut self, def: &BodyDef) {
        self.set_body_type(def.body_type);
        self.set_fixed_angle(def.fixed_rotation);
        self.set_linear_velocity(def.linear_velocity);
        self.set_angular_velocity(def.angular_velocity);
        self.set_linear_damping(def.linear_damping);
        self.set_angular_damping(def.angular_damping);
        self.set_gravity_scale(def.gravity_scale);
        self.set_bullet(def.bullet);
        self.set_sleeping_allowed(def.allow_sleep);
        self.set_awake(def.awake);
    }

    pub fn body_type(&self) -> BodyType {
        self.read(|d| d.body_type, Body::body_type)
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.write(
            |d| {
                d.body_type = body_type;
                if body_type == BodyType::Static {
                    d.linear_velocity = Vec2::ZERO;
                    d.angular_velocity = 0.0;
                }
            },
            |world, handle| world.set_body_type(handle, body_type),
        );
    }

    pub fn transform(&self) -> Transform2d {
        self.read(BodyDef::transform, Body::transform)
    }

    pub fn position(&self) -> Vec2 {
        self.transform().position
    }

    pub fn angle(&self) -> f32 {
        self.transform().angle
    }

    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.write_body(
            |d| {
                d.position = position;
                d.angle = angle;
            },
            |b| b.set_transform(position, angle),
        );
    }

    pub fn set_position(&mut self, position: Vec2) {
        let angle = self.angle();
        self.set_transform(position, angle);
    }

    pub fn set_angle(&mut self, angle: f32) {
        let position = self.position();
        self.set_transform(position, angle);
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.read(|d| d.linear_velocity, Body::linear_velocity)
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.write_body(
            |d| {
                if d.body_type != BodyType::Static {
                    d.linear_velocity = velocity;
                }
            },
            |b| b.set_linear_velocity(velocity),
        );
    }

    pub fn angular_velocity(&self) -> f32 {
        self.read(|d| d.angular_velocity, Body::angular_velocity)
    }

    pub fn set_angular_velocity(&mut self, omega: f32) {
        self.write_body(
            |d| {
                if d.body_type != BodyType::Static {
                    d.angular_velocity = omega;
                }
            },
            |b| b.set_angular_velocity(omega),
        );
    }

    pub fn linear_damping(&self) -> f32 {
        self.read(|d| d.linear_damping, Body::linear_damping)
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.write_body(|d| d.linear_damping = damping, |b| b.set_linear_damping(damping));
    }

    pub fn angular_damping(&self) -> f32 {
        self.read(|d| d.angular_damping, Body::angular_damping)
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        self.write_body(|d| d.angular_damping = damping, |b| b.set_angular_damping(damping));
    }

    pub fn gravity_scale(&self) -> f32 {
        self.read(|d| d.gravity_scale, Body::gravity_scale)
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.write_body(|d| d.gravity_scale = scale, |b| b.set_gravity_scale(scale));
    }

    pub fn is_fixed_angle(&self) -> bool {
        self.read(|d| d.fixed_rotation, Body::is_fixed_rotation)
    }

    pub fn set_fixed_angle(&mut self, fixed: bool) {
        self.write(
            |d| {
                if d.fixed_rotation != fixed {
                    d.fixed_rotation = fixed;
                    d.angular_velocity = 0.0;
                }
            },
            |world, handle| world.set_fixed_rotation(handle, fixed),
        );
    }

    pub fn is_bullet(&self) -> bool {
        self.read(|d| d.bullet, Body::is_bullet)
    }

    pub fn set_bullet(&mut self, bullet: bool) {
        self.write_body(|d| d.bullet = bullet, |b| b.set_bullet(bullet));
    }

    pub fn is_sleeping_allowed(&self) -> bool {
        self.read(|d| d.allow_sleep, Body::is_sleeping_allowed)
    }

    pub fn set_sleeping_allowed(&mut self, allowed: bool) {
        self.write_body(
            |d| {
                d.allow_sleep = allowed;
                if !allowed {
                    d.awake = true;
                }
            },
            |b| b.set_sleeping_allowed(allowed),
        );
    }

    pub fn is_awake(&self) -> bool {
        self.read(|d| d.awake, Body::is_awake)
    }

    pub fn set_awake(&mut self, awake: bool) {
        self.write_body(
            |d| {
                d.awake = awake;
                if !awake {
                    d.linear_velocity = Vec2::ZERO;
                    d.angular_velocity = 0.0;
                }
            },
            |b| b.set_awake(awake),
        );
    }

    pub fn is_active(&self) -> bool {
        self.read(|d| d.active, Body::is_active)
    }

    pub fn set_active(&mut self, active: bool) {
        self.write_body(|d| d.active = active, |b| b.set_active(active));
    }

    /// Zero while detached.
    pub fn mass(&self) -> f32 {
        self.read(|_| 0.0, Body::mass)
    }

    /// Rotational inertia about the body origin. Zero while detached.
    pub fn inertia(&self) -> f32 {
        self.read(|_| 0.0, Body::inertia)
    }

    pub fn local_center(&self) -> Vec2 {
        self.read(|_| Vec2::ZERO, Body::local_center)
    }

    pub fn world_center(&self) -> Vec2 {
        self.read(|d| d.position, Body::world_center)
    }

    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.transform().world_point(local)
    }

    pub fn local_point(&self, world: Vec2) -> Vec2 {
        self.transform().local_point(world)
    }

    pub fn world_vector(&self, local: Vec2) -> Vec2 {
        self.transform().world_vector(local)
    }

    pub fn local_vector(&self, world: Vec2) -> Vec2 {
        self.transform().local_vector(world)
    }

    pub fn linear_velocity_from_world_point(&self, point: Vec2) -> Vec2 {
        self.read(
            |d| {
                let r = point - d.position;
                d.linear_velocity + Vec2::new(-d.angular_velocity * r.y, d.angular_velocity * r.x)
            },
            |b| b.linear_velocity_from_world_point(point),
        )
    }

    pub fn linear_velocity_from_local_point(&self, point: Vec2) -> Vec2 {
        self.linear_velocity_from_world_point(self.world_point(point))
    }

    fn live_only(&mut self, what: &str, apply: impl FnOnce(&mut Body)) {
        if !self.is_attached() {
            tracing::warn!("cannot {} on a body that is not in a scene", what);
            return;
        }
        self.write_body(|_| {}, apply);
    }

    pub fn apply_force(&mut self, force: Vec2, wake: bool) {
        self.live_only("apply force", |b| {
            let center = b.world_center();
            b.apply_force(force, center, wake)
        });
    }

    pub fn apply_force_at(&mut self, force: Vec2, world_point: Vec2, wake: bool) {
        self.live_only("apply force", |b| b.apply_force(force, world_point, wake));
    }

    pub fn apply_torque(&mut self, torque: f32, wake: bool) {
        self.live_only("apply torque", |b| b.apply_torque(torque, wake));
    }

    pub fn apply_linear_impulse(&mut self, impulse: Vec2, wake: bool) {
        self.live_only("apply linear impulse", |b| {
            let center = b.world_center();
            b.apply_linear_impulse(impulse, center, wake)
        });
    }

    pub fn apply_linear_impulse_at(&mut self, impulse: Vec2, world_point: Vec2, wake: bool) {
        self.live_only("apply linear impulse", |b| {
            b.apply_linear_impulse(impulse, world_point, wake)
        });
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32, wake: bool) {
        self.live_only("apply angular impulse", |b| b.apply_angular_impulse(impulse, wake));
    }
}
