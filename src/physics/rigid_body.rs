//! Rigid body definitions, live body state and integration functions.

use glam::Vec2;

use crate::math::Transform2d;

use super::shape::MassData;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyType {
    /// Immovable, zero mass.
    Static,
    /// Moved by velocity only, zero mass.
    Kinematic,
    /// Affected by forces and gravity.
    #[default]
    Dynamic,
}

/// Detached body description. Live bodies are created from it and copied back into it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyDef {
    /// Default: dynamic.
    pub body_type: BodyType,
    pub position: Vec2,
    /// Radians.
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Default: 1.0.
    pub gravity_scale: f32,
    /// Default: true.
    pub allow_sleep: bool,
    /// Default: true.
    pub awake: bool,
    pub fixed_rotation: bool,
    pub bullet: bool,
    /// Default: true.
    pub active: bool,
    /// Opaque value handed back with contact events.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub user_data: u64,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            active: true,
            user_data: 0,
        }
    }
}

impl BodyDef {
    pub fn transform(&self) -> Transform2d {
        Transform2d::new(self.position, self.angle)
    }
}

/// Live body component stored in the physics world.
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) body_type: BodyType,
    pub(crate) transform: Transform2d,
    pub(crate) local_center: Vec2,
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f32,
    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) gravity_scale: f32,
    pub(crate) allow_sleep: bool,
    pub(crate) awake: bool,
    pub(crate) fixed_rotation: bool,
    pub(crate) bullet: bool,
    pub(crate) active: bool,
    pub(crate) user_data: u64,
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    /// Rotational inertia about the centre of mass.
    pub(crate) inertia: f32,
    pub(crate) inv_inertia: f32,
    pub(crate) force: Vec2,
    pub(crate) torque: f32,
    pub(crate) sleep_time: f32,
    pub(crate) fixtures: Vec<hecs::Entity>,
}

impl Body {
    pub(crate) fn from_def(def: &BodyDef) -> Self {
        let is_static = def.body_type == BodyType::Static;
        Self {
            body_type: def.body_type,
            transform: def.transform(),
            local_center: Vec2::ZERO,
            linear_velocity: if is_static { Vec2::ZERO } else { def.linear_velocity },
            angular_velocity: if is_static { 0.0 } else { def.angular_velocity },
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            allow_sleep: def.allow_sleep,
            awake: def.awake,
            fixed_rotation: def.fixed_rotation,
            bullet: def.bullet,
            active: def.active,
            user_data: def.user_data,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            sleep_time: 0.0,
            fixtures: Vec::new(),
        }
    }

    /// Snapshot the live state as a definition.
    pub fn to_def(&self) -> BodyDef {
        BodyDef {
            body_type: self.body_type,
            position: self.transform.position,
            angle: self.transform.angle,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            gravity_scale: self.gravity_scale,
            allow_sleep: self.allow_sleep,
            awake: self.awake,
            fixed_rotation: self.fixed_rotation,
            bullet: self.bullet,
            active: self.active,
            user_data: self.user_data,
        }
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }
    pub fn transform(&self) -> Transform2d {
        self.transform
    }
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }
    pub fn angle(&self) -> f32 {
        self.transform.angle
    }
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }
    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }
    pub fn is_sleeping_allowed(&self) -> bool {
        self.allow_sleep
    }
    pub fn is_awake(&self) -> bool {
        self.awake
    }
    pub fn is_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }
    pub fn is_bullet(&self) -> bool {
        self.bullet
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn user_data(&self) -> u64 {
        self.user_data
    }
    pub fn mass(&self) -> f32 {
        self.mass
    }
    /// Rotational inertia about the body origin.
    pub fn inertia(&self) -> f32 {
        self.inertia + self.mass * self.local_center.length_squared()
    }
    pub fn local_center(&self) -> Vec2 {
        self.local_center
    }
    pub fn world_center(&self) -> Vec2 {
        self.transform.world_point(self.local_center)
    }
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    pub(crate) fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.transform = Transform2d::new(position, angle);
    }

    pub(crate) fn set_linear_velocity(&mut self, velocity: Vec2) {
        if self.body_type == BodyType::Static {
            return;
        }
        if velocity.length_squared() > 0.0 {
            self.set_awake(true);
        }
        self.linear_velocity = velocity;
    }

    pub(crate) fn set_angular_velocity(&mut self, omega: f32) {
        if self.body_type == BodyType::Static {
            return;
        }
        if omega * omega > 0.0 {
            self.set_awake(true);
        }
        self.angular_velocity = omega;
    }

    pub(crate) fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
    }

    pub(crate) fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping;
    }

    pub(crate) fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    pub(crate) fn set_awake(&mut self, awake: bool) {
        if awake {
            if !self.awake {
                self.awake = true;
                self.sleep_time = 0.0;
            }
        } else {
            self.awake = false;
            self.sleep_time = 0.0;
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.force = Vec2::ZERO;
            self.torque = 0.0;
        }
    }

    pub(crate) fn set_sleeping_allowed(&mut self, allowed: bool) {
        self.allow_sleep = allowed;
        if !allowed {
            self.set_awake(true);
        }
    }

    pub(crate) fn set_bullet(&mut self, bullet: bool) {
        self.bullet = bullet;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Apply mass properties summed over the fixtures.
    pub(crate) fn apply_mass_data(&mut self, total: MassData) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.local_center = Vec2::ZERO;

        if self.body_type != BodyType::Dynamic {
            return;
        }

        let old_center = self.world_center();
        let mut local_center = Vec2::ZERO;
        if total.mass > 0.0 {
            self.mass = total.mass;
            self.inv_mass = 1.0 / total.mass;
            local_center = total.center / total.mass;
        } else {
            // Dynamic bodies always carry mass.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if total.inertia > 0.0 && !self.fixed_rotation {
            let inertia = total.inertia - self.mass * local_center.length_squared();
            if inertia > 0.0 {
                self.inertia = inertia;
                self.inv_inertia = 1.0 / inertia;
            }
        }

        self.local_center = local_center;
        let new_center = self.world_center();
        self.linear_velocity += Vec2::new(
            -self.angular_velocity * (new_center.y - old_center.y),
            self.angular_velocity * (new_center.x - old_center.x),
        );
    }

    pub(crate) fn apply_force(&mut self, force: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.force += force;
            self.torque += (point - self.world_center()).perp_dot(force);
        }
    }

    pub(crate) fn apply_torque(&mut self, torque: f32, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.torque += torque;
        }
    }

    pub(crate) fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.linear_velocity += self.inv_mass * impulse;
            self.angular_velocity += self.inv_inertia * (point - self.world_center()).perp_dot(impulse);
        }
    }

    pub(crate) fn apply_angular_impulse(&mut self, impulse: f32, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.angular_velocity += self.inv_inertia * impulse;
        }
    }

    /// Velocity of a world point attached to this body.
    pub fn linear_velocity_from_world_point(&self, point: Vec2) -> Vec2 {
        let r = point - self.world_center();
        self.linear_velocity + Vec2::new(-self.angular_velocity * r.y, self.angular_velocity * r.x)
    }
}

/// Integrate velocities for awake dynamic bodies: gravity, forces, then damping.
pub fn integrate_velocities(world: &mut hecs::World, gravity: Vec2, dt: f32) {
    for (_, body) in world.query_mut::<&mut Body>() {
        if body.body_type != BodyType::Dynamic || !body.awake || !body.active {
            continue;
        }

        body.linear_velocity += dt * (body.gravity_scale * gravity + body.inv_mass * body.force);
        body.angular_velocity += dt * body.inv_inertia * body.torque;

        // Pade approximation of exp(-damping * dt)
        body.linear_velocity *= 1.0 / (1.0 + dt * body.linear_damping);
        body.angular_velocity *= 1.0 / (1.0 + dt * body.angular_damping);

        if body.fixed_rotation {
            body.angular_velocity = 0.0;
        }
    }
}

/// Integrate positions about the centre of mass for awake, non-static bodies.
pub fn integrate_positions(world: &mut hecs::World, dt: f32) {
    for (_, body) in world.query_mut::<&mut Body>() {
        if body.body_type == BodyType::Static || !body.awake || !body.active {
            continue;
        }
        let center = body.world_center() + body.linear_velocity * dt;
        let angle = body.transform.angle + body.angular_velocity * dt;
        let rotation = Vec2::from_angle(angle);
        body.transform = Transform2d::new(center - rotation.rotate(body.local_center), angle);
    }
}

/// Clear force and torque accumulators on all bodies.
pub fn clear_forces(world: &mut hecs::World) {
    for (_, body) in world.query_mut::<&mut Body>() {
        body.force = Vec2::ZERO;
        body.torque = 0.0;
    }
}

/// Put bodies to sleep once they stay below the velocity tolerances for `time_to_sleep`.
pub fn update_sleep_states(
    world: &mut hecs::World,
    dt: f32,
    linear_tolerance: f32,
    angular_tolerance: f32,
    time_to_sleep: f32,
) {
    for (_, body) in world.query_mut::<&mut Body>() {
        if body.body_type == BodyType::Static || !body.awake || !body.active {
            continue;
        }
        if !body.allow_sleep
            || body.linear_velocity.length_squared() > linear_tolerance * linear_tolerance
            || body.angular_velocity * body.angular_velocity > angular_tolerance * angular_tolerance
        {
            body.sleep_time = 0.0;
            continue;
        }
        body.sleep_time += dt;
        if body.sleep_time >= time_to_sleep {
            body.set_awake(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(world: &mut hecs::World, def: &BodyDef) -> hecs::Entity {
        let mut body = Body::from_def(def);
        body.apply_mass_data(MassData {
            mass: 1.0,
            center: Vec2::ZERO,
            inertia: 1.0,
        });
        world.spawn((body,))
    }

    #[test]
    fn test_body_def_defaults() {
        let def = BodyDef::default();
        assert_eq!(def.body_type, BodyType::Dynamic);
        assert_eq!(def.gravity_scale, 1.0);
        assert!(def.allow_sleep && def.awake && def.active);
        assert!(!def.fixed_rotation && !def.bullet);
    }

    #[test]
    fn test_def_round_trip() {
        let def = BodyDef {
            body_type: BodyType::Kinematic,
            position: Vec2::new(1.0, 2.0),
            angle: 0.5,
            linear_velocity: Vec2::new(3.0, 0.0),
            angular_velocity: 1.5,
            linear_damping: 0.1,
            angular_damping: 0.2,
            gravity_scale: 0.5,
            allow_sleep: false,
            awake: true,
            fixed_rotation: true,
            bullet: true,
            active: false,
            user_data: 7,
        };
        assert_eq!(Body::from_def(&def).to_def(), def);
    }

    #[test]
    fn test_static_body_ignores_velocity() {
        let mut body = Body::from_def(&BodyDef {
            body_type: BodyType::Static,
            linear_velocity: Vec2::ONE,
            ..Default::default()
        });
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
        body.set_linear_velocity(Vec2::X);
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_gravity_integration() {
        let mut world = hecs::World::new();
        let e = spawn(&mut world, &BodyDef::default());
        let dt = 1.0 / 60.0;
        for _ in 0..60 {
            integrate_velocities(&mut world, Vec2::new(0.0, -10.0), dt);
            integrate_positions(&mut world, dt);
        }
        let body = world.get::<&Body>(e).unwrap();
        assert!((body.linear_velocity().y + 10.0).abs() < 1e-3);
        assert!(body.position().y < -4.0);
    }

    #[test]
    fn test_kinematic_ignores_gravity() {
        let mut world = hecs::World::new();
        let e = spawn(
            &mut world,
            &BodyDef {
                body_type: BodyType::Kinematic,
                linear_velocity: Vec2::new(1.0, 0.0),
                ..Default::default()
            },
        );
        for _ in 0..60 {
            integrate_velocities(&mut world, Vec2::new(0.0, -10.0), 1.0 / 60.0);
            integrate_positions(&mut world, 1.0 / 60.0);
        }
        let body = world.get::<&Body>(e).unwrap();
        assert!((body.position() - Vec2::new(1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_damping_slows_body() {
        let mut world = hecs::World::new();
        let e = spawn(
            &mut world,
            &BodyDef {
                linear_velocity: Vec2::new(10.0, 0.0),
                linear_damping: 2.0,
                ..Default::default()
            },
        );
        for _ in 0..60 {
            integrate_velocities(&mut world, Vec2::ZERO, 1.0 / 60.0);
        }
        let body = world.get::<&Body>(e).unwrap();
        assert!(body.linear_velocity().x < 2.0);
        assert!(body.linear_velocity().x > 0.0);
    }

    #[test]
    fn test_sleep_after_rest() {
        let mut world = hecs::World::new();
        let e = spawn(&mut world, &BodyDef::default());
        for _ in 0..31 {
            update_sleep_states(&mut world, 1.0 / 60.0, 0.01, 0.035, 0.5);
        }
        assert!(!world.get::<&Body>(e).unwrap().is_awake());
    }

    #[test]
    fn test_sleep_not_allowed() {
        let mut world = hecs::World::new();
        let e = spawn(
            &mut world,
            &BodyDef {
                allow_sleep: false,
                ..Default::default()
            },
        );
        for _ in 0..120 {
            update_sleep_states(&mut world, 1.0 / 60.0, 0.01, 0.035, 0.5);
        }
        assert!(world.get::<&Body>(e).unwrap().is_awake());
    }

    #[test]
    fn test_impulse_changes_velocity() {
        let mut body = Body::from_def(&BodyDef::default());
        body.apply_mass_data(MassData {
            mass: 2.0,
            center: Vec2::ZERO,
            inertia: 1.0,
        });
        body.apply_linear_impulse(Vec2::new(4.0, 0.0), body.world_center(), true);
        assert!((body.linear_velocity() - Vec2::new(2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_zero_mass_dynamic_gets_unit_mass() {
        let mut body = Body::from_def(&BodyDef::default());
        body.apply_mass_data(MassData::default());
        assert_eq!(body.mass(), 1.0);
        assert_eq!(body.inertia(), 0.0);
    }
}
