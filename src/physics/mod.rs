//! CPU 2D rigid-body world with fixture contact tracking.
//!
//! # Architecture
//!
//! Bodies and fixtures are `hecs` entities owned by [`PhysicsWorld`]. One call
//! to [`PhysicsWorld::step`] runs:
//!
//! 1. Integrate velocities (gravity, forces, damping)
//! 2. Integrate positions
//! 3. Clear force accumulators
//! 4. Update sleep states
//! 5. Broadphase (sweep-and-prune over fixture AABBs)
//! 6. Narrowphase overlap tests
//! 7. Report contact begin/end transitions
//!
//! Destroying a fixture that is touching another ends its contacts; those
//! end events are queued and reported ahead of the next step's transitions.
//!
//! There is no contact solver: overlapping bodies pass through each other.

pub mod broadphase;
pub mod contact;
pub mod narrowphase;
pub mod rigid_body;
pub mod shape;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use glam::Vec2;

use crate::error::PhysicsError;

use self::broadphase::SweepAndPrune;
use self::contact::{ContactCache, ContactEvent, ContactPhase, FixturePair};
use self::narrowphase::shapes_overlap;
use self::rigid_body::{Body, BodyDef, BodyType};
use self::shape::{CollisionShape, FixtureDef, FixtureMaterial, MassData};

/// Physics world shared by every object in a scene.
pub type SharedPhysics = Rc<RefCell<PhysicsWorld>>;

/// Handle to a live body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(hecs::Entity);

/// Handle to a live fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureHandle(hecs::Entity);

/// Live fixture component: geometry attached to a body.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub(crate) body: hecs::Entity,
    pub(crate) shape: CollisionShape,
    pub(crate) material: FixtureMaterial,
}

impl Fixture {
    pub fn body(&self) -> BodyHandle {
        BodyHandle(self.body)
    }
    pub fn shape(&self) -> &CollisionShape {
        &self.shape
    }
    pub fn material(&self) -> FixtureMaterial {
        self.material
    }
    /// Copy the live fixture out as a definition.
    pub fn to_def(&self) -> FixtureDef {
        FixtureDef::new(self.shape.clone(), self.material)
    }
}

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, 0).
    pub gravity: Vec2,
    /// Linear speed below which a body may fall asleep. Default: 0.01.
    pub linear_sleep_tolerance: f32,
    /// Angular speed below which a body may fall asleep. Default: 2 degrees/s.
    pub angular_sleep_tolerance: f32,
    /// Time in seconds a body must rest before sleeping. Default: 0.5.
    pub time_to_sleep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            linear_sleep_tolerance: 0.01,
            angular_sleep_tolerance: 2.0_f32.to_radians(),
            time_to_sleep: 0.5,
        }
    }
}

/// The physics world managing bodies, fixtures and contacts.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    world: hecs::World,
    broadphase: SweepAndPrune,
    contacts: ContactCache,
    destroyed_contacts: Vec<ContactEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            world: hecs::World::new(),
            broadphase: SweepAndPrune::new(),
            contacts: ContactCache::new(),
            destroyed_contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    pub fn body_count(&self) -> usize {
        self.world.query::<&Body>().iter().count()
    }

    pub fn fixture_count(&self) -> usize {
        self.world.query::<&Fixture>().iter().count()
    }

    /// Number of fixture pairs currently touching.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let mut body = Body::from_def(def);
        body.apply_mass_data(MassData::default());
        BodyHandle(self.world.spawn((body,)))
    }

    /// Destroy a body together with all of its fixtures.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let fixtures = self
            .body(handle)
            .map(|body| body.fixtures.clone())
            .ok_or(PhysicsError::InvalidBody)?;
        for fixture in fixtures {
            self.end_contacts(fixture);
            let _ = self.world.despawn(fixture);
        }
        self.world
            .despawn(handle.0)
            .map_err(|_| PhysicsError::InvalidBody)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<hecs::Ref<'_, Body>> {
        self.world.get::<&Body>(handle.0).ok()
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.world.query_one_mut::<&mut Body>(handle.0).ok()
    }

    pub fn fixture(&self, handle: FixtureHandle) -> Option<hecs::Ref<'_, Fixture>> {
        self.world.get::<&Fixture>(handle.0).ok()
    }

    fn fixture_mut(&mut self, handle: FixtureHandle) -> Option<&mut Fixture> {
        self.world.query_one_mut::<&mut Fixture>(handle.0).ok()
    }

    /// Fixtures of a body in creation order.
    pub fn body_fixtures(&self, handle: BodyHandle) -> Vec<FixtureHandle> {
        self.body(handle)
            .map(|body| body.fixtures.iter().copied().map(FixtureHandle).collect())
            .unwrap_or_default()
    }

    /// Attach a new fixture to `body`. Mass data is recomputed.
    pub fn create_fixture(
        &mut self,
        body: BodyHandle,
        def: &FixtureDef,
    ) -> Result<FixtureHandle, PhysicsError> {
        if self.body(body).is_none() {
            return Err(PhysicsError::InvalidBody);
        }
        let fixture = self.world.spawn((Fixture {
            body: body.0,
            shape: def.shape.clone(),
            material: def.material,
        },));
        if let Some(b) = self.body_mut(body) {
            b.fixtures.push(fixture);
        }
        self.reset_mass_data(body)?;
        Ok(FixtureHandle(fixture))
    }

    /// Detach and destroy a fixture. Mass data of its body is recomputed.
    pub fn destroy_fixture(&mut self, handle: FixtureHandle) -> Result<(), PhysicsError> {
        let body = self
            .fixture(handle)
            .map(|f| f.body())
            .ok_or(PhysicsError::InvalidFixture)?;
        self.end_contacts(handle.0);
        if let Some(b) = self.body_mut(body) {
            b.fixtures.retain(|f| *f != handle.0);
        }
        self.world
            .despawn(handle.0)
            .map_err(|_| PhysicsError::InvalidFixture)?;
        self.reset_mass_data(body)
    }

    /// Queue end events for every pair `fixture` is touching. Must run while
    /// the fixture is still listed on its body.
    fn end_contacts(&mut self, fixture: hecs::Entity) {
        for pair in self.contacts.remove_fixture(fixture) {
            let event = self.contact_event(ContactPhase::End, pair);
            self.destroyed_contacts.push(event);
        }
    }

    /// End events queued by fixture or body destruction since the last step.
    pub fn take_destroyed_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.destroyed_contacts)
    }

    fn contact_event(&self, phase: ContactPhase, pair: FixturePair) -> ContactEvent {
        let (user_data_a, index_a) = self.fixture_owner(pair.a);
        let (user_data_b, index_b) = self.fixture_owner(pair.b);
        ContactEvent {
            phase,
            fixture_a: FixtureHandle(pair.a),
            fixture_b: FixtureHandle(pair.b),
            user_data_a,
            user_data_b,
            index_a,
            index_b,
        }
    }

    /// Body user data and position of `fixture` on its body.
    fn fixture_owner(&self, fixture: hecs::Entity) -> (u64, usize) {
        let Ok(f) = self.world.get::<&Fixture>(fixture) else {
            return (0, 0);
        };
        let Ok(body) = self.world.get::<&Body>(f.body) else {
            return (0, 0);
        };
        let index = body.fixtures.iter().position(|e| *e == fixture).unwrap_or(0);
        (body.user_data, index)
    }

    /// Recompute mass, centre of mass and inertia from the body's fixtures.
    pub fn reset_mass_data(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let fixtures = self.body_fixtures(handle);
        let mut total = MassData::default();
        for fixture in fixtures {
            let Some(f) = self.fixture(fixture) else {
                continue;
            };
            if f.material.density == 0.0 {
                continue;
            }
            let mass = f.shape.compute_mass(f.material.density);
            total.mass += mass.mass;
            total.center += mass.mass * mass.center;
            total.inertia += mass.inertia;
        }
        let body = self.body_mut(handle).ok_or(PhysicsError::InvalidBody)?;
        body.apply_mass_data(total);
        Ok(())
    }

    /// Flag a fixture's contacts for re-evaluation on the next step.
    pub fn refilter(&mut self, handle: FixtureHandle) -> Result<(), PhysicsError> {
        let body = self
            .fixture(handle)
            .map(|f| f.body())
            .ok_or(PhysicsError::InvalidFixture)?;
        if let Some(b) = self.body_mut(body) {
            if b.body_type != BodyType::Static {
                b.set_awake(true);
            }
        }
        Ok(())
    }

    pub fn set_fixture_density(
        &mut self,
        handle: FixtureHandle,
        density: f32,
    ) -> Result<(), PhysicsError> {
        let fixture = self.fixture_mut(handle).ok_or(PhysicsError::InvalidFixture)?;
        fixture.material.density = density;
        let body = fixture.body();
        self.reset_mass_data(body)
    }

    pub fn set_fixture_friction(
        &mut self,
        handle: FixtureHandle,
        friction: f32,
    ) -> Result<(), PhysicsError> {
        self.fixture_mut(handle)
            .ok_or(PhysicsError::InvalidFixture)?
            .material
            .friction = friction;
        self.refilter(handle)
    }

    pub fn set_fixture_restitution(
        &mut self,
        handle: FixtureHandle,
        restitution: f32,
    ) -> Result<(), PhysicsError> {
        self.fixture_mut(handle)
            .ok_or(PhysicsError::InvalidFixture)?
            .material
            .restitution = restitution;
        self.refilter(handle)
    }

    pub fn set_fixture_sensor(
        &mut self,
        handle: FixtureHandle,
        is_sensor: bool,
    ) -> Result<(), PhysicsError> {
        self.fixture_mut(handle)
            .ok_or(PhysicsError::InvalidFixture)?
            .material
            .is_sensor = is_sensor;
        self.refilter(handle)
    }

    /// Change body type. Static bodies lose their velocity; mass data is recomputed.
    pub fn set_body_type(&mut self, handle: BodyHandle, body_type: BodyType) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle).ok_or(PhysicsError::InvalidBody)?;
        if body.body_type == body_type {
            return Ok(());
        }
        body.body_type = body_type;
        if body_type == BodyType::Static {
            body.linear_velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
        }
        body.force = Vec2::ZERO;
        body.torque = 0.0;
        body.set_awake(true);
        self.reset_mass_data(handle)
    }

    pub fn set_fixed_rotation(&mut self, handle: BodyHandle, fixed: bool) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle).ok_or(PhysicsError::InvalidBody)?;
        if body.fixed_rotation == fixed {
            return Ok(());
        }
        body.fixed_rotation = fixed;
        body.angular_velocity = 0.0;
        self.reset_mass_data(handle)
    }

    /// Advance the simulation by one fixed step of `dt` seconds.
    ///
    /// Returns end events queued by destruction first, then this step's
    /// transitions in no particular order.
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        let config = &self.config;

        // 1. Integrate velocities
        rigid_body::integrate_velocities(&mut self.world, config.gravity, dt);

        // 2. Integrate positions
        rigid_body::integrate_positions(&mut self.world, dt);

        // 3. Clear force accumulators
        rigid_body::clear_forces(&mut self.world);

        // 4. Sleep
        rigid_body::update_sleep_states(
            &mut self.world,
            dt,
            config.linear_sleep_tolerance,
            config.angular_sleep_tolerance,
            config.time_to_sleep,
        );

        // 5. Broadphase
        let candidates = self.broadphase.find_pairs(&self.world);

        // 6. Narrowphase; pairs of sleeping bodies keep their state.
        let entries = self.broadphase.entries();
        let mut touching = HashSet::new();
        for candidate in candidates {
            let a = &entries[candidate.a];
            let b = &entries[candidate.b];
            let pair = FixturePair::new(a.fixture, b.fixture);
            if !a.awake && !b.awake {
                if self.contacts.is_touching(&pair) {
                    touching.insert(pair);
                }
                continue;
            }
            let (Ok(fa), Ok(fb)) = (
                self.world.get::<&Fixture>(a.fixture),
                self.world.get::<&Fixture>(b.fixture),
            ) else {
                continue;
            };
            if shapes_overlap(&fa.shape, &a.transform, &fb.shape, &b.transform) {
                touching.insert(pair);
            }
        }

        // 7. Contact transitions
        let (began, ended) = self.contacts.update(touching);
        let mut events = self.take_destroyed_contacts();
        events.reserve(began.len() + ended.len());
        for (phase, pairs) in [(ContactPhase::Begin, began), (ContactPhase::End, ended)] {
            for pair in pairs {
                events.push(self.contact_event(phase, pair));
            }
        }
        events
    }
}
