//! Scene container: owns objects and the shared physics, spatial index and
//! event scheduler, and drives the fixed-step tick.
//!
//! # Tick order
//!
//! One [`Scene::process_tick`] runs, for every enabled object:
//!
//! 1. Deferred removals from the previous tick
//! 2. `pre_integrate` (interpolation baseline)
//! 3. One physics step
//! 4. Contact forwarding to both objects of each pair
//! 5. `integrate` (spatial index update, lifetime countdown)
//! 6. `post_integrate` (update / sleep events)
//! 7. Collision events, ended before began
//! 8. Motion commands that came due
//!
//! Events are queued and read back with [`Scene::drain_events`].

pub mod scheduler;
pub mod world_query;

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::Vec2;
use slotmap::SlotMap;

use crate::error::SceneError;
use crate::math::Aabb2d;
use crate::object::motion::MotionEvent;
use crate::object::{object_from_user_data, SceneLink, SceneObject};
use crate::physics::contact::{ContactEvent, ContactPhase};
use crate::physics::{FixtureHandle, PhysicsConfig, PhysicsWorld, SharedPhysics};

use self::scheduler::EventScheduler;
use self::world_query::{SharedWorldQuery, WorldQuery, WorldQueryConfig};

slotmap::new_key_type! {
    /// Generational id of an object in a [`Scene`].
    pub struct ObjectId;
}

/// Motion-command scheduler shared by every object in a scene.
pub type SharedScheduler = Rc<RefCell<EventScheduler<MotionEvent>>>;

/// Scene configuration.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Gravity applied to dynamic bodies. Default: (0, 0).
    pub gravity: Vec2,
    /// Fixed physics timestep in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum ticks run by one [`Scene::update`]. Default: 4.
    pub max_substeps: u32,
    /// Sleep tuning. Its gravity is replaced by [`SceneConfig::gravity`].
    pub physics: PhysicsConfig,
    pub world_query: WorldQueryConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            physics: PhysicsConfig::default(),
            world_query: WorldQueryConfig::default(),
        }
    }
}

/// A contact seen from `object`'s side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContact {
    pub object: ObjectId,
    /// Shape index on `object`.
    pub shape: usize,
    pub other: ObjectId,
    /// Shape index on `other`.
    pub other_shape: usize,
}

impl TickContact {
    /// The same contact seen from the other object.
    pub fn swapped(self) -> Self {
        Self {
            object: self.other,
            shape: self.other_shape,
            other: self.object,
            other_shape: self.shape,
        }
    }
}

/// Notification queued during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    Updated(ObjectId),
    Woke(ObjectId),
    Slept(ObjectId),
    CollisionBegan(TickContact),
    CollisionEnded(TickContact),
    MoveToComplete(ObjectId),
    RotateToComplete(ObjectId),
    /// The object's lifetime ran out; it is removed at the start of the next tick.
    LifetimeExpired(ObjectId),
    /// A tick finished at the given scene time.
    SceneUpdated { time: f64 },
}

/// A 2D scene of physical objects.
pub struct Scene {
    config: SceneConfig,
    objects: SlotMap<ObjectId, SceneObject>,
    physics: SharedPhysics,
    world_query: SharedWorldQuery,
    scheduler: SharedScheduler,
    scene_time: f64,
    accumulator: f64,
    paused: bool,
    delete_requests: Vec<ObjectId>,
    events: Vec<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let physics = PhysicsWorld::new(PhysicsConfig {
            gravity: config.gravity,
            ..config.physics.clone()
        });
        Self {
            physics: Rc::new(RefCell::new(physics)),
            world_query: Rc::new(RefCell::new(WorldQuery::new(config.world_query.clone()))),
            scheduler: Rc::new(RefCell::new(EventScheduler::new())),
            config,
            objects: SlotMap::with_key(),
            scene_time: 0.0,
            accumulator: 0.0,
            paused: false,
            delete_requests: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Simulated time in seconds.
    pub fn scene_time(&self) -> f64 {
        self.scene_time
    }

    pub fn gravity(&self) -> Vec2 {
        self.physics.borrow().gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
        self.physics.borrow_mut().set_gravity(gravity);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Paused scenes skip ticks and interpolation; removals still happen.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn physics(&self) -> Ref<'_, PhysicsWorld> {
        self.physics.borrow()
    }

    pub fn world_query(&self) -> Ref<'_, WorldQuery> {
        self.world_query.borrow()
    }

    // --- objects -------------------------------------------------------------

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter()
    }

    fn link(&self, id: ObjectId) -> SceneLink {
        SceneLink {
            id,
            physics: self.physics.clone(),
            world_query: self.world_query.clone(),
            scheduler: self.scheduler.clone(),
        }
    }

    /// Take ownership of a detached object and make it live.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = self.objects.insert(object);
        let link = self.link(id);
        if let Some(object) = self.objects.get_mut(id) {
            if let Err(err) = object.attach(link) {
                tracing::error!("attaching object {:?} failed: {}", id, err);
            }
        }
        id
    }

    /// Detach and hand back an object.
    pub fn try_remove_object(&mut self, id: ObjectId) -> Result<SceneObject, SceneError> {
        let mut object = self.objects.remove(id).ok_or(SceneError::ObjectNotFound)?;
        self.delete_requests.retain(|pending| *pending != id);
        object.detach()?;
        // Partners still in the scene see their contacts with `id` end now.
        let destroyed = self.physics.borrow_mut().take_destroyed_contacts();
        let (_, ended) = self.forward_contacts(destroyed);
        self.events.extend(ended);
        Ok(object)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.try_remove_object(id)
            .map_err(|err| tracing::warn!("remove_object {:?}: {}", id, err))
            .ok()
    }

    /// Remove `id` at the start of the next tick.
    pub fn request_delete(&mut self, id: ObjectId) {
        if self.objects.contains_key(id) && !self.delete_requests.contains(&id) {
            self.delete_requests.push(id);
        }
    }

    /// Copy collision shapes between two objects of this scene.
    pub fn try_copy_collision_shapes(
        &mut self,
        source: ObjectId,
        target: ObjectId,
        clear_target_first: bool,
        index: Option<usize>,
    ) -> Result<Option<usize>, SceneError> {
        if source == target {
            return Err(SceneError::SameObject);
        }
        let [source, target] = self
            .objects
            .get_disjoint_mut([source, target])
            .ok_or(SceneError::ObjectNotFound)?;
        Ok(source.copy_collision_shapes(target, clear_target_first, index))
    }

    pub fn copy_collision_shapes(
        &mut self,
        source: ObjectId,
        target: ObjectId,
        clear_target_first: bool,
        index: Option<usize>,
    ) -> Option<usize> {
        self.try_copy_collision_shapes(source, target, clear_target_first, index)
            .map_err(|err| tracing::warn!("copy_collision_shapes: {}", err))
            .ok()
            .flatten()
    }

    // --- queries -------------------------------------------------------------

    /// Objects whose AABB overlaps `area`.
    pub fn pick_area(&self, area: &Aabb2d) -> Vec<ObjectId> {
        self.world_query.borrow().query_area(area)
    }

    /// Objects whose oriented box contains `point`.
    pub fn pick_point(&self, point: Vec2) -> Vec<ObjectId> {
        self.world_query
            .borrow()
            .query_point(point)
            .into_iter()
            .filter(|id| {
                self.objects
                    .get(*id)
                    .is_some_and(|object| object.is_point_in_oobb(point))
            })
            .collect()
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // --- ticking -------------------------------------------------------------

    /// Advance by real elapsed time: run fixed ticks, then interpolate.
    ///
    /// Returns the number of ticks run.
    pub fn update(&mut self, delta_time: f64) -> u32 {
        let dt = self.config.fixed_timestep;
        self.accumulator += delta_time;
        let mut substeps = 0u32;
        while self.accumulator >= dt && substeps < self.config.max_substeps {
            self.process_tick();
            self.accumulator -= dt;
            substeps += 1;
        }
        let factor = 1.0 - (self.accumulator / dt).min(1.0);
        self.interpolate_tick(factor as f32);
        substeps
    }

    /// Run one fixed step.
    pub fn process_tick(&mut self) {
        for id in std::mem::take(&mut self.delete_requests) {
            if self.remove_object(id).is_some() {
                tracing::debug!("removed object {:?}", id);
            }
        }
        if self.paused {
            return;
        }

        let dt = self.config.fixed_timestep;
        self.scene_time += dt;

        let ticking: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_enabled())
            .map(|(id, _)| id)
            .collect();

        for id in &ticking {
            if let Some(object) = self.objects.get_mut(*id) {
                object.pre_integrate();
            }
        }

        let contacts = self.physics.borrow_mut().step(dt as f32);
        let (began, ended) = self.forward_contacts(contacts);

        for id in &ticking {
            let Some(object) = self.objects.get_mut(*id) else {
                continue;
            };
            if object.integrate(dt as f32) {
                self.events.push(SceneEvent::LifetimeExpired(*id));
                self.request_delete(*id);
            }
        }

        for id in &ticking {
            if let Some(object) = self.objects.get_mut(*id) {
                object.post_integrate(&mut self.events);
            }
        }

        self.events.push(SceneEvent::SceneUpdated {
            time: self.scene_time,
        });
        self.events.extend(ended);
        self.events.extend(began);

        let fired = self.scheduler.borrow_mut().advance_to(self.scene_time);
        for (event, MotionEvent { object, kind }) in fired {
            if let Some(object) = self.objects.get_mut(object) {
                object.complete_motion(event, kind, &mut self.events);
            }
        }
    }

    /// Map physics contacts onto objects. Returns (began, ended) collision events.
    fn forward_contacts(&mut self, contacts: Vec<ContactEvent>) -> (Vec<SceneEvent>, Vec<SceneEvent>) {
        let mut began = Vec::new();
        let mut ended = Vec::new();
        for contact in contacts {
            let a = object_from_user_data(contact.user_data_a);
            let b = object_from_user_data(contact.user_data_b);
            // A destroyed fixture keeps the index it had when it went away.
            let shape_of = |id: ObjectId, fixture: FixtureHandle, fallback: usize| {
                self.objects
                    .get(id)
                    .and_then(|object| object.shapes().index_of_fixture(fixture))
                    .unwrap_or(fallback)
            };
            let seen_by_a = TickContact {
                object: a,
                shape: shape_of(a, contact.fixture_a, contact.index_a),
                other: b,
                other_shape: shape_of(b, contact.fixture_b, contact.index_b),
            };
            let sides = [
                (seen_by_a, contact.fixture_a, contact.fixture_b),
                (seen_by_a.swapped(), contact.fixture_b, contact.fixture_a),
            ];
            for (seen, fixture, other_fixture) in sides {
                let Some(object) = self.objects.get_mut(seen.object) else {
                    continue;
                };
                if let Some(event) = object.record_contact(seen, fixture, other_fixture, contact.phase) {
                    match contact.phase {
                        ContactPhase::Begin => began.push(event),
                        ContactPhase::End => ended.push(event),
                    }
                }
            }
        }
        (began, ended)
    }

    /// Blend render transforms. `factor` is the fraction of the step still to cover.
    pub fn interpolate_tick(&mut self, factor: f32) {
        if self.paused {
            return;
        }
        for (_, object) in self.objects.iter_mut() {
            if object.is_enabled() {
                object.interpolate(factor);
            }
        }
    }
}
